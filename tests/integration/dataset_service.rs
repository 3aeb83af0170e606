use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use synergizer::api::dataset::{
    DatasetPayload, GraphService, OpportunityFilter, OpportunityStatus,
};
use synergizer::api::playbook::PlaybookRequest;
use synergizer::EngineConfig;

fn solar_dataset() -> Result<DatasetPayload> {
    Ok(serde_json::from_value(json!({
        "companies": [
            { "id": "c-a", "orgId": "org-a", "name": "Alpha Solar", "keys": ["energy"] },
            { "id": "c-b", "orgId": "org-b", "name": "Beta Storage", "keys": ["circularity"] },
            { "id": "c-c", "orgId": "org-a", "name": "Cyan Recycle" }
        ],
        "needs": [
            { "id": "n-a", "companyId": "c-a", "title": "Solar panels", "tags": ["solar"] },
            { "id": "n-b", "companyId": "c-b", "title": "Battery recycling",
              "urgency": "HIGH", "tags": ["recycling"] }
        ],
        "offers": [
            { "id": "o-b", "companyId": "c-b", "title": "Solar panels",
              "capacity": "HIGH", "tags": ["solar"] },
            { "id": "o-c", "companyId": "c-c", "title": "Battery recycling", "tags": ["recycling"] }
        ],
        "contacts": []
    }))?)
}

#[test]
fn recompute_serves_pairs_and_triads_with_dataset_ids() -> Result<()> {
    let service = GraphService::new(EngineConfig::default())?;
    let summary = service.recompute(&solar_dataset()?)?;
    assert_eq!(summary.companies, 3);
    assert_eq!(summary.opportunities, 3);

    let org_a = service.opportunities(&OpportunityFilter {
        org_id: Some("org-a".into()),
        ..OpportunityFilter::default()
    });
    assert_eq!(org_a.len(), 3);

    let triad = org_a
        .iter()
        .find(|record| record.opportunity.participants.len() == 3)
        .expect("triad record");
    assert_eq!(triad.company_ids, vec!["c-a", "c-b", "c-c"]);
    assert_eq!(triad.org_ids, vec!["org-a", "org-b"]);
    assert_eq!(triad.keys, vec!["circularity", "energy"]);

    let wire = serde_json::to_value(triad)?;
    assert_eq!(wire["status"], "OPEN");
    assert_eq!(wire["companyIds"][0], "c-a");
    assert!(wire["id"].is_string());
    Ok(())
}

#[test]
fn playbook_for_cached_triad_lists_all_actors() -> Result<()> {
    let service = GraphService::new(EngineConfig::default())?;
    service.recompute(&solar_dataset()?)?;
    let triad_id = service
        .opportunities(&OpportunityFilter::default())
        .into_iter()
        .find(|record| record.opportunity.participants.len() == 3)
        .map(|record| record.opportunity.id)
        .expect("triad id");

    let request: PlaybookRequest = serde_json::from_value(json!({
        "opportunity": { "id": triad_id },
        "adjustments": { "summary": "Circular solar supply" }
    }))?;
    let playbook = service.playbook(&request)?;
    assert_eq!(playbook.summary, "Circular solar supply");
    assert_eq!(playbook.sections.actors.len(), 3);
    assert_eq!(playbook.sections.steps[0].title, "Alignment Workshop");
    assert_eq!(playbook.sections.steps.len(), 3);
    assert_eq!(playbook.sections.collateral.len(), 2);
    assert!(playbook
        .sections
        .risks
        .iter()
        .any(|risk| risk.contains("coordination")));
    Ok(())
}

#[test]
fn readers_see_consistent_state_during_recompute() -> Result<()> {
    let service = Arc::new(GraphService::new(EngineConfig::default())?);
    let dataset = solar_dataset()?;
    service.recompute(&dataset)?;

    let writer = {
        let service = Arc::clone(&service);
        let dataset = dataset.clone();
        thread::spawn(move || {
            for _ in 0..10 {
                service.recompute(&dataset).expect("recompute");
            }
        })
    };
    for _ in 0..50 {
        let records = service.opportunities(&OpportunityFilter::default());
        assert_eq!(records.len(), 3);
    }
    writer.join().expect("writer thread");

    let id = service.opportunities(&OpportunityFilter::default())[0]
        .opportunity
        .id
        .clone();
    service.set_status(&id, OpportunityStatus::Closed)?;
    assert_eq!(service.opportunity(&id)?.status, OpportunityStatus::Closed);
    Ok(())
}
