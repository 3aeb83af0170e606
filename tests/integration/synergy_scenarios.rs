use crate::support::{aqua_reach, disjoint_companies, grid_wise, solar_chain};
use anyhow::Result;
use synergizer::models::{OpportunityKind, Priority};
use synergizer::reports::OpportunityReport;
use synergizer::{EngineConfig, SynergyEngine};

#[test]
fn complementary_need_and_offer_form_one_pair() -> Result<()> {
    let mut engine = SynergyEngine::new();
    engine.register_companies(vec![aqua_reach(), grid_wise()])?;
    let run = engine.analyze()?;

    assert_eq!(run.pairs.len(), 1);
    assert_eq!(run.opportunities.len(), 1);
    let pair = &run.opportunities[0];
    assert_eq!(pair.kind, OpportunityKind::Pair);
    assert_eq!(pair.participants, vec!["aqua-reach", "grid-wise"]);
    assert!(pair.score > 0.0 && pair.score < 1.0);

    // HIGH urgency (1.3) x MED capacity (1.0) over HIGH x HIGH (1.3 x 1.2).
    assert!((pair.impact - 1.0 / 1.2).abs() < 1e-9);
    assert!(!pair.breakdown.alignment.is_empty());
    assert!(!pair.breakdown.rationale.is_empty());
    assert!(!pair.breakdown.risks.is_empty());
    assert_eq!(pair.priority, engine.priority_scoring(pair));
    Ok(())
}

#[test]
fn chain_of_pairs_composes_exactly_one_triad() -> Result<()> {
    let mut engine = SynergyEngine::new();
    engine.register_companies(solar_chain())?;
    let run = engine.analyze()?;

    let triads: Vec<_> = run
        .opportunities
        .iter()
        .filter(|opportunity| opportunity.kind == OpportunityKind::Triad)
        .collect();
    assert_eq!(run.pairs.len(), 2);
    assert_eq!(triads.len(), 1);
    let triad = triads[0];
    assert_eq!(
        triad.participants,
        vec!["alpha-solar", "beta-storage", "cyan-recycle"]
    );
    assert_eq!(triad.hub.as_deref(), Some("beta-storage"));
    assert_eq!(triad.matches.len(), 2);
    assert!(triad
        .breakdown
        .risks
        .iter()
        .any(|risk| risk.contains("coordination")));

    let pair_mean: f64 = run
        .opportunities
        .iter()
        .filter(|opportunity| opportunity.kind == OpportunityKind::Pair)
        .map(|opportunity| opportunity.score)
        .sum::<f64>()
        / 2.0;
    let penalty = EngineConfig::default().triads.coordination_penalty;
    assert!((triad.score - (pair_mean - penalty).max(0.0)).abs() < 1e-9);
    Ok(())
}

#[test]
fn disabling_triads_leaves_only_pairs() -> Result<()> {
    let mut config = EngineConfig::default();
    config.triads.enabled = false;
    let mut engine = SynergyEngine::with_config(config)?;
    engine.register_companies(solar_chain())?;
    let run = engine.analyze()?;
    assert_eq!(run.opportunities.len(), 2);
    assert!(run
        .opportunities
        .iter()
        .all(|opportunity| opportunity.kind == OpportunityKind::Pair));
    Ok(())
}

#[test]
fn fifty_disjoint_companies_produce_nothing() -> Result<()> {
    let mut engine = SynergyEngine::new();
    engine.register_companies(disjoint_companies(50))?;
    let run = engine.analyze()?;
    assert_eq!(engine.graph().len(), 50);
    assert!(run.pairs.is_empty());
    assert!(run.opportunities.is_empty());
    assert_eq!(engine.graph().edge_count(), 0);
    Ok(())
}

#[test]
fn removing_a_company_cascades_to_its_edges() -> Result<()> {
    let mut engine = SynergyEngine::new();
    engine.register_companies(solar_chain())?;
    engine.analyze()?;
    assert_eq!(engine.graph().edge_count(), 2);

    let removed = engine.remove_company("beta-storage")?;
    assert_eq!(removed.name, "Beta Storage");
    assert!(engine
        .graph()
        .edges()
        .all(|edge| edge.source != "beta-storage" && edge.target != "beta-storage"));
    engine.graph().check_consistency()?;

    let run = engine.analyze()?;
    assert!(run.opportunities.is_empty());
    assert!(engine.profile("beta-storage").unwrap_err().is_not_found());
    Ok(())
}

#[test]
fn reingest_under_same_slug_replaces_profile() -> Result<()> {
    let mut engine = SynergyEngine::new();
    engine.register_companies(vec![aqua_reach(), grid_wise()])?;
    engine.register_company(synergizer::CompanyProfile::new("Grid Wise"))?;
    assert_eq!(engine.graph().len(), 2);
    assert!(engine.analyze()?.opportunities.is_empty());
    Ok(())
}

#[test]
fn ranking_and_report_follow_priority() -> Result<()> {
    let mut engine = SynergyEngine::new();
    let mut companies = solar_chain();
    companies.push(aqua_reach());
    companies.push(grid_wise());
    engine.register_companies(companies)?;
    let run = engine.analyze()?;

    for window in run.opportunities.windows(2) {
        let (first, second) = (&window[0], &window[1]);
        assert!(first.priority >= second.priority);
        if first.priority == second.priority {
            assert!(first.score >= second.score);
        }
    }
    assert!(run
        .opportunities
        .iter()
        .all(|opportunity| matches!(
            opportunity.priority,
            Priority::High | Priority::Medium | Priority::Low
        )));

    let summary = OpportunityReport::new(&run.opportunities).executive_summary(2);
    assert_eq!(summary.lines().count(), 3);
    assert_eq!(run.opportunities_for("grid-wise").count(), 1);
    Ok(())
}
