use super::IntegrationHarness;
use crate::support::{aqua_reach, disjoint_companies, grid_wise, BUNDLE_YAML};
use anyhow::Result;
use std::fs;
use synergizer::error::ErrorCategory;
use synergizer::models::CompanyProfile;
use synergizer::templates::{group_companies, ProfileTemplateLibrary, UNCLASSIFIED};
use synergizer::SynergyEngine;

fn bundle_on_disk(harness: &IntegrationHarness) -> Result<ProfileTemplateLibrary> {
    let path = harness.workspace_path().join("bundle.yaml");
    fs::write(&path, BUNDLE_YAML)?;
    Ok(ProfileTemplateLibrary::load_from_file(&path)?)
}

#[test]
fn unknown_tier_is_not_found() -> Result<()> {
    let harness = IntegrationHarness::new();
    let library = bundle_on_disk(&harness)?;
    assert_eq!(library.tiering_rules().len(), 2);

    let err = library.tier("nonexistent").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
    assert!(err.to_string().contains("nonexistent"));
    assert_eq!(library.tier("energy")?.label, "Energy");
    assert!(library.template("Missing").unwrap_err().is_not_found());
    Ok(())
}

#[test]
fn json_bundle_is_read_by_extension() -> Result<()> {
    let harness = IntegrationHarness::new();
    let path = harness.workspace_path().join("bundle.json");
    fs::write(
        &path,
        r#"{ "templates": [{ "name": "General", "tags": ["partner"] }], "tiers": {} }"#,
    )?;
    let library = ProfileTemplateLibrary::load_from_file(&path)?;
    assert_eq!(library.templates().len(), 1);
    assert!(!library.has_tiering_rules());
    Ok(())
}

#[test]
fn unmatched_companies_land_in_unclassified_once() -> Result<()> {
    let harness = IntegrationHarness::new();
    let library = bundle_on_disk(&harness)?;
    let companies = disjoint_companies(12);
    let groups = library.group_companies(&companies);

    assert_eq!(groups[UNCLASSIFIED].len(), 12);
    assert!(groups["Energy"].is_empty());
    assert!(groups["Water"].is_empty());
    let total: usize = groups.values().map(Vec::len).sum();
    assert_eq!(total, companies.len());

    let empty = group_companies(std::iter::empty::<&CompanyProfile>(), library.tiering_rules());
    assert!(empty.values().all(Vec::is_empty));
    Ok(())
}

#[test]
fn templates_complete_profiles_and_tiers_group_the_run() -> Result<()> {
    let harness = IntegrationHarness::new();
    let library = bundle_on_disk(&harness)?;

    let mut startup = CompanyProfile::new("Tide Labs");
    startup.organization_type = Some("STARTUP".to_string());
    let completed = library.auto_complete_profile(&startup);
    assert_eq!(completed.region.as_deref(), Some("Nordics"));
    assert!(completed.tags.contains("early-stage"));
    let startup_template = library.template_for(&startup).expect("startup template");
    assert_eq!(startup_template.missing_fields(&completed), vec!["mission"]);

    let general = library.complete_with_template(&CompanyProfile::new("Plain"), "General")?;
    assert_eq!(general.mission.as_deref(), Some("Build durable partnerships"));

    let mut engine = SynergyEngine::new();
    engine.register_companies(vec![aqua_reach(), grid_wise(), CompanyProfile::new("Idle Co")])?;
    let run = engine.analyze_with_tiers(&library)?;
    let groups = run.groups.expect("tier groups");
    assert_eq!(groups["Energy"], vec!["aqua-reach", "grid-wise"]);
    assert_eq!(groups[UNCLASSIFIED], vec!["idle-co"]);
    Ok(())
}
