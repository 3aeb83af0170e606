use crate::support::profile_values;
use anyhow::Result;
use serde_json::json;
use synergizer::api::{analyze, analyze_json, AnalyzeRequest};
use synergizer::error::ErrorCategory;
use synergizer::EngineConfig;

#[test]
fn json_request_round_trips_to_a_ranked_response() -> Result<()> {
    let body = json!({
        "profiles": profile_values(),
        "template_bundle": {
            "templates": { "Startup": { "required_fields": ["mission"] } },
            "tiers": [{ "name": "energy", "criteria": ["energy"] }]
        }
    })
    .to_string();
    let response = analyze_json(&body, &EngineConfig::default())?;

    assert_eq!(response.opportunities.len(), 1);
    assert_eq!(response.matches.len(), 1);
    assert_eq!(response.warnings.len(), 1);
    assert!(response.warnings[0].contains("aqua-reach"));
    let groups = response.groups.as_ref().expect("groups");
    assert_eq!(groups["energy"], vec!["aqua-reach", "grid-wise"]);

    let wire = serde_json::to_value(&response)?;
    let priority = wire["opportunities"][0]["priority"].as_str().unwrap_or_default();
    assert!(["HIGH", "MEDIUM", "LOW"].contains(&priority));
    assert_eq!(wire["opportunities"][0]["kind"], "pair");
    assert!(wire["run_id"].is_string());
    Ok(())
}

#[test]
fn duplicate_slugs_warn_and_last_wins() -> Result<()> {
    let mut profiles = profile_values();
    profiles.push(json!({ "slug": "grid-wise", "name": "Grid Wise" }));
    let response = analyze(
        &AnalyzeRequest::from_profiles(profiles),
        &EngineConfig::default(),
    )?;
    assert!(response.opportunities.is_empty());
    assert_eq!(response.warnings.len(), 1);
    assert!(response.warnings[0].contains("duplicate slug `grid-wise`"));
    Ok(())
}

#[test]
fn bad_input_maps_to_validation_category() {
    let config = EngineConfig::default();
    let malformed = analyze_json("{ not json", &config).unwrap_err();
    assert_eq!(malformed.category(), ErrorCategory::Validation);

    let bad_level = AnalyzeRequest::from_profiles(vec![json!({
        "name": "Odd",
        "needs": [{ "title": "help", "urgency": "EXTREME" }]
    })]);
    let err = analyze(&bad_level, &config).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("index 0"));

    let bad_channel = AnalyzeRequest::from_profiles(vec![json!({
        "name": "Odd",
        "offers": [{ "title": "help", "engagement_channels": ["telepathy"] }]
    })]);
    assert!(analyze(&bad_channel, &config).unwrap_err().is_validation());
}

#[test]
fn invalid_config_is_rejected_before_analysis() {
    let mut config = EngineConfig::default();
    config.priority.medium_threshold = 0.9;
    config.priority.high_threshold = 0.5;
    let err = analyze(&AnalyzeRequest::from_profiles(profile_values()), &config).unwrap_err();
    assert!(err.is_validation());
}
