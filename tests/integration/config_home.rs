use super::IntegrationHarness;
use anyhow::Result;
use std::fs;
use synergizer::config::{self, EngineConfig, CONFIG_FILE_NAME};

#[test]
fn config_lives_under_synergizer_home() -> Result<()> {
    let harness = IntegrationHarness::new();
    let path = harness.workspace_path().join(CONFIG_FILE_NAME);

    let mut custom = EngineConfig::default();
    custom.scoring.mission_weight = 0.25;
    custom.reporting.summary_limit = 3;
    custom.save_to_path(&path)?;
    let loaded = EngineConfig::load_from_path(&path)?;
    assert_eq!(loaded, custom);

    fs::write(&path, "[priority]\nhigh_threshold = 0.2\nmedium_threshold = 0.4\n")?;
    let err = EngineConfig::load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("thresholds"));

    fs::write(&path, "[triads]\nenabled = false\n")?;
    let partial = EngineConfig::load_from_path(&path)?;
    assert!(!partial.triads.enabled);
    assert_eq!(partial.scoring, EngineConfig::default().scoring);

    let resolved = config::config_file_path()?;
    assert!(resolved.ends_with(CONFIG_FILE_NAME));
    Ok(())
}
