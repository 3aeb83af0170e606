use anyhow::Result;
use serde_json::{json, Value};
use std::fs;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn cli_reads_a_profile_directory_and_writes_a_report() -> Result<()> {
    let workspace = TempDir::new()?;
    let profiles = workspace.path().join("profiles");
    fs::create_dir_all(profiles.join("nested"))?;
    fs::write(
        profiles.join("aqua.json"),
        json!({
            "name": "Aqua Reach",
            "needs": [{ "title": "power storage", "urgency": "HIGH", "tags": ["energy"] }]
        })
        .to_string(),
    )?;
    fs::write(
        profiles.join("nested").join("grid.json"),
        json!({
            "profiles": [{
                "name": "Grid Wise",
                "offers": [{ "title": "microgrid analytics", "tags": ["energy"] }]
            }]
        })
        .to_string(),
    )?;
    fs::write(profiles.join("notes.txt"), "ignored")?;
    let report = workspace.path().join("report.md");

    let output = Command::new(env!("CARGO_BIN_EXE_synergize"))
        .arg(&profiles)
        .arg("--report")
        .arg(&report)
        .env("SYNERGIZER_HOME", workspace.path())
        .env("RUST_LOG", "warn")
        .output()?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let run: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(run["opportunities"].as_array().map(Vec::len), Some(1));
    let written = fs::read_to_string(&report)?;
    assert!(written.contains("Aqua Reach & Grid Wise strategic lane"));
    Ok(())
}

#[test]
fn cli_rejects_missing_profiles_path() -> Result<()> {
    let workspace = TempDir::new()?;
    let output = Command::new(env!("CARGO_BIN_EXE_synergize"))
        .arg(workspace.path().join("absent"))
        .env("SYNERGIZER_HOME", workspace.path())
        .output()?;
    assert!(!output.status.success());
    Ok(())
}

#[test]
fn cli_reads_profiles_under_companies_key() -> Result<()> {
    let workspace = TempDir::new()?;
    let file = workspace.path().join("profiles.json");
    fs::write(
        &file,
        json!({
            "companies": [
                {
                    "name": "Aqua Reach",
                    "needs": [{ "title": "power storage", "urgency": "HIGH", "tags": ["energy"] }]
                },
                {
                    "name": "Grid Wise",
                    "offers": [{ "title": "microgrid analytics", "tags": ["energy"] }]
                }
            ]
        })
        .to_string(),
    )?;

    let output = Command::new(env!("CARGO_BIN_EXE_synergize"))
        .arg(&file)
        .env("SYNERGIZER_HOME", workspace.path())
        .env("RUST_LOG", "warn")
        .output()?;
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let run: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(run["opportunities"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[test]
fn cli_fails_on_an_invalid_profile_entry() -> Result<()> {
    let workspace = TempDir::new()?;
    let file = workspace.path().join("profiles.json");
    fs::write(
        &file,
        json!({
            "profiles": [
                { "name": "Aqua Reach" },
                { "mission": "no identity" }
            ]
        })
        .to_string(),
    )?;

    let output = Command::new(env!("CARGO_BIN_EXE_synergize"))
        .arg(&file)
        .env("SYNERGIZER_HOME", workspace.path())
        .env("RUST_LOG", "warn")
        .output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("index 1"), "stderr: {stderr}");
    assert!(output.stdout.is_empty());
    Ok(())
}
