use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

use synergizer::config::{self, EngineConfig};
use synergizer::reports::OpportunityReport;
use synergizer::templates::ProfileTemplateLibrary;
use synergizer::{CompanyProfile, SynergyEngine};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,synergizer=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse()?;
    let config = match &args.config {
        Some(path) => EngineConfig::load_from_path(path)?,
        None => config::load_or_default()?,
    };
    let library = args
        .templates
        .as_deref()
        .map(ProfileTemplateLibrary::load_from_file)
        .transpose()?;

    let mut profiles = Vec::new();
    for path in profile_files(&args.profiles)? {
        profiles.extend(read_profiles(&path)?);
    }
    if profiles.is_empty() {
        bail!("No profiles found under {}", args.profiles.display());
    }
    if let Some(library) = &library {
        profiles = profiles
            .iter()
            .map(|profile| library.auto_complete_profile(profile))
            .collect();
    }

    let mut engine = SynergyEngine::with_config(config.clone())?;
    engine.register_companies(profiles)?;
    let run = match &library {
        Some(library) if library.has_tiering_rules() => engine.analyze_with_tiers(library)?,
        _ => engine.analyze()?,
    };
    info!(
        companies = engine.graph().len(),
        opportunities = run.opportunities.len(),
        "analysis complete"
    );

    if let Some(report_path) = &args.report {
        let written = OpportunityReport::new(&run.opportunities)
            .write_markdown(report_path, config.reporting.summary_limit)?;
        info!(path = %written.display(), "report written");
    }
    println!("{}", serde_json::to_string_pretty(&run)?);
    Ok(())
}

struct CliArgs {
    profiles: PathBuf,
    templates: Option<PathBuf>,
    report: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut profiles = None;
        let mut templates = None;
        let mut report = None;
        let mut config = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--templates" => {
                    let value = args
                        .next()
                        .context("Expected a bundle path after --templates")?;
                    templates = Some(PathBuf::from(value));
                }
                "--report" => {
                    let value = args.next().context("Expected a file path after --report")?;
                    report = Some(PathBuf::from(value));
                }
                "--config" => {
                    let value = args.next().context("Expected a file path after --config")?;
                    config = Some(PathBuf::from(value));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {}", other));
                }
                other => {
                    if profiles.replace(PathBuf::from(other)).is_some() {
                        bail!("Only one profiles path may be given");
                    }
                }
            }
        }
        let profiles = profiles.context("Expected a profiles file or directory")?;
        Ok(Self {
            profiles,
            templates,
            report,
            config,
        })
    }
}

fn print_usage() {
    println!(
        "Usage: synergize <profiles.json|dir> [--templates bundle.yaml] [--report out.md] [--config config.toml]"
    );
}

/// Every `.json` file under `root`, sorted, or `root` itself when it is a file.
fn profile_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        bail!("Profiles path {} does not exist", root.display());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let is_json = entry
            .path()
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// A file holds one profile object, an array of them, or an object wrapping
/// the array under `profiles` or `companies`.
fn read_profiles(path: &Path) -> Result<Vec<CompanyProfile>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profiles {:?}", path))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse profiles {:?}", path))?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match take_profile_list(&mut map) {
            Some(items) => items,
            None => vec![Value::Object(map)],
        },
        other => vec![other],
    };
    let mut profiles = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let profile = CompanyProfile::from_value(item)
            .with_context(|| format!("Invalid profile at index {} in {:?}", index, path))?;
        profiles.push(profile);
    }
    debug!(path = %path.display(), count = profiles.len(), "read profiles");
    Ok(profiles)
}

fn take_profile_list(map: &mut Map<String, Value>) -> Option<Vec<Value>> {
    for key in ["profiles", "companies"] {
        if matches!(map.get(key), Some(Value::Array(_))) {
            if let Some(Value::Array(items)) = map.remove(key) {
                return Some(items);
            }
        }
    }
    None
}
