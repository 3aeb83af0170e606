//! Request/response boundary for embedding services.
//!
//! Transport is left to the embedder: these types are plain serde structs and
//! every failure is a [`SynergyError`] whose [`category`](SynergyError::category)
//! maps onto a status code.

pub mod dataset;
pub mod playbook;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{Result, SynergyError};
use crate::matching::SynergyEngine;
use crate::models::{duplicate_slugs, CompanyProfile, Opportunity, SynergyMatch};
use crate::templates::ProfileTemplateLibrary;

/// Analysis request. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub profiles: Option<Vec<Value>>,
    /// Alternate key for `profiles` used by dataset exports.
    #[serde(default)]
    pub companies: Option<Vec<Value>>,
    #[serde(default)]
    pub template_bundle: Option<Value>,
}

impl AnalyzeRequest {
    pub fn from_profiles(profiles: Vec<Value>) -> Self {
        Self {
            profiles: Some(profiles),
            ..Self::default()
        }
    }

    pub fn with_bundle(mut self, bundle: Value) -> Self {
        self.template_bundle = Some(bundle);
        self
    }

    fn raw_profiles(&self) -> &[Value] {
        self.profiles
            .as_deref()
            .filter(|profiles| !profiles.is_empty())
            .or(self.companies.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeResponse {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub opportunities: Vec<Opportunity>,
    pub matches: Vec<SynergyMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Parses every profile, auto-completes them against the bundle when one is
/// supplied, and runs a full analysis. An empty opportunity list is a
/// successful result.
pub fn analyze(request: &AnalyzeRequest, config: &EngineConfig) -> Result<AnalyzeResponse> {
    let raw = request.raw_profiles();
    if raw.is_empty() {
        return Err(SynergyError::validation("at least one profile is required"));
    }
    let library = load_bundle(request.template_bundle.as_ref())?;

    let mut warnings = Vec::new();
    let mut profiles = Vec::with_capacity(raw.len());
    for (index, value) in raw.iter().enumerate() {
        let profile = CompanyProfile::from_value(value).map_err(|err| match err {
            SynergyError::Validation(message) => {
                SynergyError::validation(format!("invalid profile at index {index}: {message}"))
            }
            other => other,
        })?;
        let profile = match &library {
            Some(library) => complete(library, profile, &mut warnings),
            None => profile,
        };
        profiles.push(profile);
    }
    for slug in duplicate_slugs(&profiles) {
        warn!(slug = %slug, "duplicate slug in request; last profile wins");
        warnings.push(format!("duplicate slug `{slug}`: last profile wins"));
    }

    let mut engine = SynergyEngine::with_config(config.clone())?;
    engine.register_companies(profiles)?;
    let run = match &library {
        Some(library) if library.has_tiering_rules() => engine.analyze_with_tiers(library)?,
        _ => engine.analyze()?,
    };
    let matches: Vec<SynergyMatch> = run.matches().cloned().collect();
    info!(
        run_id = %run.run_id,
        opportunities = run.opportunities.len(),
        matches = matches.len(),
        "analyze request served"
    );
    Ok(AnalyzeResponse {
        run_id: run.run_id,
        generated_at: run.generated_at,
        opportunities: run.opportunities,
        matches,
        groups: run.groups,
        warnings,
    })
}

/// Convenience for callers holding the raw JSON request body.
pub fn analyze_json(body: &str, config: &EngineConfig) -> Result<AnalyzeResponse> {
    let request: AnalyzeRequest = serde_json::from_str(body)
        .map_err(|err| SynergyError::validation(format!("malformed request: {err}")))?;
    analyze(&request, config)
}

fn load_bundle(bundle: Option<&Value>) -> Result<Option<ProfileTemplateLibrary>> {
    match bundle {
        None | Some(Value::Null) => Ok(None),
        Some(value) => ProfileTemplateLibrary::from_value(value).map(Some),
    }
}

fn complete(
    library: &ProfileTemplateLibrary,
    profile: CompanyProfile,
    warnings: &mut Vec<String>,
) -> CompanyProfile {
    let Some(template) = library.template_for(&profile) else {
        return profile;
    };
    let completed = template.apply(&profile);
    let missing = template.missing_fields(&completed);
    if !missing.is_empty() {
        warn!(slug = %completed.slug, template = %template.name, ?missing, "profile is missing required fields");
        warnings.push(format!(
            "profile `{}` is missing required fields for template `{}`: {}",
            completed.slug,
            template.name,
            missing.join(", ")
        ));
    }
    completed
}
