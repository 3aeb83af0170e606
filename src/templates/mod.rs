//! Reusable profile templates and ordered tiering rules.
//!
//! A bundle is a JSON or YAML document:
//!
//! ```yaml
//! templates:
//!   General:
//!     description: Baseline defaults
//!     tags: [community]
//! tiering_rules:
//!   - name: energy
//!     label: Energy partners
//!     criteria: [energy]
//! ```
//!
//! Both sections accept either a list of objects carrying a `name` or a
//! mapping from name to body. Declaration order is preserved and is the
//! evaluation order of tiering rules.

pub mod tiering;

pub use tiering::{group_companies, TierPredicate, TieringRule, UNCLASSIFIED};

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{EntityKind, Result, SynergyError};
use crate::models::{normalize_terms, CompanyProfile, EngagementChannel};
use tiering::TierRecord;

/// Template applied when a profile's organization type has no template.
pub const FALLBACK_TEMPLATE: &str = "General";

/// Default field values for one organization type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileTemplate {
    pub name: String,
    pub description: Option<String>,
    pub required_fields: Vec<String>,
    pub optional_fields: Vec<String>,
    pub mission: Option<String>,
    pub region: Option<String>,
    pub organization_type: Option<String>,
    pub capabilities: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub engagement_channels: Vec<EngagementChannel>,
}

impl ProfileTemplate {
    /// Copies template defaults into every empty field of `profile`.
    pub fn apply(&self, profile: &CompanyProfile) -> CompanyProfile {
        let mut completed = profile.clone();
        if completed.mission.is_none() {
            completed.mission = self.mission.clone();
        }
        if completed.region.is_none() {
            completed.region = self.region.clone();
        }
        if completed.organization_type.is_none() {
            completed.organization_type = self.organization_type.clone();
        }
        if completed.capabilities.is_empty() {
            completed.capabilities = self.capabilities.clone();
        }
        if completed.tags.is_empty() {
            completed.tags = self.tags.clone();
        }
        if completed.engagement_channels.is_empty() {
            completed.engagement_channels = self.engagement_channels.clone();
        }
        completed
    }

    /// Names in `required_fields` that are still empty on `profile`.
    pub fn missing_fields(&self, profile: &CompanyProfile) -> Vec<String> {
        self.required_fields
            .iter()
            .filter(|field| field_is_empty(profile, field).unwrap_or(false))
            .cloned()
            .collect()
    }
}

/// `None` for field names the profile does not carry.
fn field_is_empty(profile: &CompanyProfile, field: &str) -> Option<bool> {
    let empty = match field {
        "description" => profile.description.is_none(),
        "mission" => profile.mission.is_none(),
        "region" => profile.effective_region().is_none(),
        "organization_type" => profile.organization_type.is_none(),
        "location" | "headquarters" => profile.location.is_none(),
        "capabilities" | "expertise" => profile.capabilities.is_empty(),
        "tags" => profile.tags.is_empty(),
        "engagement_channels" => profile.engagement_channels.is_empty(),
        "needs" | "plugin_points" => profile.needs.is_empty(),
        "offers" | "offerings" | "plugs" => profile.offers.is_empty(),
        "contacts" | "key_contacts" => profile.contacts.is_empty(),
        _ => return None,
    };
    Some(empty)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TemplateRecord {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    required_fields: Vec<String>,
    #[serde(default)]
    optional_fields: Vec<String>,
    #[serde(default)]
    mission: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    organization_type: Option<String>,
    #[serde(default)]
    capabilities: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    engagement_channels: Vec<String>,
}

impl TemplateRecord {
    fn into_template(self, name: String) -> Result<ProfileTemplate> {
        let engagement_channels = EngagementChannel::parse_all(&self.engagement_channels)
            .map_err(|err| SynergyError::bundle(format!("template `{name}`: {err}")))?;
        Ok(ProfileTemplate {
            name,
            description: self.description,
            required_fields: self.required_fields,
            optional_fields: self.optional_fields,
            mission: self.mission,
            region: self.region,
            organization_type: self.organization_type,
            capabilities: normalize_terms(&self.capabilities),
            tags: normalize_terms(&self.tags),
            engagement_channels,
        })
    }
}

/// Loaded bundle. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ProfileTemplateLibrary {
    templates: Vec<ProfileTemplate>,
    tiering_rules: Vec<TieringRule>,
}

impl ProfileTemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a bundle file; `.yaml`/`.yml` parse as YAML, anything else as
    /// JSON.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);
        let library = if is_yaml {
            Self::from_yaml_str(&data)?
        } else {
            Self::from_json_str(&data)?
        };
        debug!(
            path = %path.display(),
            templates = library.templates.len(),
            tiers = library.tiering_rules.len(),
            "loaded template bundle"
        );
        Ok(library)
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(data)
            .map_err(|err| SynergyError::bundle(format!("invalid JSON: {err}")))?;
        Self::from_value(&value)
    }

    pub fn from_yaml_str(data: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(data)
            .map_err(|err| SynergyError::bundle(format!("invalid YAML: {err}")))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(bundle) = value else {
            return Err(SynergyError::bundle("bundle must be an object"));
        };

        let mut templates = Vec::new();
        for (name, body) in named_entries(bundle.get("templates"), "template")? {
            let record: TemplateRecord = serde_json::from_value(body)
                .map_err(|err| SynergyError::bundle(format!("template `{name}`: {err}")))?;
            templates.push(record.into_template(name)?);
        }

        let rules_section = bundle.get("tiering_rules").or_else(|| bundle.get("tiers"));
        let mut tiering_rules = Vec::new();
        for (name, body) in named_entries(rules_section, "tier")? {
            let record: TierRecord = serde_json::from_value(body)
                .map_err(|err| SynergyError::bundle(format!("tier `{name}`: {err}")))?;
            tiering_rules.push(record.into_rule(name));
        }

        Ok(Self {
            templates,
            tiering_rules,
        })
    }

    pub fn templates(&self) -> &[ProfileTemplate] {
        &self.templates
    }

    pub fn tiering_rules(&self) -> &[TieringRule] {
        &self.tiering_rules
    }

    pub fn has_tiering_rules(&self) -> bool {
        !self.tiering_rules.is_empty()
    }

    pub fn template(&self, name: &str) -> Result<&ProfileTemplate> {
        self.templates
            .iter()
            .find(|template| template.name == name)
            .ok_or_else(|| SynergyError::not_found(EntityKind::Template, name))
    }

    pub fn tier(&self, name: &str) -> Result<&TieringRule> {
        self.tiering_rules
            .iter()
            .find(|rule| rule.name == name)
            .ok_or_else(|| SynergyError::not_found(EntityKind::Tier, name))
    }

    /// Template for the profile's organization type (case-insensitive),
    /// falling back to [`FALLBACK_TEMPLATE`].
    pub fn template_for(&self, profile: &CompanyProfile) -> Option<&ProfileTemplate> {
        profile
            .organization_type
            .as_deref()
            .and_then(|kind| {
                self.templates
                    .iter()
                    .find(|template| template.name.eq_ignore_ascii_case(kind.trim()))
            })
            .or_else(|| {
                self.templates
                    .iter()
                    .find(|template| template.name == FALLBACK_TEMPLATE)
            })
    }

    /// Fills empty fields from the matching template. Returns the profile
    /// unchanged when no template applies.
    pub fn auto_complete_profile(&self, profile: &CompanyProfile) -> CompanyProfile {
        match self.template_for(profile) {
            Some(template) => template.apply(profile),
            None => profile.clone(),
        }
    }

    pub fn complete_with_template(
        &self,
        profile: &CompanyProfile,
        name: &str,
    ) -> Result<CompanyProfile> {
        Ok(self.template(name)?.apply(profile))
    }

    pub fn group_companies<'a, I>(&self, companies: I) -> BTreeMap<String, Vec<String>>
    where
        I: IntoIterator<Item = &'a CompanyProfile>,
    {
        group_companies(companies, &self.tiering_rules)
    }
}

/// Normalizes a section (list of named objects or name → body mapping) into
/// ordered `(name, body)` entries, rejecting duplicates.
fn named_entries(section: Option<&Value>, kind: &str) -> Result<Vec<(String, Value)>> {
    let mut entries = Vec::new();
    match section {
        None | Some(Value::Null) => return Ok(entries),
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                let Value::Object(body) = item else {
                    return Err(SynergyError::bundle(format!(
                        "{kind} at index {index} must be an object"
                    )));
                };
                let name = body
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        SynergyError::bundle(format!("{kind} at index {index} is missing `name`"))
                    })?;
                entries.push((name.to_string(), Value::Object(without_name(body))));
            }
        }
        Some(Value::Object(map)) => {
            for (name, body) in map {
                let Value::Object(body) = body else {
                    return Err(SynergyError::bundle(format!("{kind} `{name}` must be an object")));
                };
                entries.push((name.trim().to_string(), Value::Object(without_name(body))));
            }
        }
        Some(_) => {
            return Err(SynergyError::bundle(format!(
                "{kind} section must be a list or a mapping"
            )))
        }
    }

    let mut seen = HashSet::new();
    for (name, _) in &entries {
        if !seen.insert(name.as_str()) {
            return Err(SynergyError::bundle(format!("duplicate {kind} `{name}`")));
        }
    }
    Ok(entries)
}

fn without_name(body: &Map<String, Value>) -> Map<String, Value> {
    let mut body = body.clone();
    body.remove("name");
    body
}
