use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::CompanyProfile;

/// Bucket for companies no rule claims.
pub const UNCLASSIFIED: &str = "unclassified";

/// Matching conditions of a tier. Every populated condition must hold; an
/// empty predicate matches every company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierPredicate {
    /// Each term must appear in the profile's text.
    #[serde(default, alias = "criteria")]
    pub all: Vec<String>,
    /// At least one term must appear in the profile's text.
    #[serde(default)]
    pub any: Vec<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub organization_type: Option<String>,
}

impl TierPredicate {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
            && self.any.is_empty()
            && self.region.is_none()
            && self.organization_type.is_none()
    }

    pub fn matches(&self, profile: &CompanyProfile) -> bool {
        if self.is_empty() {
            return true;
        }
        let haystack = Haystack::of(profile);
        if !self.all.iter().all(|term| haystack.contains(term)) {
            return false;
        }
        if !self.any.is_empty() && !self.any.iter().any(|term| haystack.contains(term)) {
            return false;
        }
        if let Some(region) = &self.region {
            let found = profile
                .effective_region()
                .map(|value| contains_ignore_case(value, region))
                .unwrap_or(false);
            if !found {
                return false;
            }
        }
        if let Some(kind) = &self.organization_type {
            let found = profile
                .organization_type
                .as_deref()
                .map(|value| value.trim().eq_ignore_ascii_case(kind.trim()))
                .unwrap_or(false);
            if !found {
                return false;
            }
        }
        true
    }
}

/// Lowercased text fields a predicate term is tested against.
struct Haystack {
    fields: Vec<String>,
}

impl Haystack {
    fn of(profile: &CompanyProfile) -> Self {
        let mut fields = vec![profile.name.to_lowercase()];
        if let Some(description) = &profile.description {
            fields.push(description.to_lowercase());
        }
        fields.extend(profile.vectorize());
        Self { fields }
    }

    fn contains(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        !needle.is_empty() && self.fields.iter().any(|field| field.contains(&needle))
    }
}

fn contains_ignore_case(value: &str, needle: &str) -> bool {
    value.to_lowercase().contains(&needle.trim().to_lowercase())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TieringRule {
    pub name: String,
    pub label: String,
    pub description: Option<String>,
    pub predicate: TierPredicate,
}

impl TieringRule {
    pub fn new(name: impl Into<String>, predicate: TierPredicate) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            description: None,
            predicate,
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn applies_to(&self, profile: &CompanyProfile) -> bool {
        self.predicate.matches(profile)
    }
}

/// Wire shape of a tier inside a bundle.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TierRecord {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub predicate: Option<TierPredicate>,
    #[serde(default)]
    pub criteria: Vec<String>,
}

impl TierRecord {
    pub(crate) fn into_rule(self, name: String) -> TieringRule {
        let mut predicate = self.predicate.unwrap_or_default();
        predicate.all.extend(self.criteria);
        let label = self
            .label
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| name.clone());
        TieringRule {
            name,
            label,
            description: self.description,
            predicate,
        }
    }
}

/// Assigns each company to the label of the first rule it satisfies, or to
/// [`UNCLASSIFIED`]. Every label and `unclassified` are present as keys.
pub fn group_companies<'a, I>(companies: I, rules: &[TieringRule]) -> BTreeMap<String, Vec<String>>
where
    I: IntoIterator<Item = &'a CompanyProfile>,
{
    let mut groups: BTreeMap<String, Vec<String>> = rules
        .iter()
        .map(|rule| (rule.label.clone(), Vec::new()))
        .collect();
    groups.insert(UNCLASSIFIED.to_string(), Vec::new());
    for company in companies {
        let label = rules
            .iter()
            .find(|rule| rule.applies_to(company))
            .map(|rule| rule.label.as_str())
            .unwrap_or(UNCLASSIFIED);
        groups
            .entry(label.to_string())
            .or_default()
            .push(company.slug.clone());
    }
    groups
}
