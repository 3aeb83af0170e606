//! Normalized dataset intake and a cached, swappable opportunity view.
//!
//! A dataset arrives as flat tables (companies, needs, offers, contacts)
//! joined by `companyId`. [`GraphService::recompute`] builds a fresh engine
//! from it without holding any lock, then swaps the finished state in.
//! Readers clone the current `Arc` and never observe a half-built run.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock, RwLockReadGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::playbook::{self, Playbook, PlaybookRequest, PlaybookSubject};
use crate::config::EngineConfig;
use crate::error::{EntityKind, Result, SynergyError};
use crate::matching::SynergyEngine;
use crate::models::{
    deserialize_level, generate_slug, slugify, CompanyProfile, Contact, EngagementChannel, Level,
    Need, Offer, Opportunity, Visibility,
};

const fn partner() -> Visibility {
    Visibility::Partner
}

const fn private() -> Visibility {
    Visibility::Private
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInput {
    pub id: String,
    pub org_id: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub mission: Option<String>,
    /// Focus keys the company is organized around.
    #[serde(default, alias = "wwhKeys")]
    pub keys: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default = "partner")]
    pub visibility: Visibility,
}

impl CompanyInput {
    /// Graph slug for the row: the supplied slug normalized, else one derived
    /// from the name. A name that normalizes to nothing yields a random slug,
    /// so callers resolve once and reuse the value.
    pub fn slug(&self) -> String {
        let supplied = self.slug.as_deref().map(slugify).unwrap_or_default();
        if supplied.is_empty() {
            generate_slug(&self.name)
        } else {
            supplied
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedInput {
    pub id: String,
    pub company_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_level")]
    pub urgency: Level,
    #[serde(default = "partner")]
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferInput {
    pub id: String,
    pub company_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_level")]
    pub capacity: Level,
    #[serde(default = "partner")]
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    pub id: String,
    pub company_id: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "private")]
    pub privacy_level: Visibility,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetPayload {
    pub companies: Vec<CompanyInput>,
    #[serde(default)]
    pub needs: Vec<NeedInput>,
    #[serde(default)]
    pub offers: Vec<OfferInput>,
    #[serde(default)]
    pub contacts: Vec<ContactInput>,
}

impl DatasetPayload {
    /// Joins the tables into profiles, one per company in input order. Rows
    /// pointing at unknown companies are skipped with a warning.
    pub fn to_profiles(&self) -> Result<Vec<CompanyProfile>> {
        let known: BTreeSet<&str> = self.companies.iter().map(|c| c.id.as_str()).collect();
        let needs = index_by_company(&self.needs, |need| &need.company_id, &known, "need");
        let offers = index_by_company(&self.offers, |offer| &offer.company_id, &known, "offer");
        let contacts =
            index_by_company(&self.contacts, |contact| &contact.company_id, &known, "contact");

        let mut profiles = Vec::with_capacity(self.companies.len());
        for company in &self.companies {
            if company.name.trim().is_empty() {
                return Err(SynergyError::validation(format!(
                    "company `{}` has an empty name",
                    company.id
                )));
            }
            let mut profile = CompanyProfile::new(company.name.trim())
                .with_slug(company.slug())
                .with_capabilities(&company.capabilities)
                .with_tags(company.capabilities.iter().chain(company.keys.iter()));
            profile.mission = company.mission.clone();
            profile.region = company.region.clone();

            for need in needs.get(company.id.as_str()).into_iter().flatten() {
                let mut converted = Need::new(need.title.trim(), need.urgency).tagged(&need.tags);
                converted.description = need.description.clone();
                converted.visibility = need.visibility;
                converted.engagement_channels = channels_from_tags(&need.tags);
                profile = profile.with_need(converted);
            }
            for offer in offers.get(company.id.as_str()).into_iter().flatten() {
                let mut converted =
                    Offer::new(offer.title.trim(), offer.capacity).tagged(&offer.tags);
                converted.description = offer.description.clone();
                converted.visibility = offer.visibility;
                converted.engagement_channels = channels_from_tags(&offer.tags);
                profile = profile.with_offer(converted);
            }
            for contact in contacts.get(company.id.as_str()).into_iter().flatten() {
                let mut converted = Contact::new(contact.name.trim());
                converted.role = contact.role.clone();
                converted.email = contact.email.clone();
                converted.phone = contact.phone.clone();
                converted.privacy_level = contact.privacy_level;
                profile = profile.with_contact(converted);
            }
            profiles.push(profile);
        }
        Ok(profiles)
    }
}

fn index_by_company<'a, T, F>(
    rows: &'a [T],
    company_of: F,
    known: &BTreeSet<&str>,
    kind: &str,
) -> BTreeMap<&'a str, Vec<&'a T>>
where
    F: Fn(&'a T) -> &'a String,
{
    let mut indexed: BTreeMap<&str, Vec<&T>> = BTreeMap::new();
    for row in rows {
        let company_id = company_of(row).as_str();
        if !known.contains(company_id) {
            warn!(company_id, kind, "skipping row for unknown company");
            continue;
        }
        indexed.entry(company_id).or_default().push(row);
    }
    indexed
}

/// Tags that name an engagement channel become channels; other tags stay
/// plain tags.
fn channels_from_tags(tags: &[String]) -> Vec<EngagementChannel> {
    let mut channels = Vec::new();
    for tag in tags {
        if let Ok(channel) = EngagementChannel::from_value(tag) {
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }
    }
    channels
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpportunityStatus {
    Open,
    InProgress,
    Closed,
}

impl OpportunityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityStatus::Open => "OPEN",
            OpportunityStatus::InProgress => "IN_PROGRESS",
            OpportunityStatus::Closed => "CLOSED",
        }
    }
}

/// Cached opportunity plus the dataset identifiers of its participants.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityRecord {
    #[serde(flatten)]
    pub opportunity: Opportunity,
    pub company_ids: Vec<String>,
    pub org_ids: Vec<String>,
    pub keys: Vec<String>,
    pub status: OpportunityStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityFilter {
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub company_id: Option<String>,
    /// Case-insensitive status name.
    #[serde(default)]
    pub status: Option<String>,
}

impl OpportunityFilter {
    fn accepts(&self, record: &OpportunityRecord) -> bool {
        if let Some(status) = &self.status {
            if !record.status.as_str().eq_ignore_ascii_case(status.trim()) {
                return false;
            }
        }
        if let Some(org_id) = &self.org_id {
            if !record.org_ids.contains(org_id) {
                return false;
            }
        }
        if let Some(company_id) = &self.company_id {
            if !record.company_ids.contains(company_id) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecomputeSummary {
    pub companies: usize,
    pub needs: usize,
    pub offers: usize,
    pub contacts: usize,
    pub opportunities: usize,
}

/// Immutable snapshot served to readers.
#[derive(Debug, Clone, Default)]
pub(crate) struct ServiceState {
    pub(crate) companies_by_slug: BTreeMap<String, CompanyInput>,
    pub(crate) records: BTreeMap<String, OpportunityRecord>,
    pub(crate) generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct GraphService {
    config: EngineConfig,
    state: RwLock<Arc<ServiceState>>,
}

impl GraphService {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: RwLock::new(Arc::new(ServiceState::default())),
        })
    }

    fn current(&self) -> Arc<ServiceState> {
        let guard: RwLockReadGuard<'_, Arc<ServiceState>> = self
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    fn replace(&self, next: ServiceState) {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(next);
    }

    /// Rebuilds every cached opportunity from `dataset`. On error the
    /// previous state stays in place.
    pub fn recompute(&self, dataset: &DatasetPayload) -> Result<RecomputeSummary> {
        let profiles = dataset.to_profiles()?;
        let companies_by_slug: BTreeMap<String, CompanyInput> = profiles
            .iter()
            .zip(&dataset.companies)
            .map(|(profile, company)| (profile.slug.clone(), company.clone()))
            .collect();
        let mut engine = SynergyEngine::with_config(self.config.clone())?;
        engine.register_companies(profiles)?;
        let run = engine.analyze()?;

        let records: BTreeMap<String, OpportunityRecord> = run
            .opportunities
            .into_iter()
            .map(|opportunity| {
                let record = to_record(opportunity, &companies_by_slug);
                (record.opportunity.id.clone(), record)
            })
            .collect();

        let summary = RecomputeSummary {
            companies: dataset.companies.len(),
            needs: dataset.needs.len(),
            offers: dataset.offers.len(),
            contacts: dataset.contacts.len(),
            opportunities: records.len(),
        };
        self.replace(ServiceState {
            companies_by_slug,
            records,
            generated_at: Some(run.generated_at),
        });
        info!(
            companies = summary.companies,
            opportunities = summary.opportunities,
            "recomputed synergy dataset"
        );
        Ok(summary)
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.current().generated_at
    }

    /// Cached opportunities passing `filter`, highest score first.
    pub fn opportunities(&self, filter: &OpportunityFilter) -> Vec<OpportunityRecord> {
        let state = self.current();
        let mut items: Vec<OpportunityRecord> = state
            .records
            .values()
            .filter(|record| filter.accepts(record))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.opportunity
                .score
                .partial_cmp(&a.opportunity.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.opportunity.id.cmp(&b.opportunity.id))
        });
        items
    }

    pub fn opportunity(&self, id: &str) -> Result<OpportunityRecord> {
        self.current()
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| SynergyError::not_found(EntityKind::Opportunity, id))
    }

    /// Copy-on-write status change of one cached opportunity.
    pub fn set_status(&self, id: &str, status: OpportunityStatus) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let state = Arc::make_mut(&mut *guard);
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| SynergyError::not_found(EntityKind::Opportunity, id))?;
        record.status = status;
        Ok(())
    }

    /// Structured playbook for a cached opportunity (by id) or an inline one.
    pub fn playbook(&self, request: &PlaybookRequest) -> Result<Playbook> {
        let state = self.current();
        let requested_id = request.opportunity.id.as_deref();
        let cached = requested_id.and_then(|id| state.records.get(id));
        let subject = match (cached, requested_id) {
            (Some(record), _) => PlaybookSubject::from_opportunity(&record.opportunity),
            (None, Some(id)) if request.opportunity.participants.is_empty() => {
                return Err(SynergyError::not_found(EntityKind::Opportunity, id));
            }
            _ => request.opportunity.clone(),
        };
        if subject.participants.is_empty() {
            return Err(SynergyError::validation(
                "playbook requires an opportunity id or participants",
            ));
        }
        Ok(playbook::build(
            &subject,
            request.adjustments.as_ref(),
            &state.companies_by_slug,
        ))
    }
}

fn to_record(
    opportunity: Opportunity,
    companies_by_slug: &BTreeMap<String, CompanyInput>,
) -> OpportunityRecord {
    let mut company_ids = Vec::new();
    let mut org_ids = BTreeSet::new();
    let mut keys = BTreeSet::new();
    for slug in &opportunity.participants {
        match companies_by_slug.get(slug) {
            Some(company) => {
                company_ids.push(company.id.clone());
                org_ids.insert(company.org_id.clone());
                keys.extend(company.keys.iter().filter(|key| !key.is_empty()).cloned());
            }
            None => company_ids.push(slug.clone()),
        }
    }
    OpportunityRecord {
        opportunity,
        company_ids,
        org_ids: org_ids.into_iter().collect(),
        keys: keys.into_iter().collect(),
        status: OpportunityStatus::Open,
    }
}
