//! Execution playbooks for a selected opportunity.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::dataset::CompanyInput;
use crate::models::{Breakdown, EngagementChannel, MatchRef, Opportunity, Visibility};

/// Opportunity a playbook is drafted for: either a cached record referenced
/// by `id` or an inline opportunity object. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybookSubject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub matches: Vec<MatchRef>,
    #[serde(default)]
    pub breakdown: Breakdown,
}

impl PlaybookSubject {
    pub fn from_opportunity(opportunity: &Opportunity) -> Self {
        Self {
            id: Some(opportunity.id.clone()),
            name: opportunity.name.clone(),
            summary: opportunity.summary.clone(),
            participants: opportunity.participants.clone(),
            matches: opportunity.matches.clone(),
            breakdown: opportunity.breakdown.clone(),
        }
    }
}

/// Caller overrides; any populated field replaces the generated section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybookAdjustments {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub actors: Option<Vec<PlaybookActor>>,
    #[serde(default)]
    pub angles: Option<Vec<String>>,
    #[serde(default)]
    pub steps: Option<Vec<PlaybookStep>>,
    #[serde(default)]
    pub timeline: Option<Vec<TimelinePhase>>,
    #[serde(default)]
    pub risks: Option<Vec<String>>,
    #[serde(default)]
    pub collateral: Option<Vec<Collateral>>,
    #[serde(default, alias = "wwh_alignment")]
    pub focus_keys: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybookRequest {
    pub opportunity: PlaybookSubject,
    #[serde(default)]
    pub adjustments: Option<PlaybookAdjustments>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookActor {
    #[serde(default)]
    pub company_id: Option<String>,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybookStep {
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePhase {
    pub phase: String,
    pub focus: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collateral {
    pub title: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybookSections {
    pub summary: String,
    pub actors: Vec<PlaybookActor>,
    pub angles: Vec<String>,
    pub steps: Vec<PlaybookStep>,
    pub timeline: Vec<TimelinePhase>,
    pub risks: Vec<String>,
    pub collateral: Vec<Collateral>,
    pub focus_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playbook {
    pub summary: String,
    pub sections: PlaybookSections,
}

/// Drafts the playbook. `companies` maps slugs to dataset rows and supplies
/// actor details and focus keys; participants missing from it are skipped.
pub fn build(
    subject: &PlaybookSubject,
    adjustments: Option<&PlaybookAdjustments>,
    companies: &BTreeMap<String, CompanyInput>,
) -> Playbook {
    let adjust = adjustments.cloned().unwrap_or_default();
    let summary = adjust
        .summary
        .filter(|summary| !summary.trim().is_empty())
        .or_else(|| Some(subject.summary.clone()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| subject.name.clone());

    let sections = PlaybookSections {
        summary: summary.clone(),
        actors: non_empty(adjust.actors).unwrap_or_else(|| default_actors(subject, companies)),
        angles: non_empty(adjust.angles).unwrap_or_else(|| {
            subject
                .breakdown
                .engagement_channels
                .iter()
                .map(EngagementChannel::to_string)
                .collect()
        }),
        steps: non_empty(adjust.steps).unwrap_or_else(|| default_steps(subject)),
        timeline: non_empty(adjust.timeline).unwrap_or_else(default_timeline),
        risks: non_empty(adjust.risks).unwrap_or_else(|| default_risks(subject)),
        collateral: non_empty(adjust.collateral).unwrap_or_else(|| default_collateral(subject)),
        focus_keys: non_empty(adjust.focus_keys)
            .unwrap_or_else(|| aggregate_keys(subject, companies)),
    };
    Playbook { summary, sections }
}

fn non_empty<T>(items: Option<Vec<T>>) -> Option<Vec<T>> {
    items.filter(|items| !items.is_empty())
}

fn default_actors(
    subject: &PlaybookSubject,
    companies: &BTreeMap<String, CompanyInput>,
) -> Vec<PlaybookActor> {
    subject
        .participants
        .iter()
        .filter_map(|slug| companies.get(slug).map(|company| (slug, company)))
        .map(|(slug, company)| PlaybookActor {
            company_id: Some(company.id.clone()),
            slug: slug.clone(),
            name: company.name.clone(),
            org_id: Some(company.org_id.clone()),
            visibility: Some(company.visibility),
        })
        .collect()
}

fn aggregate_keys(
    subject: &PlaybookSubject,
    companies: &BTreeMap<String, CompanyInput>,
) -> Vec<String> {
    let keys: BTreeSet<String> = subject
        .participants
        .iter()
        .filter_map(|slug| companies.get(slug))
        .flat_map(|company| company.keys.iter())
        .filter(|key| !key.trim().is_empty())
        .cloned()
        .collect();
    keys.into_iter().collect()
}

fn default_steps(subject: &PlaybookSubject) -> Vec<PlaybookStep> {
    let mut steps = vec![PlaybookStep {
        title: "Alignment Workshop".to_string(),
        detail: format!(
            "Gather {} to confirm objectives and success metrics.",
            subject.participants.join(", ")
        ),
    }];
    for (index, reason) in subject.breakdown.rationale.iter().enumerate() {
        steps.push(PlaybookStep {
            title: format!("Opportunity Track {}", index + 1),
            detail: reason.clone(),
        });
    }
    steps
}

fn default_timeline() -> Vec<TimelinePhase> {
    vec![
        TimelinePhase {
            phase: "0-30 days".to_string(),
            focus: "Discovery".to_string(),
            actions: vec!["Kickoff session".to_string(), "Map shared assets".to_string()],
        },
        TimelinePhase {
            phase: "30-90 days".to_string(),
            focus: "Pilot".to_string(),
            actions: vec![
                "Launch joint pilot".to_string(),
                "Collect impact data".to_string(),
            ],
        },
    ]
}

fn default_risks(subject: &PlaybookSubject) -> Vec<String> {
    if !subject.breakdown.risks.is_empty() {
        return subject.breakdown.risks.clone();
    }
    match subject.participants.as_slice() {
        [first, second, ..] => vec![format!(
            "Alignment risk between {first} and {second} on delivery approach."
        )],
        [only] => vec![format!("Resourcing risk for {only} if capacity shifts.")],
        [] => vec!["Ensure clear ownership before execution.".to_string()],
    }
}

fn default_collateral(subject: &PlaybookSubject) -> Vec<Collateral> {
    subject
        .matches
        .iter()
        .map(|found| Collateral {
            title: format!("Need '{}' served by offer '{}'", found.need, found.offer),
            source: Some(found.seeker.clone()),
            target: Some(found.provider.clone()),
        })
        .collect()
}
