//! Turns scored pairs into opportunity records.

use std::collections::BTreeSet;

use crate::config::{EngineConfig, PrioritySettings, ScoringSettings};
use crate::error::Result;
use crate::graph::SynergyGraph;
use crate::models::{
    opportunity_id, Breakdown, ComplementaryPair, CompanyProfile, EngagementChannel, Level,
    Opportunity, OpportunityKind, Priority, SynergyMatch,
};

const DEFAULT_OUTCOME: &str = "Joint planning workshop to scope initiatives";

/// Builds pair opportunities against the profiles of one graph.
pub struct OpportunityBuilder<'a> {
    graph: &'a SynergyGraph,
    config: &'a EngineConfig,
}

impl<'a> OpportunityBuilder<'a> {
    pub fn new(graph: &'a SynergyGraph, config: &'a EngineConfig) -> Self {
        Self { graph, config }
    }

    pub fn build(&self, pairs: &[ComplementaryPair]) -> Result<Vec<Opportunity>> {
        pairs.iter().map(|pair| self.pair(pair)).collect()
    }

    pub fn pair(&self, pair: &ComplementaryPair) -> Result<Opportunity> {
        let (a, b) = pair.participants();
        let first = self.graph.company(a)?;
        let second = self.graph.company(b)?;
        let matches: Vec<&SynergyMatch> = pair.matches().collect();

        let engagement_channels = channels_of(&matches);
        let participants = vec![first.slug.clone(), second.slug.clone()];
        let impact = impact_of(&pair.primary, &self.config.scoring);
        let confidence = confidence_between(first, second);
        let breakdown = Breakdown {
            alignment: alignment_of(&matches),
            resources: resources_of(&matches),
            risks: risks_of(&[first, second], &matches),
            rationale: matches.iter().map(|m| m.description.clone()).collect(),
            engagement_channels: engagement_channels.clone(),
        };

        Ok(Opportunity {
            id: opportunity_id(OpportunityKind::Pair, &participants),
            kind: OpportunityKind::Pair,
            name: format!("{} & {} strategic lane", first.name, second.name),
            summary: format!(
                "Collaboration between {} and {} across {}",
                first.name,
                second.name,
                channel_list(&engagement_channels)
            ),
            participants,
            hub: None,
            matches: matches.iter().map(|m| m.reference()).collect(),
            score: pair.score,
            impact,
            confidence,
            expected_outcomes: expected_outcomes(&engagement_channels),
            priority: priority_for(pair.score, impact, confidence, &self.config.priority),
            breakdown,
        })
    }
}

/// Urgency × capacity product of `found`, normalized by the HIGH × HIGH
/// product.
pub fn impact_of(found: &SynergyMatch, scoring: &ScoringSettings) -> f64 {
    let max = scoring.urgency.for_level(Level::High) * scoring.capacity.for_level(Level::High);
    if max <= 0.0 {
        return 0.0;
    }
    let product =
        scoring.urgency.for_level(found.urgency) * scoring.capacity.for_level(found.capacity);
    (product / max).clamp(0.0, 1.0)
}

/// Jaccard overlap of the two companies' vectorized terms.
pub fn confidence_between(a: &CompanyProfile, b: &CompanyProfile) -> f64 {
    let left = a.term_set();
    let right = b.term_set();
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

/// Weighted composite of score, impact and confidence mapped to a class.
pub fn priority_for(score: f64, impact: f64, confidence: f64, settings: &PrioritySettings) -> Priority {
    let total = settings.score_weight + settings.impact_weight + settings.confidence_weight;
    let composite = if total > 0.0 {
        (settings.score_weight * score
            + settings.impact_weight * impact
            + settings.confidence_weight * confidence)
            / total
    } else {
        0.0
    };
    if composite >= settings.high_threshold {
        Priority::High
    } else if composite >= settings.medium_threshold {
        Priority::Medium
    } else {
        Priority::Low
    }
}

fn alignment_of(matches: &[&SynergyMatch]) -> String {
    matches
        .iter()
        .map(|m| format!("Need '{}' aligns with offer '{}'", m.need, m.offer))
        .collect::<Vec<_>>()
        .join("; ")
}

fn resources_of(matches: &[&SynergyMatch]) -> Vec<String> {
    let mut resources: Vec<String> = Vec::new();
    for found in matches {
        if !resources.contains(&found.offer) {
            resources.push(found.offer.clone());
        }
    }
    resources
}

fn risks_of(participants: &[&CompanyProfile], matches: &[&SynergyMatch]) -> Vec<String> {
    let mut risks = Vec::new();
    for profile in participants {
        if !profile.has_reachable_contact() {
            risks.push(format!("no point of contact for {}", profile.name));
        }
    }
    for found in matches {
        let risk = match (found.urgency, found.capacity) {
            (Level::High, Level::High) => Some(format!(
                "fulfilment risk: urgent need '{}' leans on heavily used offer '{}'",
                found.need, found.offer
            )),
            (Level::High, Level::Low) => Some(format!(
                "capacity risk: urgent need '{}' exceeds the capacity behind '{}'",
                found.need, found.offer
            )),
            _ => None,
        };
        if let Some(risk) = risk {
            push_unique(&mut risks, risk);
        }
    }
    risks
}

fn channels_of(matches: &[&SynergyMatch]) -> Vec<EngagementChannel> {
    let channels: BTreeSet<EngagementChannel> = matches
        .iter()
        .flat_map(|m| m.engagement_channels.iter().copied())
        .collect();
    if channels.is_empty() {
        vec![EngagementChannel::Service]
    } else {
        channels.into_iter().collect()
    }
}

pub(crate) fn channel_list(channels: &[EngagementChannel]) -> String {
    channels
        .iter()
        .map(EngagementChannel::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome hints keyed on the engagement channels in play.
pub fn expected_outcomes(channels: &[EngagementChannel]) -> Vec<String> {
    let mut outcomes = BTreeSet::new();
    for channel in channels {
        let outcome = match channel {
            EngagementChannel::SocialImpact => "Amplify social impact with shared channels",
            EngagementChannel::Technology => "Integrate technology stacks for scalable delivery",
            EngagementChannel::Talent => "Talent exchange and mentorship pipelines",
            _ => continue,
        };
        outcomes.insert(outcome.to_string());
    }
    if outcomes.is_empty() {
        outcomes.insert(DEFAULT_OUTCOME.to_string());
    }
    outcomes.into_iter().collect()
}

pub(crate) fn push_unique(items: &mut Vec<String>, item: String) {
    if !items.contains(&item) {
        items.push(item);
    }
}
