//! Three-party opportunities composed from two pairs sharing a hub company.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::opportunities::{channel_list, expected_outcomes, priority_for, push_unique};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::graph::SynergyGraph;
use crate::models::{opportunity_id, Breakdown, Opportunity, OpportunityKind};

const COORDINATION_RISK: &str = "coordination overhead across three partners";

/// For every hub with two pair partners `x < y` that share no direct pair,
/// emits one triad ordered `[x, hub, y]`. Fewer than two pairs yield nothing.
pub fn compose(
    pairs: &[Opportunity],
    graph: &SynergyGraph,
    config: &EngineConfig,
) -> Result<Vec<Opportunity>> {
    if pairs.len() < 2 || !config.triads.enabled {
        return Ok(Vec::new());
    }

    let mut neighbours: BTreeMap<&str, BTreeMap<&str, &Opportunity>> = BTreeMap::new();
    for pair in pairs {
        let [a, b] = pair.participants.as_slice() else {
            continue;
        };
        neighbours.entry(a).or_default().insert(b, pair);
        neighbours.entry(b).or_default().insert(a, pair);
    }

    let mut triads = Vec::new();
    for (hub, partners) in &neighbours {
        let partner_list: Vec<(&str, &Opportunity)> =
            partners.iter().map(|(slug, pair)| (*slug, *pair)).collect();
        for (i, (x, left)) in partner_list.iter().enumerate() {
            for (y, right) in &partner_list[i + 1..] {
                let directly_paired = neighbours
                    .get(x)
                    .map(|linked| linked.contains_key(y))
                    .unwrap_or(false);
                if directly_paired {
                    continue;
                }
                triads.push(triad(x, hub, y, left, right, graph, config)?);
            }
        }
    }
    debug!(count = triads.len(), "composed triads");
    Ok(triads)
}

fn triad(
    x: &str,
    hub: &str,
    y: &str,
    left: &Opportunity,
    right: &Opportunity,
    graph: &SynergyGraph,
    config: &EngineConfig,
) -> Result<Opportunity> {
    let names = [
        graph.company(x)?.name.as_str(),
        graph.company(hub)?.name.as_str(),
        graph.company(y)?.name.as_str(),
    ];
    let participants = vec![x.to_string(), hub.to_string(), y.to_string()];

    let mean_score = (left.score + right.score) / 2.0;
    let score = (mean_score - config.triads.coordination_penalty).max(0.0);
    let impact = (left.impact + right.impact) / 2.0;
    let confidence = (left.confidence + right.confidence) / 2.0;

    let engagement_channels: Vec<_> = left
        .breakdown
        .engagement_channels
        .iter()
        .chain(right.breakdown.engagement_channels.iter())
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut resources = left.breakdown.resources.clone();
    let mut risks = left.breakdown.risks.clone();
    for resource in &right.breakdown.resources {
        push_unique(&mut resources, resource.clone());
    }
    for risk in &right.breakdown.risks {
        push_unique(&mut risks, risk.clone());
    }
    risks.push(COORDINATION_RISK.to_string());

    let breakdown = Breakdown {
        alignment: format!("{}; {}", left.breakdown.alignment, right.breakdown.alignment),
        resources,
        risks,
        rationale: left
            .breakdown
            .rationale
            .iter()
            .chain(right.breakdown.rationale.iter())
            .cloned()
            .collect(),
        engagement_channels: engagement_channels.clone(),
    };

    Ok(Opportunity {
        id: opportunity_id(OpportunityKind::Triad, &participants),
        kind: OpportunityKind::Triad,
        name: format!("{}, {} & {} triad", names[0], names[1], names[2]),
        summary: format!(
            "Triad synergy linking {} and {} through {} across {}",
            names[0],
            names[2],
            names[1],
            channel_list(&engagement_channels)
        ),
        participants,
        hub: Some(hub.to_string()),
        matches: left.matches.iter().chain(right.matches.iter()).cloned().collect(),
        score,
        impact,
        confidence,
        expected_outcomes: expected_outcomes(&engagement_channels),
        priority: priority_for(score, impact, confidence, &config.priority),
        breakdown,
    })
}
