//! Need/offer scoring and pair deduplication.

use std::collections::BTreeMap;

use tracing::debug;

use super::index::TermIndex;
use crate::config::ScoringSettings;
use crate::error::Result;
use crate::graph::SynergyGraph;
use crate::models::{
    ComplementaryPair, CompanyProfile, EngagementChannel, Need, Offer, SynergyMatch,
};

/// Squashes a non-negative raw score into [0, 1).
pub fn pair_score(raw: f64) -> f64 {
    if raw <= 0.0 {
        0.0
    } else {
        raw / (raw + 1.0)
    }
}

/// Scores one need of `seeker` against one offer of `provider`. `None` when
/// the need terms share nothing with the offer terms plus the provider's
/// capabilities.
pub fn score_combination(
    seeker: &CompanyProfile,
    need: &Need,
    provider: &CompanyProfile,
    offer: &Offer,
    scoring: &ScoringSettings,
) -> Option<SynergyMatch> {
    let need_terms = need.terms();
    let mut offer_terms = offer.terms();
    offer_terms.extend(provider.capabilities.iter().cloned());
    let shared_terms: Vec<String> = need_terms.intersection(&offer_terms).cloned().collect();
    if shared_terms.is_empty() {
        return None;
    }
    let mission_overlap: Vec<String> = seeker
        .mission_keywords()
        .intersection(&provider.mission_keywords())
        .cloned()
        .collect();

    let overlap = scoring.tag_weight * shared_terms.len() as f64
        + scoring.mission_weight * mission_overlap.len() as f64;
    let raw_score = overlap
        * scoring.urgency.for_level(need.urgency)
        * scoring.capacity.for_level(offer.capacity);

    Some(SynergyMatch {
        seeker: seeker.slug.clone(),
        provider: provider.slug.clone(),
        need: need.title.clone(),
        offer: offer.title.clone(),
        urgency: need.urgency,
        capacity: offer.capacity,
        description: format!(
            "{} can support {}'s need '{}' via {}",
            provider.name, seeker.name, need.title, offer.title
        ),
        engagement_channels: combined_channels(need, offer),
        shared_terms,
        mission_overlap,
        raw_score,
    })
}

fn combined_channels(need: &Need, offer: &Offer) -> Vec<EngagementChannel> {
    let mut channels = Vec::new();
    for channel in need
        .engagement_channels
        .iter()
        .chain(offer.engagement_channels.iter())
    {
        if !channels.contains(channel) {
            channels.push(*channel);
        }
    }
    if channels.is_empty() {
        channels.push(EngagementChannel::Service);
    }
    channels
}

/// Every need/offer match across the registered companies. Candidate
/// providers come from the term index; self-matches are impossible.
pub fn collect_matches(
    graph: &SynergyGraph,
    index: &TermIndex,
    scoring: &ScoringSettings,
) -> Result<Vec<SynergyMatch>> {
    let mut matches = Vec::new();
    for seeker in graph.companies().filter(|profile| !profile.needs.is_empty()) {
        for slug in index.provider_candidates(seeker) {
            let provider = graph.company(&slug)?;
            for need in &seeker.needs {
                for offer in &provider.offers {
                    if let Some(found) = score_combination(seeker, need, provider, offer, scoring) {
                        matches.push(found);
                    }
                }
            }
        }
    }
    debug!(count = matches.len(), "scored need/offer matches");
    Ok(matches)
}

/// Groups matches on the unordered company pair. The highest raw score is the
/// primary match. Output is sorted by score descending, then slug pair.
pub fn group_pairs(matches: Vec<SynergyMatch>) -> Vec<ComplementaryPair> {
    let mut buckets: BTreeMap<(String, String), Vec<SynergyMatch>> = BTreeMap::new();
    for found in matches {
        let key = if found.seeker <= found.provider {
            (found.seeker.clone(), found.provider.clone())
        } else {
            (found.provider.clone(), found.seeker.clone())
        };
        buckets.entry(key).or_default().push(found);
    }

    let mut pairs: Vec<ComplementaryPair> = buckets
        .into_values()
        .filter_map(|mut bucket| {
            bucket.sort_by(SynergyMatch::rank_cmp);
            let mut iter = bucket.into_iter();
            let primary = iter.next()?;
            Some(ComplementaryPair {
                score: pair_score(primary.raw_score),
                supporting: iter.collect(),
                primary,
            })
        })
        .collect();
    pairs.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.participants().cmp(&b.participants()))
    });
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Level;

    fn seeker(urgency: Level) -> CompanyProfile {
        CompanyProfile::new("Aqua Reach")
            .with_mission("Deliver clean water access")
            .with_need(Need::new("Power storage", urgency).tagged(["energy"]))
    }

    fn provider(capacity: Level) -> CompanyProfile {
        CompanyProfile::new("Grid Wise")
            .with_mission("Deliver resilient energy")
            .with_capabilities(["energy"])
            .with_offer(Offer::new("Microgrid analytics", capacity).tagged(["energy"]))
    }

    fn raw(urgency: Level, capacity: Level) -> f64 {
        let (s, p) = (seeker(urgency), provider(capacity));
        score_combination(&s, &s.needs[0], &p, &p.offers[0], &ScoringSettings::default())
            .unwrap()
            .raw_score
    }

    #[test]
    fn shared_terms_and_mission_feed_the_raw_score() {
        let (s, p) = (seeker(Level::High), provider(Level::Med));
        let found =
            score_combination(&s, &s.needs[0], &p, &p.offers[0], &ScoringSettings::default())
                .unwrap();
        assert_eq!(found.shared_terms, vec!["energy"]);
        assert_eq!(found.mission_overlap, vec!["deliver"]);
        assert!((found.raw_score - 1.5 * 1.3).abs() < 1e-9);
        assert_eq!(found.engagement_channels, vec![EngagementChannel::Service]);
        assert!(found.description.contains("Power storage"));
    }

    #[test]
    fn higher_levels_strictly_increase_the_score() {
        assert!(raw(Level::High, Level::Med) > raw(Level::Med, Level::Med));
        assert!(raw(Level::Med, Level::Med) > raw(Level::Low, Level::Med));
        assert!(raw(Level::Med, Level::High) > raw(Level::Med, Level::Med));
        assert!(raw(Level::Med, Level::Med) > raw(Level::Med, Level::Low));
        assert!(pair_score(raw(Level::High, Level::High)) > pair_score(raw(Level::Low, Level::Low)));
    }

    #[test]
    fn disjoint_terms_do_not_match() {
        let s = CompanyProfile::new("A").with_need(Need::new("Legal advice", Level::High));
        let p = CompanyProfile::new("B").with_offer(Offer::new("Catering", Level::High));
        assert!(
            score_combination(&s, &s.needs[0], &p, &p.offers[0], &ScoringSettings::default())
                .is_none()
        );
    }

    #[test]
    fn pair_score_stays_in_unit_interval() {
        assert_eq!(pair_score(0.0), 0.0);
        assert!((pair_score(1.0) - 0.5).abs() < 1e-9);
        assert!(pair_score(1_000.0) < 1.0);
    }

    #[test]
    fn grouping_keeps_highest_match_as_primary() {
        let base = {
            let (s, p) = (seeker(Level::Low), provider(Level::Med));
            score_combination(&s, &s.needs[0], &p, &p.offers[0], &ScoringSettings::default())
                .unwrap()
        };
        let mut reverse = base.clone();
        reverse.seeker = base.provider.clone();
        reverse.provider = base.seeker.clone();
        reverse.raw_score = base.raw_score * 2.0;

        let pairs = group_pairs(vec![base.clone(), reverse.clone()]);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].primary, reverse);
        assert_eq!(pairs[0].supporting, vec![base]);
        assert_eq!(pairs[0].participants(), ("aqua-reach", "grid-wise"));
    }
}
