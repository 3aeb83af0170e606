use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::profile::{EngagementChannel, Level};

/// One need/offer combination that matched: `seeker`'s need can be served by
/// `provider`'s offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynergyMatch {
    pub seeker: String,
    pub provider: String,
    pub need: String,
    pub offer: String,
    pub urgency: Level,
    pub capacity: Level,
    pub shared_terms: Vec<String>,
    pub mission_overlap: Vec<String>,
    pub raw_score: f64,
    pub engagement_channels: Vec<EngagementChannel>,
    pub description: String,
}

impl SynergyMatch {
    pub fn reference(&self) -> MatchRef {
        MatchRef {
            seeker: self.seeker.clone(),
            provider: self.provider.clone(),
            need: self.need.clone(),
            offer: self.offer.clone(),
            raw_score: self.raw_score,
        }
    }

    /// Ordering used to pick the primary match of a pair: higher raw score
    /// first, then lexicographic on the references.
    pub(crate) fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .raw_score
            .partial_cmp(&self.raw_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.seeker.cmp(&other.seeker))
            .then_with(|| self.need.cmp(&other.need))
            .then_with(|| self.offer.cmp(&other.offer))
    }
}

/// Lightweight reference to a matched need/offer, carried on opportunities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRef {
    pub seeker: String,
    pub provider: String,
    pub need: String,
    pub offer: String,
    pub raw_score: f64,
}

/// All matches between two companies, deduplicated on the unordered pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplementaryPair {
    pub primary: SynergyMatch,
    pub supporting: Vec<SynergyMatch>,
    /// Primary raw score squashed into [0, 1).
    pub score: f64,
}

impl ComplementaryPair {
    /// Participant slugs in lexicographic order.
    pub fn participants(&self) -> (&str, &str) {
        let (a, b) = (self.primary.seeker.as_str(), self.primary.provider.as_str());
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn involves(&self, slug: &str) -> bool {
        self.primary.seeker == slug || self.primary.provider == slug
    }

    pub fn matches(&self) -> impl Iterator<Item = &SynergyMatch> {
        std::iter::once(&self.primary).chain(self.supporting.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    Pair,
    Triad,
}

impl OpportunityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityKind::Pair => "pair",
            OpportunityKind::Triad => "triad",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    #[serde(default)]
    pub alignment: String,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub rationale: Vec<String>,
    #[serde(default)]
    pub engagement_channels: Vec<EngagementChannel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: String,
    pub kind: OpportunityKind,
    pub name: String,
    pub summary: String,
    pub participants: Vec<String>,
    #[serde(default)]
    pub hub: Option<String>,
    pub matches: Vec<MatchRef>,
    pub score: f64,
    pub impact: f64,
    pub confidence: f64,
    pub breakdown: Breakdown,
    pub priority: Priority,
    #[serde(default)]
    pub expected_outcomes: Vec<String>,
}

impl Opportunity {
    pub fn involves(&self, slug: &str) -> bool {
        self.participants.iter().any(|p| p == slug)
    }

    /// Final ordering of a run: priority desc, score desc, id asc.
    pub fn ranking_cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| {
                other
                    .score
                    .partial_cmp(&self.score)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Stable identifier derived from the opportunity kind and its participants.
pub fn opportunity_id(kind: OpportunityKind, participants: &[String]) -> String {
    let mut sorted: Vec<&str> = participants.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    for slug in sorted {
        hasher.update(b"|");
        hasher.update(slug.as_bytes());
    }
    let digest = format!("{:x}", hasher.finalize());
    format!("opp_{}", &digest[..12])
}
