use std::collections::{BTreeMap, BTreeSet};

use crate::models::CompanyProfile;

/// Which side of a need/offer exchange a term was indexed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermRole {
    Seeking,
    Providing,
}

/// Inverted index from normalized terms to the slugs exposing them.
///
/// Always rebuilt from a full profile set; there is no incremental patching.
#[derive(Debug, Clone, Default)]
pub struct TermIndex {
    seeking: BTreeMap<String, BTreeSet<String>>,
    providing: BTreeMap<String, BTreeSet<String>>,
}

impl TermIndex {
    pub fn build<'a, I>(profiles: I) -> Self
    where
        I: IntoIterator<Item = &'a CompanyProfile>,
    {
        let mut index = Self::default();
        for profile in profiles {
            for term in profile.seeking_terms() {
                index
                    .seeking
                    .entry(term)
                    .or_default()
                    .insert(profile.slug.clone());
            }
            for term in profile.providing_terms() {
                index
                    .providing
                    .entry(term)
                    .or_default()
                    .insert(profile.slug.clone());
            }
        }
        index
    }

    pub fn is_empty(&self) -> bool {
        self.seeking.is_empty() && self.providing.is_empty()
    }

    pub fn term_count(&self, role: TermRole) -> usize {
        self.table(role).len()
    }

    /// Slugs indexed under `term` for `role`, in slug order.
    pub fn lookup(&self, role: TermRole, term: &str) -> Vec<&str> {
        self.table(role)
            .get(term)
            .map(|slugs| slugs.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn seekers(&self, term: &str) -> Vec<&str> {
        self.lookup(TermRole::Seeking, term)
    }

    pub fn providers(&self, term: &str) -> Vec<&str> {
        self.lookup(TermRole::Providing, term)
    }

    /// Companies whose providing terms intersect the seeking terms of
    /// `seeker`. The seeker itself is never a candidate.
    pub fn provider_candidates(&self, seeker: &CompanyProfile) -> BTreeSet<String> {
        let mut candidates = BTreeSet::new();
        for term in seeker.seeking_terms() {
            if let Some(slugs) = self.providing.get(&term) {
                candidates.extend(slugs.iter().filter(|slug| **slug != seeker.slug).cloned());
            }
        }
        candidates
    }

    fn table(&self, role: TermRole) -> &BTreeMap<String, BTreeSet<String>> {
        match role {
            TermRole::Seeking => &self.seeking,
            TermRole::Providing => &self.providing,
        }
    }
}
