//! Term normalization shared by profiles, the term index and tier predicates.

use std::collections::BTreeSet;

use rand::{distributions::Alphanumeric, Rng};

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "or", "to", "of", "in", "on", "for", "with", "the", "this", "that", "by",
    "from", "via", "our", "we", "us", "is", "are", "be", "as", "at", "it", "its", "into",
];

const SLUG_FALLBACK_PREFIX: &str = "company";
const SLUG_FALLBACK_LEN: usize = 8;
const MISSION_KEYWORD_MIN_LEN: usize = 4;

/// Lowercase ASCII slug with non-alphanumeric runs collapsed to one hyphen.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Slug for `name`, or a random `company-xxxxxxxx` identifier when the name
/// normalizes to nothing.
pub fn generate_slug(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        random_slug()
    } else {
        slug
    }
}

fn random_slug() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SLUG_FALLBACK_LEN)
        .map(|_| rng.sample(Alphanumeric) as char)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    format!("{SLUG_FALLBACK_PREFIX}-{suffix}")
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}

/// Lowercased, trimmed, whole-term normalization (tags, capabilities).
pub fn normalize_term(term: &str) -> Option<String> {
    let normalized = term.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Sorted, de-duplicated normalized terms.
pub fn normalize_terms<I, S>(terms: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    terms
        .into_iter()
        .filter_map(|term| normalize_term(term.as_ref()))
        .collect()
}

/// Splits free text into lowercase word tokens, dropping stop words and
/// single characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|word| word.to_lowercase())
        .filter(|token| token.chars().count() >= 2 && !STOP_WORDS.contains(&token.as_str()))
        .collect()
}

pub fn tokenize_into(text: &str, buf: &mut BTreeSet<String>) {
    buf.extend(tokenize(text));
}

pub fn mission_keywords(mission: Option<&str>) -> BTreeSet<String> {
    mission
        .map(tokenize)
        .unwrap_or_default()
        .into_iter()
        .filter(|token| token.chars().count() >= MISSION_KEYWORD_MIN_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_runs_and_trims() {
        assert_eq!(slugify("  Aqua Reach!! Co. "), "aqua-reach-co");
        assert_eq!(slugify("Grid--Wise__Labs"), "grid-wise-labs");
        assert_eq!(slugify("Café Ünïcode"), "caf-n-code");
    }

    #[test]
    fn generate_slug_is_deterministic_for_real_names() {
        assert_eq!(generate_slug("Grid Wise"), generate_slug("Grid Wise"));
        assert_eq!(generate_slug("Grid Wise"), "grid-wise");
    }

    #[test]
    fn generate_slug_falls_back_for_empty_names() {
        for name in ["", "   ", "!!!", "日本"] {
            let slug = generate_slug(name);
            assert!(slug.starts_with("company-"), "unexpected slug {slug}");
            assert_eq!(slug.len(), "company-".len() + 8);
            assert!(is_valid_slug(&slug));
        }
    }

    #[test]
    fn tokenize_drops_stop_words_and_short_tokens() {
        assert_eq!(
            tokenize("Power storage for the grid & a EV"),
            vec!["power", "storage", "grid", "ev"]
        );
    }

    #[test]
    fn mission_keywords_keep_longer_tokens() {
        let keywords = mission_keywords(Some("Clean water for every town"));
        assert!(keywords.contains("clean"));
        assert!(keywords.contains("water"));
        assert!(!keywords.contains("for"));
        assert!(mission_keywords(None).is_empty());
    }

    #[test]
    fn normalize_terms_dedupes_case_insensitively() {
        let terms = normalize_terms(["Energy", " energy ", "", "Water"]);
        assert_eq!(terms.into_iter().collect::<Vec<_>>(), vec!["energy", "water"]);
    }
}
