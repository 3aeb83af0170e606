pub mod opportunity;
pub mod profile;
pub mod terms;

pub use opportunity::{
    opportunity_id, Breakdown, ComplementaryPair, MatchRef, Opportunity, OpportunityKind,
    Priority, SynergyMatch,
};
pub use profile::{
    deserialize_level, duplicate_slugs, CompanyProfile, Contact, EngagementChannel, Level,
    Location, Need, Offer, ProfileRecord, Visibility,
};
pub use terms::{generate_slug, normalize_terms, slugify, tokenize};
