//! Canonical company profile plus its needs (plugin points), offers (plugs)
//! and contacts.
//!
//! Profiles arrive as loosely-shaped JSON from an external system of record.
//! [`ProfileRecord`] mirrors that wire shape and [`CompanyProfile::from_record`]
//! performs every validation step, so a `CompanyProfile` in hand is always
//! well-formed.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::terms::{
    generate_slug, is_valid_slug, mission_keywords, normalize_term, normalize_terms, slugify,
    tokenize_into,
};
use crate::error::{Result, SynergyError};

/// Urgency of a need or capacity behind an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Low,
    Med,
    High,
}

impl Default for Level {
    fn default() -> Self {
        Level::Med
    }
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "LOW",
            Level::Med => "MED",
            Level::High => "HIGH",
        }
    }

    pub fn from_value(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Level::Low),
            "MED" | "MEDIUM" => Ok(Level::Med),
            "HIGH" => Ok(Level::High),
            other => Err(SynergyError::validation(format!(
                "unrecognized level `{other}`; expected LOW, MED or HIGH"
            ))),
        }
    }

    /// Maps a 1-5 score onto the three levels.
    pub fn from_score(score: i64) -> Result<Self> {
        match score {
            1 | 2 => Ok(Level::Low),
            3 => Ok(Level::Med),
            4 | 5 => Ok(Level::High),
            other => Err(SynergyError::validation(format!(
                "level score {other} is outside 1-5"
            ))),
        }
    }

    fn from_input(input: Option<&LevelInput>) -> Result<Self> {
        match input {
            None => Ok(Level::default()),
            Some(LevelInput::Text(text)) => Level::from_value(text),
            Some(LevelInput::Score(score)) => Level::from_score(*score),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    Public,
    Partner,
    Private,
}

impl Visibility {
    pub fn from_value(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PUBLIC" => Ok(Visibility::Public),
            "PARTNER" => Ok(Visibility::Partner),
            "PRIVATE" => Ok(Visibility::Private),
            other => Err(SynergyError::validation(format!(
                "unrecognized visibility `{other}`; expected PUBLIC, PARTNER or PRIVATE"
            ))),
        }
    }

    fn from_input(input: Option<&str>, default: Visibility) -> Result<Self> {
        input.map(Visibility::from_value).unwrap_or(Ok(default))
    }
}

/// Channels through which companies coordinate. Closed set: unknown values
/// are an error, never coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementChannel {
    Product,
    Service,
    Knowledge,
    SocialImpact,
    Funding,
    Talent,
    Technology,
    Operations,
    Sales,
    Research,
}

impl EngagementChannel {
    pub const ALL: [EngagementChannel; 10] = [
        EngagementChannel::Product,
        EngagementChannel::Service,
        EngagementChannel::Knowledge,
        EngagementChannel::SocialImpact,
        EngagementChannel::Funding,
        EngagementChannel::Talent,
        EngagementChannel::Technology,
        EngagementChannel::Operations,
        EngagementChannel::Sales,
        EngagementChannel::Research,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementChannel::Product => "product",
            EngagementChannel::Service => "service",
            EngagementChannel::Knowledge => "knowledge",
            EngagementChannel::SocialImpact => "social_impact",
            EngagementChannel::Funding => "funding",
            EngagementChannel::Talent => "talent",
            EngagementChannel::Technology => "technology",
            EngagementChannel::Operations => "operations",
            EngagementChannel::Sales => "sales",
            EngagementChannel::Research => "research",
        }
    }

    /// Parses a channel name, accepting any case and space/hyphen separators.
    pub fn from_value(value: &str) -> Result<Self> {
        let key = value.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|channel| channel.as_str() == key)
            .ok_or_else(|| {
                let accepted = Self::ALL
                    .iter()
                    .map(|channel| channel.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                SynergyError::validation(format!(
                    "unrecognized engagement channel `{value}`; expected one of: {accepted}"
                ))
            })
    }

    pub fn parse_all<I, S>(values: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut channels = Vec::new();
        for value in values {
            let channel = Self::from_value(value.as_ref())?;
            if !channels.contains(&channel) {
                channels.push(channel);
            }
        }
        Ok(channels)
    }
}

impl fmt::Display for EngagementChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
    pub name: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub privacy_level: Visibility,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: None,
            email: None,
            phone: None,
            privacy_level: Visibility::Private,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// A contact is reachable when it carries an email or phone number.
    pub fn is_reachable(&self) -> bool {
        non_blank(self.email.as_deref()) || non_blank(self.phone.as_deref())
    }
}

/// A capability gap the company wants filled (plugin point).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Need {
    pub title: String,
    pub description: Option<String>,
    pub tags: BTreeSet<String>,
    pub urgency: Level,
    pub visibility: Visibility,
    pub engagement_channels: Vec<EngagementChannel>,
}

impl Need {
    pub fn new(title: impl Into<String>, urgency: Level) -> Self {
        Self {
            title: title.into(),
            description: None,
            tags: BTreeSet::new(),
            urgency,
            visibility: Visibility::Partner,
            engagement_channels: Vec::new(),
        }
    }

    pub fn tagged<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.extend(normalize_terms(tags));
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn terms(&self) -> BTreeSet<String> {
        item_terms(&self.title, self.description.as_deref(), &self.tags)
    }
}

/// A capability the company can supply (plug).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offer {
    pub title: String,
    pub description: Option<String>,
    pub tags: BTreeSet<String>,
    pub capacity: Level,
    pub visibility: Visibility,
    pub engagement_channels: Vec<EngagementChannel>,
}

impl Offer {
    pub fn new(title: impl Into<String>, capacity: Level) -> Self {
        Self {
            title: title.into(),
            description: None,
            tags: BTreeSet::new(),
            capacity,
            visibility: Visibility::Partner,
            engagement_channels: Vec::new(),
        }
    }

    pub fn tagged<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.extend(normalize_terms(tags));
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn terms(&self) -> BTreeSet<String> {
        item_terms(&self.title, self.description.as_deref(), &self.tags)
    }
}

fn item_terms(title: &str, description: Option<&str>, tags: &BTreeSet<String>) -> BTreeSet<String> {
    let mut terms = tags.clone();
    tokenize_into(title, &mut terms);
    if let Some(description) = description {
        tokenize_into(description, &mut terms);
    }
    terms
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyProfile {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub mission: Option<String>,
    pub organization_type: Option<String>,
    pub region: Option<String>,
    pub location: Option<Location>,
    pub capabilities: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub engagement_channels: Vec<EngagementChannel>,
    pub needs: Vec<Need>,
    pub offers: Vec<Offer>,
    pub contacts: Vec<Contact>,
}

impl CompanyProfile {
    /// Minimal profile with a slug derived from `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            slug: generate_slug(&name),
            name,
            description: None,
            mission: None,
            organization_type: None,
            region: None,
            location: None,
            capabilities: BTreeSet::new(),
            tags: BTreeSet::new(),
            engagement_channels: Vec::new(),
            needs: Vec::new(),
            offers: Vec::new(),
            contacts: Vec::new(),
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_mission(mut self, mission: impl Into<String>) -> Self {
        self.mission = Some(mission.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.capabilities.extend(normalize_terms(capabilities));
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.extend(normalize_terms(tags));
        self
    }

    pub fn with_need(mut self, need: Need) -> Self {
        push_unique_need(&mut self.needs, need);
        self
    }

    pub fn with_offer(mut self, offer: Offer) -> Self {
        push_unique_offer(&mut self.offers, offer);
        self
    }

    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contacts.push(contact);
        self
    }

    /// Parses and validates a profile from its JSON wire form.
    pub fn from_value(value: &Value) -> Result<Self> {
        let record = ProfileRecord::deserialize(value)
            .map_err(|err| SynergyError::validation(format!("malformed profile: {err}")))?;
        Self::from_record(record)
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(data)
            .map_err(|err| SynergyError::validation(format!("profile is not valid JSON: {err}")))?;
        Self::from_value(&value)
    }

    pub fn from_record(record: ProfileRecord) -> Result<Self> {
        let name = blank_to_none(record.name);
        let raw_slug = blank_to_none(record.slug);
        let (slug, name) = match (raw_slug, name) {
            (None, None) => {
                return Err(SynergyError::validation(
                    "profile requires at least one of `slug` or `name`",
                ))
            }
            (Some(slug), name) => {
                let normalized = slugify(&slug);
                if normalized.is_empty() {
                    return Err(SynergyError::validation(format!(
                        "slug `{slug}` does not contain any ASCII alphanumerics"
                    )));
                }
                let name = name.unwrap_or_else(|| slug.trim().to_string());
                (normalized, name)
            }
            (None, Some(name)) => (generate_slug(&name), name),
        };

        let context = |err: SynergyError| match err {
            SynergyError::Validation(message) => {
                SynergyError::validation(format!("profile `{slug}`: {message}"))
            }
            other => other,
        };

        let mut needs = Vec::new();
        for need in record.needs {
            push_unique_need(&mut needs, need.into_need().map_err(context)?);
        }
        let mut offers = Vec::new();
        for offer in record.offers {
            push_unique_offer(&mut offers, offer.into_offer().map_err(context)?);
        }
        let contacts = record
            .contacts
            .into_iter()
            .map(ContactRecord::into_contact)
            .collect::<Result<Vec<_>>>()
            .map_err(context)?;
        let engagement_channels =
            EngagementChannel::parse_all(&record.engagement_channels).map_err(context)?;

        Ok(Self {
            slug,
            name,
            description: blank_to_none(record.description),
            mission: blank_to_none(record.mission),
            organization_type: blank_to_none(record.organization_type),
            region: blank_to_none(record.region),
            location: record.location,
            capabilities: normalize_terms(&record.capabilities),
            tags: normalize_terms(&record.tags),
            engagement_channels,
            needs,
            offers,
            contacts,
        })
    }

    /// Normalized, de-duplicated need titles.
    pub fn plugin_points(&self) -> Vec<String> {
        normalize_terms(self.needs.iter().map(|need| need.title.as_str()))
            .into_iter()
            .collect()
    }

    /// Normalized, de-duplicated offer titles.
    pub fn plugs(&self) -> Vec<String> {
        normalize_terms(self.offers.iter().map(|offer| offer.title.as_str()))
            .into_iter()
            .collect()
    }

    /// Every normalized term the profile exposes. Empty fields contribute
    /// nothing.
    pub fn vectorize(&self) -> Vec<String> {
        self.term_set().into_iter().collect()
    }

    pub fn term_set(&self) -> BTreeSet<String> {
        let mut terms = BTreeSet::new();
        tokenize_into(&self.name, &mut terms);
        if let Some(mission) = &self.mission {
            tokenize_into(mission, &mut terms);
        }
        terms.extend(self.capabilities.iter().cloned());
        terms.extend(self.tags.iter().cloned());
        for need in &self.needs {
            terms.extend(need.terms());
        }
        for offer in &self.offers {
            terms.extend(offer.terms());
        }
        terms
    }

    /// Union of all need terms (the seeking role).
    pub fn seeking_terms(&self) -> BTreeSet<String> {
        self.needs.iter().flat_map(|need| need.terms()).collect()
    }

    /// Union of offer terms and capabilities (the providing role). Empty when
    /// the company offers nothing.
    pub fn providing_terms(&self) -> BTreeSet<String> {
        if self.offers.is_empty() {
            return BTreeSet::new();
        }
        let mut terms: BTreeSet<String> =
            self.offers.iter().flat_map(|offer| offer.terms()).collect();
        terms.extend(self.capabilities.iter().cloned());
        terms
    }

    pub fn mission_keywords(&self) -> BTreeSet<String> {
        mission_keywords(self.mission.as_deref())
    }

    pub fn has_reachable_contact(&self) -> bool {
        self.contacts.iter().any(Contact::is_reachable)
    }

    pub fn effective_region(&self) -> Option<&str> {
        self.region
            .as_deref()
            .or_else(|| self.location.as_ref().and_then(|loc| loc.region.as_deref()))
    }

    /// Resolves the slug for storage: normalizes a supplied slug, derives one
    /// from the name otherwise.
    pub(crate) fn resolve_slug(&mut self) -> Result<&str> {
        if is_valid_slug(&self.slug) {
            return Ok(&self.slug);
        }
        let normalized = slugify(&self.slug);
        if !normalized.is_empty() {
            self.slug = normalized;
            return Ok(&self.slug);
        }
        if self.name.trim().is_empty() {
            return Err(SynergyError::validation(
                "profile requires at least one of `slug` or `name`",
            ));
        }
        self.slug = generate_slug(&self.name);
        Ok(&self.slug)
    }
}

fn push_unique_need(needs: &mut Vec<Need>, need: Need) {
    let key = normalize_term(&need.title);
    if !needs.iter().any(|existing| normalize_term(&existing.title) == key) {
        needs.push(need);
    }
}

fn push_unique_offer(offers: &mut Vec<Offer>, offer: Offer) {
    let key = normalize_term(&offer.title);
    if !offers.iter().any(|existing| normalize_term(&existing.title) == key) {
        offers.push(offer);
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn non_blank(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses a level the way profile records do: any case, `MEDIUM`, or a 1-5
/// score. Missing or `null` means the default level.
pub fn deserialize_level<'de, D>(deserializer: D) -> std::result::Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    let input = Option::<LevelInput>::deserialize(deserializer)?;
    Level::from_input(input.as_ref()).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LevelInput {
    Text(String),
    Score(i64),
}

/// Wire shape of a profile. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mission: Option<String>,
    #[serde(default)]
    pub organization_type: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, alias = "headquarters")]
    pub location: Option<Location>,
    #[serde(default, alias = "expertise", deserialize_with = "null_as_default")]
    pub capabilities: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub engagement_channels: Vec<String>,
    #[serde(default, alias = "plugin_points", deserialize_with = "null_as_default")]
    pub needs: Vec<NeedRecord>,
    #[serde(
        default,
        alias = "offerings",
        alias = "plugs",
        deserialize_with = "null_as_default"
    )]
    pub offers: Vec<OfferRecord>,
    #[serde(default, alias = "key_contacts", deserialize_with = "null_as_default")]
    pub contacts: Vec<ContactRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NeedRecord {
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub urgency: Option<LevelInput>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub engagement_channels: Vec<String>,
}

impl NeedRecord {
    fn into_need(self) -> Result<Need> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(SynergyError::validation("need title must not be empty"));
        }
        Ok(Need {
            title,
            description: blank_to_none(self.description),
            tags: normalize_terms(&self.tags),
            urgency: Level::from_input(self.urgency.as_ref())?,
            visibility: Visibility::from_input(self.visibility.as_deref(), Visibility::Partner)?,
            engagement_channels: EngagementChannel::parse_all(&self.engagement_channels)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfferRecord {
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, alias = "maturity")]
    pub capacity: Option<LevelInput>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub engagement_channels: Vec<String>,
}

impl OfferRecord {
    fn into_offer(self) -> Result<Offer> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(SynergyError::validation("offer title must not be empty"));
        }
        Ok(Offer {
            title,
            description: blank_to_none(self.description),
            tags: normalize_terms(&self.tags),
            capacity: Level::from_input(self.capacity.as_ref())?,
            visibility: Visibility::from_input(self.visibility.as_deref(), Visibility::Partner)?,
            engagement_channels: EngagementChannel::parse_all(&self.engagement_channels)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "title")]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, alias = "privacyLevel")]
    pub privacy_level: Option<String>,
}

impl ContactRecord {
    fn into_contact(self) -> Result<Contact> {
        let name = blank_to_none(self.name)
            .ok_or_else(|| SynergyError::validation("contact name is required"))?;
        Ok(Contact {
            name,
            role: blank_to_none(self.role),
            email: blank_to_none(self.email),
            phone: blank_to_none(self.phone),
            privacy_level: Visibility::from_input(
                self.privacy_level.as_deref(),
                Visibility::Private,
            )?,
        })
    }
}

/// Slugs of `profiles` that appear more than once, in first-seen order.
pub fn duplicate_slugs(profiles: &[CompanyProfile]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for profile in profiles {
        if !seen.insert(profile.slug.as_str()) && !duplicates.contains(&profile.slug) {
            duplicates.push(profile.slug.clone());
        }
    }
    duplicates
}
