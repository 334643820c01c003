//! Core data models used throughout Reachr.
//!
//! [`Contact`] and [`UserPreferences`] are the two persisted documents.
//! [`SearchResult`] and [`TagEntry`] are derived on every request and never
//! stored.

use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Priority assigned to contacts that never had one set.
pub const DEFAULT_PRIORITY: i32 = 50;

const MAX_USER_ID_LEN: usize = 128;

/// Identity of the acting user, as resolved by the request layer.
///
/// `Anonymous` is a real user with its own storage namespace: the shared,
/// pre-authentication collection that accounts migrate from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UserId {
    Anonymous,
    Account(String),
}

impl UserId {
    /// Parse and validate a user id.
    ///
    /// Account ids become directory names in the file backend, so only
    /// `[A-Za-z0-9._@-]` is accepted and a leading `.` is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("anonymous") {
            return Ok(UserId::Anonymous);
        }
        if raw.len() > MAX_USER_ID_LEN {
            return Err(Error::InvalidInput(format!(
                "user id longer than {MAX_USER_ID_LEN} characters"
            )));
        }
        if raw.starts_with('.')
            || !raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-'))
        {
            return Err(Error::InvalidInput(format!("malformed user id: {raw}")));
        }
        Ok(UserId::Account(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            UserId::Anonymous => "anonymous",
            UserId::Account(id) => id,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, UserId::Anonymous)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        UserId::parse(s)
    }
}

/// One entry in a user's address book.
///
/// The JSON shape is shared with the legacy collection, so unknown fields
/// are ignored and `null` lists or priorities fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    #[serde(default, alias = "user_id")]
    pub owner_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub raw_context: Option<String>,
    #[serde(default)]
    pub met_date: Option<String>,
    #[serde(default)]
    pub meeting_location: Option<String>,
    #[serde(default = "default_priority", deserialize_with = "null_as_default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

fn null_as_empty<'de, D>(d: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(d)?.unwrap_or_default())
}

fn null_as_default_priority<'de, D>(d: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i32>::deserialize(d)?.unwrap_or(DEFAULT_PRIORITY))
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH bodies.
fn explicit<'de, D, T>(d: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

/// Caller-supplied fields for a new contact. Id and timestamps are assigned
/// by the Record Store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub raw_context: Option<String>,
    #[serde(default)]
    pub met_date: Option<String>,
    #[serde(default)]
    pub meeting_location: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
}

impl NewContact {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build the stored record. Fails if the trimmed name is empty.
    pub(crate) fn into_contact(self, id: String, owner: &UserId, now: &str) -> Result<Contact> {
        let name = validate_name(&self.name)?;
        Ok(Contact {
            id,
            owner_id: Some(owner.as_str().to_string()),
            name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            role: self.role,
            industry: self.industry,
            location: self.location,
            linkedin_url: self.linkedin_url,
            tags: clean_tags(self.tags),
            raw_context: self.raw_context,
            met_date: self.met_date,
            meeting_location: self.meeting_location,
            priority: self.priority.unwrap_or(DEFAULT_PRIORITY),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        })
    }
}

/// Partial update. Only fields present in the request are touched; an
/// explicit `null` clears an optional field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub role: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub industry: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub linkedin_url: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub raw_context: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub met_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "explicit")]
    pub meeting_location: Option<Option<String>>,
    #[serde(default)]
    pub priority: Option<i32>,
}

impl ContactPatch {
    /// Merge the supplied fields into `contact`. Validation happens before
    /// any field is written, so a rejected patch leaves the record as it was.
    pub(crate) fn apply_to(self, contact: &mut Contact) -> Result<()> {
        let name = match self.name {
            Some(ref name) => Some(validate_name(name)?),
            None => None,
        };

        if let Some(name) = name {
            contact.name = name;
        }
        set(&mut contact.email, self.email);
        set(&mut contact.phone, self.phone);
        set(&mut contact.company, self.company);
        set(&mut contact.role, self.role);
        set(&mut contact.industry, self.industry);
        set(&mut contact.location, self.location);
        set(&mut contact.linkedin_url, self.linkedin_url);
        if let Some(tags) = self.tags {
            contact.tags = clean_tags(tags);
        }
        set(&mut contact.raw_context, self.raw_context);
        set(&mut contact.met_date, self.met_date);
        set(&mut contact.meeting_location, self.meeting_location);
        if let Some(priority) = self.priority {
            contact.priority = priority;
        }
        Ok(())
    }
}

fn set(field: &mut Option<String>, value: Option<Option<String>>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("contact name must not be empty".into()));
    }
    Ok(name.to_string())
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter().filter(|t| !t.trim().is_empty()).collect()
}

/// Optional narrowing for `list_contacts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactFilter {
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ContactFilter {
    /// Case-insensitive exact match on industry and location, then truncate.
    ///
    /// Empty filter values and a `limit` of 0 mean "no constraint", the same
    /// as leaving them out of the query string.
    pub fn apply(&self, contacts: Vec<Contact>) -> Vec<Contact> {
        let mut out: Vec<Contact> = contacts
            .into_iter()
            .filter(|c| field_equals(c.industry.as_deref(), self.industry.as_deref()))
            .filter(|c| field_equals(c.location.as_deref(), self.location.as_deref()))
            .collect();
        if let Some(limit) = self.limit.filter(|&n| n > 0) {
            out.truncate(limit);
        }
        out
    }
}

fn field_equals(value: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted.filter(|w| !w.is_empty()) {
        None => true,
        Some(wanted) => value.is_some_and(|v| v.to_lowercase() == wanted.to_lowercase()),
    }
}

/// Per-user industry selection and tag lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub custom_tags: Vec<String>,
    #[serde(default)]
    pub suggested_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Body of `set_preferences`. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub custom_tags: Option<Vec<String>>,
}

/// A contact paired with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub contact: Contact,
    pub score: u32,
    #[serde(rename = "matchReason")]
    pub match_reason: String,
}

/// Where an autocomplete tag came from, in descending priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagSource {
    Custom,
    Suggested,
    Contact,
    Default,
}

/// One autocomplete item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    pub tag: String,
    pub count: usize,
    pub source: TagSource,
}

/// Current time as an RFC 3339 UTC string with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
