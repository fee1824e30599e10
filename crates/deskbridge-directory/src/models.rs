//! Wire models for the support-desk directory API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric handle the directory assigns to a user.
pub type UserId = i64;

/// Numeric handle the directory assigns to a user identity.
pub type IdentityId = i64;

/// Identity type for phone numbers.
pub const PHONE_NUMBER_IDENTITY: &str = "phone_number";

/// Roles that mark staff accounts. These are never modified from billing data.
pub const PRIVILEGED_ROLES: [&str; 2] = ["admin", "agent"];

/// A user record held by the directory.
///
/// `id` is `None` until the directory has created the record. `role` is read
/// from the directory but never sent back on writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub verified: bool,

    #[serde(default, skip_serializing)]
    pub role: Option<String>,
}

impl DirectoryUser {
    /// Whether this account belongs to staff (`admin` or `agent`).
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        self.role
            .as_deref()
            .is_some_and(|role| PRIVILEGED_ROLES.contains(&role))
    }

    /// Phone on record, or the empty string.
    #[must_use]
    pub fn phone_or_empty(&self) -> &str {
        self.phone.as_deref().unwrap_or_default()
    }

    /// External id on record, or the empty string.
    #[must_use]
    pub fn external_id_or_empty(&self) -> &str {
        self.external_id.as_deref().unwrap_or_default()
    }
}

/// A secondary contact method attached to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,

    #[serde(default)]
    pub user_id: Option<UserId>,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub primary: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identity {
    /// Whether this identity is a phone number (type compared case-insensitively).
    #[must_use]
    pub fn is_phone_number(&self) -> bool {
        self.kind.eq_ignore_ascii_case(PHONE_NUMBER_IDENTITY)
    }
}

/// `{"user": {...}}` envelope used for single-user requests and responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEnvelope {
    pub user: DirectoryUser,
}

/// Response body of the user search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSearchResponse {
    #[serde(default)]
    pub users: Vec<DirectoryUser>,
    #[serde(default)]
    pub count: Option<u64>,
}

/// Response body of the identity listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityListResponse {
    #[serde(default)]
    pub identities: Vec<Identity>,
}

/// Body of the merge request: names the user that survives.
#[derive(Debug, Clone, Serialize)]
pub struct MergeRequest {
    pub user: MergeTarget,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeTarget {
    pub id: UserId,
}

/// A user search.
///
/// Email searches use the directory's structured `type:user email:"..."`
/// syntax; external id searches send the raw token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Email(String),
    ExternalId(String),
}

impl SearchQuery {
    /// Render the query string sent to the directory.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Email(email) => format!("type:user email:\"{}\"", escape_quoted(email)),
            Self::ExternalId(token) => token.clone(),
        }
    }

    /// Short label used in logs and error messages.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Email(email) => format!("email:{email}"),
            Self::ExternalId(token) => format!("external_id:{token}"),
        }
    }
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
