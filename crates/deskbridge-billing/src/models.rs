//! Billing customer records and webhook event envelopes.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BillingError, BillingResult};

/// A customer as held by the billing system of record.
///
/// Only the fields used for directory reconciliation are kept; anything else
/// in the payload is ignored. Missing text fields decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
}

/// Webhook event as delivered by the billing system.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingEvent {
    pub id: String,
    #[serde(default)]
    pub event_type: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub occurred_at: Option<i64>,
    #[serde(default)]
    pub content: EventContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventContent {
    #[serde(default)]
    pub customer: Option<CustomerRecord>,
}

impl BillingEvent {
    /// Decode an event body.
    pub fn from_slice(body: &[u8]) -> BillingResult<Self> {
        serde_json::from_slice(body)
            .map_err(|e| BillingError::InvalidPayload(format!("invalid event: {e}")))
    }

    /// The customer carried by the event.
    pub fn customer(&self) -> BillingResult<&CustomerRecord> {
        self.content
            .customer
            .as_ref()
            .ok_or_else(|| BillingError::InvalidPayload("event has no customer".to_string()))
    }

    #[must_use]
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        self.occurred_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}

/// Filter for customer listing.
#[derive(Debug, Clone)]
pub struct CustomerFilter {
    /// Exact email match.
    pub email: Option<String>,
    /// Page size.
    pub limit: u32,
}

impl Default for CustomerFilter {
    fn default() -> Self {
        Self {
            email: None,
            limit: 100,
        }
    }
}

/// One page of customers plus the token for the next page.
#[derive(Debug, Clone, Default)]
pub struct CustomerPage {
    pub customers: Vec<CustomerRecord>,
    pub next_page_token: Option<String>,
}

/// Raw list response: `{"list": [{"customer": {...}}], "next_offset": "..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct CustomerListResponse {
    #[serde(default)]
    pub list: Vec<CustomerEntry>,
    #[serde(default)]
    pub next_offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CustomerEntry {
    pub customer: CustomerRecord,
}

impl CustomerListResponse {
    pub(crate) fn into_page(self) -> CustomerPage {
        CustomerPage {
            customers: self.list.into_iter().map(|e| e.customer).collect(),
            next_page_token: self.next_offset.filter(|o| !o.is_empty()),
        }
    }
}
