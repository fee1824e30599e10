//! Billing system of record: customer records, paged listing and the webhook
//! event envelope that carries a customer payload.

pub mod client;
pub mod error;
pub mod models;

pub use client::{BillingApi, BillingClient};
pub use error::{BillingError, BillingResult};
pub use models::{BillingEvent, CustomerFilter, CustomerPage, CustomerRecord};
