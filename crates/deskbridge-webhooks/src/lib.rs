//! Inbound billing webhooks.
//!
//! `POST /webhooks/billing` authenticates the caller, parses the billing
//! event envelope and reconciles the embedded customer. Engine errors map to
//! HTTP statuses: invalid input 400, directory conflicts 409, transport
//! failures 500.

pub mod error;
pub mod handlers;
pub mod router;
pub mod validation;

pub use error::{ApiResult, ErrorResponse, WebhookError};
pub use handlers::billing::process_event_body;
pub use router::{webhooks_router, WebhooksState};
pub use validation::WebhookCredentials;
