//! Billing client error types.

use thiserror::Error;

pub type BillingResult<T> = Result<T, BillingError>;

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("customer not found: {0}")]
    NotFound(String),

    #[error("billing API returned HTTP {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("failed to parse billing response: {0}")]
    ParseError(String),

    /// An inbound event body that cannot be acted on.
    #[error("invalid billing payload: {0}")]
    InvalidPayload(String),

    #[error("invalid billing configuration: {0}")]
    InvalidConfig(String),
}

impl BillingError {
    /// Whether retrying the same request could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
