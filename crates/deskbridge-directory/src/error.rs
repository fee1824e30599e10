//! Error types for directory API calls.

use thiserror::Error;

/// Result alias used throughout the directory client.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Errors returned by the support-desk directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The directory host could not be reached.
    #[error("directory unreachable: {0}")]
    Unreachable(String),

    /// The directory asked us to back off (HTTP 429).
    #[error("rate limited by directory (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Credentials were rejected (HTTP 401/403).
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// The addressed resource does not exist (HTTP 404).
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Any other non-success HTTP status.
    #[error("directory returned HTTP {status}: {detail}")]
    Api { status: u16, detail: String },

    /// The response body could not be decoded.
    #[error("failed to parse directory response: {0}")]
    ParseError(String),

    /// The client was configured with unusable settings.
    #[error("invalid directory configuration: {0}")]
    InvalidConfig(String),

    /// A retried read gave up.
    #[error("max retries exceeded after {attempts} attempt(s): {message}")]
    MaxRetriesExceeded { attempts: u32, message: String },
}

impl DirectoryError {
    /// Whether the failure is transient (network, timeout, rate limit).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Unreachable(_) | Self::RateLimited { .. } => true,
            _ => false,
        }
    }

    /// Whether the directory answered with a 5xx status.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 500)
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(e: serde_json::Error) -> Self {
        Self::ParseError(e.to_string())
    }
}
