//! Request checks for inbound billing webhooks.
//!
//! - HTTP Basic credentials, compared in constant time
//! - JSON content type

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use subtle::ConstantTimeEq;

use crate::error::WebhookError;

// ---------------------------------------------------------------------------
// Basic auth
// ---------------------------------------------------------------------------

/// Credentials the billing system presents on every webhook call.
#[derive(Clone)]
pub struct WebhookCredentials {
    username: String,
    expected_header: String,
}

impl std::fmt::Debug for WebhookCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl WebhookCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        let username = username.into();
        let encoded = BASE64.encode(format!("{username}:{password}"));
        Self {
            username,
            expected_header: format!("Basic {encoded}"),
        }
    }

    /// Check an `Authorization` header value.
    pub fn verify(&self, authorization: Option<&str>) -> Result<(), WebhookError> {
        let presented = authorization.unwrap_or_default().trim_end();
        if constant_time_eq(presented.as_bytes(), self.expected_header.as_bytes()) {
            Ok(())
        } else {
            Err(WebhookError::Unauthorized)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

// ---------------------------------------------------------------------------
// Content type
// ---------------------------------------------------------------------------

/// Require a `Content-Type` that mentions `application/json`.
pub fn require_json(content_type: Option<&str>) -> Result<(), WebhookError> {
    match content_type {
        Some(value) if value.to_ascii_lowercase().contains("application/json") => Ok(()),
        _ => Err(WebhookError::InvalidContentType),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
