//! Directory authentication: API token sent as HTTP Basic credentials.

use base64::Engine;
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;

/// API token credentials for the directory.
///
/// The directory expects `"<username>/token:<api_token>"` as Basic credentials.
/// The [`Debug`] impl redacts the token.
#[derive(Clone)]
pub struct DirectoryCredentials {
    username: String,
    api_token: String,
}

impl std::fmt::Debug for DirectoryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryCredentials")
            .field("username", &self.username)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl DirectoryCredentials {
    #[must_use]
    pub fn new(username: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_token: api_token.into(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Full `Authorization` header value.
    #[must_use]
    pub fn header_value(&self) -> String {
        let raw = format!("{}/token:{}", self.username, self.api_token);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }

    /// Apply the credentials to a request.
    #[must_use]
    pub fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(AUTHORIZATION, self.header_value())
    }
}
