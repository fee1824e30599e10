//! Support-desk directory HTTP client (reqwest-based).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::auth::DirectoryCredentials;
use crate::error::{DirectoryError, DirectoryResult};
use crate::models::{
    DirectoryUser, Identity, IdentityId, IdentityListResponse, MergeRequest, MergeTarget,
    SearchQuery, UserEnvelope, UserId, UserSearchResponse,
};
use crate::retry::RetryPolicy;
use crate::traits::DirectoryApi;

/// Connection settings for a [`DirectoryClient`].
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// API root, e.g. `https://acme.zendesk.com/api/v2`.
    pub base_url: String,
    pub credentials: DirectoryCredentials,
    pub timeout: Duration,
    /// Applied to lookups only.
    pub retry: RetryPolicy,
}

impl DirectoryConfig {
    /// API root of a hosted directory account.
    #[must_use]
    pub fn hosted_base_url(subdomain: &str) -> String {
        format!("https://{subdomain}.zendesk.com/api/v2")
    }
}

/// HTTP implementation of [`DirectoryApi`].
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    base_url: String,
    credentials: DirectoryCredentials,
    http_client: Client,
    retry_policy: RetryPolicy,
}

impl DirectoryClient {
    /// Build a client with its own connection pool.
    pub fn new(config: DirectoryConfig) -> DirectoryResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(DirectoryError::InvalidConfig(
                "base URL must not be empty".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("deskbridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DirectoryError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_http_client(config.base_url, config.credentials, http_client)
            .with_retry_policy(config.retry))
    }

    /// Build a client over a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(
        base_url: String,
        credentials: DirectoryCredentials,
        http_client: Client,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            http_client,
            retry_policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn search_once(
        &self,
        query: &str,
        per_page: u32,
    ) -> DirectoryResult<Vec<DirectoryUser>> {
        let url = format!("{}/users/search.json", self.base_url);
        debug!("Directory GET {} (query={:?})", url, query);
        let response = self
            .credentials
            .apply(self.http_client.get(&url))
            .query(&[("query", query.to_string()), ("per_page", per_page.to_string())])
            .send()
            .await?;
        let body: UserSearchResponse = self.handle_response(response).await?;
        Ok(body.users)
    }

    async fn list_identities_once(&self, user_id: UserId) -> DirectoryResult<Vec<Identity>> {
        let url = format!("{}/end_users/{}/identities.json", self.base_url, user_id);
        debug!("Directory GET {}", url);
        let response = self
            .credentials
            .apply(self.http_client.get(&url))
            .send()
            .await?;
        let body: IdentityListResponse = self.handle_response(response).await?;
        Ok(body.identities)
    }

    // ── Response Handling ─────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> DirectoryResult<T> {
        if response.status().is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                DirectoryError::ParseError(format!("failed to parse response: {e}"))
            })
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    async fn error_from_response(response: reqwest::Response) -> DirectoryError {
        let status = response.status();

        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());

        match status {
            StatusCode::NOT_FOUND => DirectoryError::NotFound(body),
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Directory rate limited, retry after {:?}s", retry_after);
                DirectoryError::RateLimited {
                    retry_after_secs: retry_after,
                }
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                DirectoryError::AuthError(format!("HTTP {status}: {body}"))
            }
            _ => DirectoryError::Api {
                status: status.as_u16(),
                detail: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                },
            },
        }
    }
}

#[async_trait]
impl DirectoryApi for DirectoryClient {
    async fn search_users(
        &self,
        query: &SearchQuery,
        per_page: u32,
    ) -> DirectoryResult<Vec<DirectoryUser>> {
        let rendered = query.render();
        self.retry_policy
            .execute("search_users", || self.search_once(&rendered, per_page))
            .await
    }

    async fn create_or_update_user(&self, user: &DirectoryUser) -> DirectoryResult<DirectoryUser> {
        let url = format!("{}/users/create_or_update.json", self.base_url);
        debug!("Directory POST {} (id={:?})", url, user.id);
        let response = self
            .credentials
            .apply(self.http_client.post(&url))
            .json(&UserEnvelope { user: user.clone() })
            .send()
            .await?;
        let body: UserEnvelope = self.handle_response(response).await?;
        Ok(body.user)
    }

    async fn list_identities(&self, user_id: UserId) -> DirectoryResult<Vec<Identity>> {
        self.retry_policy
            .execute("list_identities", || self.list_identities_once(user_id))
            .await
    }

    async fn delete_identity(
        &self,
        user_id: UserId,
        identity_id: IdentityId,
    ) -> DirectoryResult<()> {
        let url = format!(
            "{}/end_users/{}/identities/{}.json",
            self.base_url, user_id, identity_id
        );
        debug!("Directory DELETE {}", url);
        let response = self
            .credentials
            .apply(self.http_client.delete(&url))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                user_id,
                identity_id, "Identity already deleted, treating as success"
            );
            Ok(())
        } else {
            Err(Self::error_from_response(response).await)
        }
    }

    async fn merge_users(&self, source: UserId, target: UserId) -> DirectoryResult<()> {
        if source == target {
            return Ok(());
        }

        let url = format!("{}/users/{}/merge.json", self.base_url, source);
        info!(source, target, "Merging directory users");
        let response = self
            .credentials
            .apply(self.http_client.put(&url))
            .header("Content-Type", "application/json")
            .json(&MergeRequest {
                user: MergeTarget { id: target },
            })
            .send()
            .await?;

        if response.status() == StatusCode::OK {
            Ok(())
        } else {
            Err(Self::error_from_response(response).await)
        }
    }
}
