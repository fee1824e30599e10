//! Billing system HTTP client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{BillingError, BillingResult};
use crate::models::{CustomerFilter, CustomerListResponse, CustomerPage, CustomerRecord};

/// Customer lookups against the billing system.
#[async_trait]
pub trait BillingApi: Send + Sync {
    async fn get_customer(&self, id: &str) -> BillingResult<CustomerRecord>;

    /// One page of customers, oldest first. Pass the previous page's
    /// `next_page_token` to continue.
    async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page_token: Option<&str>,
    ) -> BillingResult<CustomerPage>;
}

/// HTTP implementation of [`BillingApi`].
///
/// Authenticates with the site API key as the Basic-auth username.
#[derive(Clone)]
pub struct BillingClient {
    base_url: String,
    api_key: String,
    http_client: Client,
}

impl std::fmt::Debug for BillingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CustomerResponse {
    customer: CustomerRecord,
}

impl BillingClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> BillingResult<Self> {
        if api_key.is_empty() {
            return Err(BillingError::InvalidConfig(
                "API key must not be empty".to_string(),
            ));
        }
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BillingError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_http_client(base_url, api_key, http_client))
    }

    /// API root of a hosted billing site.
    #[must_use]
    pub fn hosted_base_url(site: &str) -> String {
        format!("https://{site}.chargebee.com/api/v2")
    }

    #[must_use]
    pub fn with_http_client(base_url: String, api_key: String, http_client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http_client,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> BillingResult<T> {
        debug!("Billing GET {}", url);
        let response = self
            .http_client
            .get(url)
            .basic_auth(&self.api_key, Some(""))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        match status {
            s if s.is_success() => serde_json::from_str(&body)
                .map_err(|e| BillingError::ParseError(format!("failed to parse response: {e}"))),
            StatusCode::NOT_FOUND => Err(BillingError::NotFound(body)),
            _ => Err(BillingError::Api {
                status: status.as_u16(),
                detail: body,
            }),
        }
    }
}

#[async_trait]
impl BillingApi for BillingClient {
    async fn get_customer(&self, id: &str) -> BillingResult<CustomerRecord> {
        let url = format!("{}/customers/{}", self.base_url, id);
        let response: CustomerResponse = self.get_json(&url, &[]).await?;
        Ok(response.customer)
    }

    async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page_token: Option<&str>,
    ) -> BillingResult<CustomerPage> {
        let url = format!("{}/customers", self.base_url);
        let mut query = vec![
            ("limit", filter.limit.to_string()),
            ("sort_by[asc]", "created_at".to_string()),
        ];
        if let Some(email) = &filter.email {
            query.push(("email[is]", email.clone()));
        }
        if let Some(token) = page_token {
            query.push(("offset", token.to_string()));
        }

        let response: CustomerListResponse = self.get_json(&url, &query).await?;
        Ok(response.into_page())
    }
}
