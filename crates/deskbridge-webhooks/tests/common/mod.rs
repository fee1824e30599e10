//! Test fixtures for webhook router tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use base64::Engine;
use deskbridge_directory::{
    DirectoryApi, DirectoryError, DirectoryResult, DirectoryUser, Identity, IdentityId,
    SearchQuery, UserId,
};
use deskbridge_reconcile::{EngineOptions, ReconciliationEngine};
use deskbridge_webhooks::{webhooks_router, WebhookCredentials, WebhooksState};

pub const WEBHOOK_USER: &str = "billing";
pub const WEBHOOK_PASSWORD: &str = "hook-secret";

/// Directory stub: returns fixed search results, assigns id 77 on write.
#[derive(Default)]
pub struct StubDirectory {
    pub search_results: Vec<DirectoryUser>,
    pub fail_search: bool,
    pub writes: Mutex<Vec<DirectoryUser>>,
}

#[async_trait]
impl DirectoryApi for StubDirectory {
    async fn search_users(
        &self,
        _query: &SearchQuery,
        _per_page: u32,
    ) -> DirectoryResult<Vec<DirectoryUser>> {
        if self.fail_search {
            return Err(DirectoryError::Unreachable("directory down".to_string()));
        }
        Ok(self.search_results.clone())
    }

    async fn create_or_update_user(&self, user: &DirectoryUser) -> DirectoryResult<DirectoryUser> {
        self.writes.lock().unwrap().push(user.clone());
        let mut stored = user.clone();
        stored.id = stored.id.or(Some(77));
        Ok(stored)
    }

    async fn list_identities(&self, _user_id: UserId) -> DirectoryResult<Vec<Identity>> {
        Ok(Vec::new())
    }

    async fn delete_identity(&self, _user_id: UserId, _identity_id: IdentityId) -> DirectoryResult<()> {
        Ok(())
    }

    async fn merge_users(&self, _source: UserId, _target: UserId) -> DirectoryResult<()> {
        Ok(())
    }
}

pub fn app(directory: Arc<StubDirectory>, with_auth: bool) -> axum::Router {
    let engine = Arc::new(ReconciliationEngine::new(directory, EngineOptions::default()));
    let credentials = with_auth.then(|| WebhookCredentials::new(WEBHOOK_USER, WEBHOOK_PASSWORD));
    webhooks_router(WebhooksState::new(engine, credentials))
}

pub fn basic_auth_header(user: &str, password: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"));
    format!("Basic {encoded}")
}

pub fn event_body() -> String {
    serde_json::json!({
        "id": "ev_100",
        "event_type": "customer_changed",
        "occurred_at": 1_700_000_000,
        "content": {
            "customer": {
                "id": "C1",
                "email": "a@b.com",
                "first_name": "jane",
                "last_name": "doe",
                "phone": "0400 000 000"
            }
        }
    })
    .to_string()
}

pub fn post_event(body: String, authorization: Option<String>, content_type: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/billing")
        .header("content-type", content_type);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    builder.body(Body::from(body)).unwrap()
}
