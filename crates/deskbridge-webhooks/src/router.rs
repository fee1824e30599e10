//! Axum router setup for the webhook endpoint.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use deskbridge_reconcile::ReconciliationEngine;

use crate::handlers::{billing, health};
use crate::validation::WebhookCredentials;

/// Shared state for webhook handlers.
#[derive(Clone)]
pub struct WebhooksState {
    engine: Arc<ReconciliationEngine>,
    credentials: Option<WebhookCredentials>,
}

impl WebhooksState {
    /// Without credentials, requests are accepted unauthenticated.
    pub fn new(engine: Arc<ReconciliationEngine>, credentials: Option<WebhookCredentials>) -> Self {
        Self {
            engine,
            credentials,
        }
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    pub fn credentials(&self) -> Option<&WebhookCredentials> {
        self.credentials.as_ref()
    }
}

/// Creates the webhook router with all routes.
pub fn webhooks_router(state: WebhooksState) -> Router {
    Router::new()
        .route("/webhooks/billing", post(billing::billing_event_handler))
        .route("/healthz", get(health::health_handler))
        .with_state(state)
}
