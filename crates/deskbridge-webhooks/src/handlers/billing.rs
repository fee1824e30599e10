//! Billing event handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use deskbridge_billing::BillingEvent;
use deskbridge_reconcile::{ReconciliationEngine, RunResult};
use tracing::{info, warn};

use crate::error::{ApiResult, WebhookError};
use crate::router::WebhooksState;
use crate::validation::require_json;

/// Parse one event body and reconcile the customer it carries.
///
/// Shared by the HTTP endpoint and offline replay.
pub async fn process_event_body(
    engine: &ReconciliationEngine,
    body: &[u8],
) -> ApiResult<RunResult> {
    let event = BillingEvent::from_slice(body)?;
    let customer = event.customer()?;
    info!(
        event_id = %event.id,
        event_type = event.event_type.as_deref().unwrap_or("unknown"),
        occurred_at = ?event.occurred_at(),
        "Processing billing event"
    );

    engine
        .reconcile(customer, &event.id)
        .await
        .map_err(WebhookError::from)
}

/// `POST /webhooks/billing`
pub async fn billing_event_handler(
    State(state): State<WebhooksState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<RunResult>> {
    if let Some(credentials) = state.credentials() {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if let Err(e) = credentials.verify(authorization) {
            warn!("Rejected billing webhook: bad credentials");
            return Err(e);
        }
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    require_json(content_type)?;

    match process_event_body(state.engine(), &body).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            warn!(error = %e, status = e.status_code().as_u16(), "Billing event failed");
            Err(e)
        }
    }
}
