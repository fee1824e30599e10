//! Error types for the webhook endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use deskbridge_billing::BillingError;
use deskbridge_reconcile::ReconcileError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("authentication failed")]
    Unauthorized,

    #[error("invalid content type, expected application/json")]
    InvalidContentType,

    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl From<BillingError> for WebhookError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvalidPayload(detail) => Self::Validation(detail),
            other => Self::Validation(other.to_string()),
        }
    }
}

/// JSON error response returned by the webhook endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
}

impl WebhookError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidContentType | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Reconcile(err) => match err {
                ReconcileError::Validation(_) => StatusCode::BAD_REQUEST,
                ReconcileError::AmbiguousDirectoryState { .. }
                | ReconcileError::MergeFailed { .. } => StatusCode::CONFLICT,
                ReconcileError::Transport { .. } | ReconcileError::Cancelled { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidContentType => "invalid_content_type",
            Self::Validation(_) => "validation_error",
            Self::Reconcile(err) => match err {
                ReconcileError::Validation(_) => "validation_error",
                ReconcileError::AmbiguousDirectoryState { .. } => "ambiguous_directory_state",
                ReconcileError::MergeFailed { .. } => "merge_failed",
                ReconcileError::Transport { .. } => "transport_error",
                ReconcileError::Cancelled { .. } => "cancelled",
            },
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, WebhookError>;
