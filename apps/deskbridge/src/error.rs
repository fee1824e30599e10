//! Error types for the deskbridge binary.

use std::path::PathBuf;

use deskbridge_billing::BillingError;
use deskbridge_directory::DirectoryError;
use deskbridge_reconcile::{BulkSyncError, ReconcileError};
use deskbridge_webhooks::WebhookError;
use thiserror::Error;

use crate::config::ConfigError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Directory client error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Billing client error: {0}")]
    Billing(#[from] BillingError),

    #[error("{0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Bulk sync aborted: {0}")]
    BulkSync(#[from] BulkSyncError),

    #[error("Event failed: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(std::io::Error),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    /// A shutdown signal stopped the command before it finished.
    #[error("Cancelled after {processed} items")]
    Cancelled { processed: usize },

    /// Some items of a multi-item command failed; details were already printed.
    #[error("{failed} of {total} items failed")]
    Partial { failed: usize, total: usize },
}

impl AppError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            AppError::Directory(_)
            | AppError::Billing(_)
            | AppError::BulkSync(_)
            | AppError::Cancelled { .. } => 3,
            AppError::Reconcile(e) => reconcile_exit_code(e),
            AppError::Webhook(WebhookError::Reconcile(e)) => reconcile_exit_code(e),
            AppError::Webhook(_) => 4,
            AppError::Io { .. } | AppError::Server(_) | AppError::Output(_) => 5,
            AppError::Partial { .. } => 6,
        }
    }

    /// Print the error to stderr.
    pub fn print(&self) {
        if std::env::var("NO_COLOR").is_err() {
            eprintln!("\x1b[31mError:\x1b[0m {self}");
        } else {
            eprintln!("Error: {self}");
        }
    }
}

fn reconcile_exit_code(error: &ReconcileError) -> i32 {
    match error {
        ReconcileError::Validation(_) => 4,
        ReconcileError::Transport { .. } | ReconcileError::Cancelled { .. } => 3,
        ReconcileError::AmbiguousDirectoryState { .. } | ReconcileError::MergeFailed { .. } => 7,
    }
}
