//! Reconciliation error taxonomy.

use std::fmt;

use deskbridge_billing::BillingError;
use deskbridge_directory::{DirectoryError, UserId};
use thiserror::Error;

pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Steps of a single reconciliation run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStep {
    Normalize,
    Resolve,
    Merge,
    Decide,
    Write,
    Clean,
}

impl fmt::Display for RunStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normalize => "normalize",
            Self::Resolve => "resolve",
            Self::Merge => "merge",
            Self::Decide => "decide",
            Self::Write => "write",
            Self::Clean => "clean",
        };
        f.write_str(name)
    }
}

/// First fatal condition of a run. Remaining steps are not attempted.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The billing payload cannot be acted on.
    #[error("invalid customer payload: {0}")]
    Validation(String),

    /// More than one directory record for a key that must be unique.
    #[error("ambiguous directory state: {matches} records found for {key}")]
    AmbiguousDirectoryState { key: String, matches: usize },

    /// The remote merge failed; both records may need manual attention.
    #[error("failed to merge directory user {source_id} into {target_id}: {source}")]
    MergeFailed {
        source_id: UserId,
        target_id: UserId,
        #[source]
        source: DirectoryError,
    },

    /// A directory call failed. Re-running with the same input is safe.
    #[error("directory call failed during {step}: {source}")]
    Transport {
        step: RunStep,
        #[source]
        source: DirectoryError,
    },

    /// The caller cancelled the run at a step boundary.
    #[error("run cancelled before {step}")]
    Cancelled { step: RunStep },
}

impl ReconcileError {
    pub(crate) fn transport(step: RunStep) -> impl FnOnce(DirectoryError) -> Self {
        move |source| Self::Transport { step, source }
    }

    /// Whether the caller may retry the run with the same input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Cancelled { .. })
    }

    /// Stable code for logs and API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::AmbiguousDirectoryState { .. } => "AMBIGUOUS_DIRECTORY_STATE",
            Self::MergeFailed { .. } => "MERGE_FAILED",
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Cancelled { .. } => "CANCELLED",
        }
    }
}

/// Failure of a bulk sync as a whole (single-customer failures are reported,
/// not raised).
#[derive(Debug, Error)]
pub enum BulkSyncError {
    #[error("failed to list billing customers: {0}")]
    Billing(#[from] BillingError),
}
