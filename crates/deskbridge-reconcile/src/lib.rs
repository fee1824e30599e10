//! Billing to support-desk reconciliation.
//!
//! Given one billing customer, the [`ReconciliationEngine`] finds the
//! matching directory record (by external id, then email), merges duplicate
//! accounts, creates or updates the record when it has drifted, and deletes
//! phone identities that no longer match billing.
//!
//! [`BulkSync`] drives the engine over the whole billing customer list and
//! [`IdentitySweep`] is an operator tool for redundant phone identities.

pub mod batch;
pub mod cleaner;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod merger;
pub mod normalizer;
pub mod resolver;
pub mod sweep;

pub use batch::{BulkSync, BulkSyncFailure, BulkSyncOptions, BulkSyncReport};
pub use cleaner::{stale_phone_identities, PhoneMatcher};
pub use config::{EngineConfig, EngineOptions};
pub use decision::{decide, Decision, WriteAction};
pub use engine::{ReconciliationEngine, RunResult, RunStatus};
pub use error::{BulkSyncError, ReconcileError, ReconcileResult, RunStep};
pub use normalizer::{normalize, CanonicalCustomer, NormalizedContact};
pub use resolver::{resolve, Resolution, SplitPersonality};
pub use sweep::{IdentitySweep, SweepFinding};
