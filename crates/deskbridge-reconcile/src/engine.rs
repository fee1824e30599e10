//! Reconciliation of one billing customer into the directory.
//!
//! A run walks `normalize -> resolve -> [merge] -> decide -> write -> clean`
//! and stops at the first fatal error. Every step except the merge is
//! idempotent, so callers retry by re-running with the same record.

use std::sync::Arc;

use deskbridge_billing::CustomerRecord;
use deskbridge_directory::{
    DirectoryApi, DirectoryClient, DirectoryError, DirectoryResult, IdentityId, UserId,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::cleaner::stale_phone_identities;
use crate::config::{EngineConfig, EngineOptions};
use crate::decision::{decide, WriteAction};
use crate::error::{ReconcileError, ReconcileResult, RunStep};
use crate::merger::merge;
use crate::normalizer::CanonicalCustomer;
use crate::resolver::{resolve, Resolution};

/// Most significant thing a run did.
///
/// Precedence when several apply: merged, created, updated, cleaned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    NoAction,
    Created,
    Updated,
    Merged,
    Cleaned,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub event_id: String,
    pub external_id: String,
    pub status: RunStatus,
    /// Directory record the customer now lives on.
    pub user_id: Option<UserId>,
    /// Record folded into `user_id` by a merge.
    pub merged_user_id: Option<UserId>,
    pub write: Option<WriteAction>,
    pub deleted_identities: Vec<IdentityId>,
    /// A staff record disagreed with billing data and was left alone.
    pub privileged_skipped: bool,
}

impl RunResult {
    fn no_action(event_id: &str, external_id: &str) -> Self {
        Self {
            event_id: event_id.to_string(),
            external_id: external_id.to_string(),
            status: RunStatus::NoAction,
            user_id: None,
            merged_user_id: None,
            write: None,
            deleted_identities: Vec::new(),
            privileged_skipped: false,
        }
    }
}

/// Reconciles billing customers against one directory.
///
/// Holds no per-run state; one engine may serve concurrent runs.
#[derive(Clone)]
pub struct ReconciliationEngine {
    directory: Arc<dyn DirectoryApi>,
    options: EngineOptions,
}

impl std::fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ReconciliationEngine {
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryApi>, options: EngineOptions) -> Self {
        Self { directory, options }
    }

    /// Build an engine over an HTTP directory client.
    pub fn from_config(config: EngineConfig) -> DirectoryResult<Self> {
        let client = DirectoryClient::new(config.directory)?;
        Ok(Self::new(Arc::new(client), config.options))
    }

    #[must_use]
    pub fn directory(&self) -> &Arc<dyn DirectoryApi> {
        &self.directory
    }

    #[must_use]
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Reconcile one customer. `event_id` only correlates logs.
    pub async fn reconcile(
        &self,
        record: &CustomerRecord,
        event_id: &str,
    ) -> ReconcileResult<RunResult> {
        self.reconcile_with_cancel(record, event_id, &CancellationToken::new())
            .await
    }

    /// Reconcile one customer, stopping at the next step boundary once
    /// `cancel` fires. A step already in flight is allowed to finish.
    #[instrument(skip_all, fields(event_id = %event_id, external_id = %record.id))]
    pub async fn reconcile_with_cancel(
        &self,
        record: &CustomerRecord,
        event_id: &str,
        cancel: &CancellationToken,
    ) -> ReconcileResult<RunResult> {
        // 1. Normalize.
        checkpoint(cancel, RunStep::Normalize)?;
        let canonical = CanonicalCustomer::from_record(record);
        if self.options.debug {
            debug!(customer = ?canonical, "Canonical customer");
        }
        if !canonical.has_name() {
            info!("Customer has no name yet, nothing to do");
            return Ok(RunResult::no_action(event_id, &canonical.external_id));
        }
        if canonical.external_id.is_empty() {
            return Err(ReconcileError::Validation(
                "customer has no id".to_string(),
            ));
        }
        if canonical.email.is_empty() {
            return Err(ReconcileError::Validation(
                "customer has no email".to_string(),
            ));
        }

        // 2. Resolve, merging a split customer into its external-id record.
        checkpoint(cancel, RunStep::Resolve)?;
        let resolution = resolve(
            self.directory.as_ref(),
            &canonical.external_id,
            &canonical.email,
        )
        .await?;

        let (existing, merged_user_id) = match resolution {
            Resolution::NotFound => (None, None),
            Resolution::SingleMatch(user) => (Some(user), None),
            Resolution::SplitPersonality(split) => {
                checkpoint(cancel, RunStep::Merge)?;
                let source_id = split.email_match.id;
                let kept = merge(self.directory.as_ref(), split).await?;
                (Some(kept), source_id)
            }
        };
        if self.options.debug {
            debug!(existing = ?existing, "Resolved directory record");
        }

        // 3. Decide.
        checkpoint(cancel, RunStep::Decide)?;
        let decision = decide(&canonical, existing.as_ref());
        let privileged_skipped = decision.action == WriteAction::PrivilegedSkipped;
        if privileged_skipped {
            info!(
                user_id = ?decision.request.id,
                fields = ?decision.changed,
                "Privileged directory record differs from billing, leaving it untouched"
            );
        }

        // 4. Write.
        let user_id = if decision.write_needed() {
            checkpoint(cancel, RunStep::Write)?;
            if self.options.debug {
                debug!(request = ?decision.request, "Writing directory user");
            }
            let stored = self
                .directory
                .create_or_update_user(&decision.request)
                .await
                .map_err(ReconcileError::transport(RunStep::Write))?;
            info!(
                user_id = ?stored.id,
                action = ?decision.action,
                fields = ?decision.changed,
                "Directory user written"
            );
            stored.id.or(decision.request.id)
        } else {
            debug!(user_id = ?decision.request.id, "Directory user already in sync");
            decision.request.id
        };
        let user_id = user_id.ok_or_else(|| ReconcileError::Transport {
            step: RunStep::Write,
            source: DirectoryError::ParseError(
                "directory returned a user without id".to_string(),
            ),
        })?;

        // 5. Clean stale phone identities.
        checkpoint(cancel, RunStep::Clean)?;
        let deleted_identities = self.clean_identities(user_id, &canonical.phone).await?;

        let status = if merged_user_id.is_some() {
            RunStatus::Merged
        } else {
            match decision.action {
                WriteAction::Create => RunStatus::Created,
                WriteAction::Update => RunStatus::Updated,
                _ if !deleted_identities.is_empty() => RunStatus::Cleaned,
                _ => RunStatus::NoAction,
            }
        };

        info!(status = ?status, user_id, "Reconciliation complete");
        Ok(RunResult {
            event_id: event_id.to_string(),
            external_id: canonical.external_id,
            status,
            user_id: Some(user_id),
            merged_user_id,
            write: Some(decision.action),
            deleted_identities,
            privileged_skipped,
        })
    }

    /// Delete the user's phone identities that disagree with `phone`. The
    /// first failed deletion aborts the rest.
    async fn clean_identities(
        &self,
        user_id: UserId,
        phone: &str,
    ) -> ReconcileResult<Vec<IdentityId>> {
        if phone.is_empty() {
            return Ok(Vec::new());
        }

        let identities = self
            .directory
            .list_identities(user_id)
            .await
            .map_err(ReconcileError::transport(RunStep::Clean))?;

        let stale = stale_phone_identities(phone, &identities, &self.options.phone_matcher);
        let mut deleted = Vec::with_capacity(stale.len());
        for identity in stale {
            if let Err(e) = self.directory.delete_identity(user_id, identity.id).await {
                warn!(
                    user_id,
                    identity_id = identity.id,
                    deleted = ?deleted,
                    status = ?e.status(),
                    error = %e,
                    "Failed to delete stale phone identity"
                );
                return Err(ReconcileError::Transport {
                    step: RunStep::Clean,
                    source: e,
                });
            }
            info!(user_id, url = %identity.url, "Deleted stale phone identity");
            deleted.push(identity.id);
        }
        Ok(deleted)
    }
}

fn checkpoint(cancel: &CancellationToken, step: RunStep) -> ReconcileResult<()> {
    if cancel.is_cancelled() {
        return Err(ReconcileError::Cancelled { step });
    }
    Ok(())
}
