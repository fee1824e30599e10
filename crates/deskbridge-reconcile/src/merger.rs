//! Collapse a split customer into its external-id record.

use deskbridge_directory::{DirectoryApi, DirectoryError, DirectoryUser, UserId};
use tracing::{info, warn};

use crate::error::{ReconcileError, ReconcileResult, RunStep};
use crate::resolver::SplitPersonality;

/// Merge the email-matched record into the external-id-matched record and
/// return the survivor.
///
/// The merge call is made exactly once. A failure names both ids so an
/// operator can finish the job by hand.
pub async fn merge(
    directory: &dyn DirectoryApi,
    split: SplitPersonality,
) -> ReconcileResult<DirectoryUser> {
    let source_id = require_id(&split.email_match)?;
    let target_id = require_id(&split.external_id_match)?;

    directory
        .merge_users(source_id, target_id)
        .await
        .map_err(|source| {
            warn!(
                source_id,
                target_id,
                status = ?source.status(),
                error = %source,
                "Directory merge failed"
            );
            ReconcileError::MergeFailed {
                source_id,
                target_id,
                source,
            }
        })?;

    info!(source_id, target_id, "Merged duplicate directory user");
    Ok(split.external_id_match)
}

fn require_id(user: &DirectoryUser) -> ReconcileResult<UserId> {
    user.id.ok_or_else(|| ReconcileError::Transport {
        step: RunStep::Merge,
        source: DirectoryError::ParseError(format!(
            "directory search returned a user without id ({})",
            user.email
        )),
    })
}
