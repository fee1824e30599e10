//! Resolution of a billing customer to directory records.
//!
//! The external id is the durable key. Email only catches accounts that were
//! created before the external id was linked.

use deskbridge_directory::{DirectoryApi, DirectoryUser, SearchQuery};
use tracing::debug;

use crate::error::{ReconcileError, ReconcileResult, RunStep};

/// Page size hint for key lookups. Two is enough to detect a duplicate.
pub const SEARCH_PAGE_SIZE: u32 = 2;

/// Two distinct directory records, one per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPersonality {
    pub email_match: DirectoryUser,
    pub external_id_match: DirectoryUser,
}

/// Outcome of resolving a customer's keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NotFound,
    SingleMatch(DirectoryUser),
    SplitPersonality(SplitPersonality),
}

/// Resolve `(external_id, email)` against the directory.
///
/// More than one record for either key fails with
/// [`ReconcileError::AmbiguousDirectoryState`].
pub async fn resolve(
    directory: &dyn DirectoryApi,
    external_id: &str,
    email: &str,
) -> ReconcileResult<Resolution> {
    let by_external_id = find_unique(directory, SearchQuery::ExternalId(external_id.to_string()))
        .await?;

    match by_external_id {
        Some(record) if record.email == email => Ok(Resolution::SingleMatch(record)),
        Some(external_id_match) => {
            let by_email = find_unique(directory, SearchQuery::Email(email.to_string())).await?;
            match by_email {
                Some(email_match) if email_match.id != external_id_match.id => {
                    debug!(
                        email_user = ?email_match.id,
                        external_id_user = ?external_id_match.id,
                        "Customer is split across two directory records"
                    );
                    Ok(Resolution::SplitPersonality(SplitPersonality {
                        email_match,
                        external_id_match,
                    }))
                }
                _ => Ok(Resolution::SingleMatch(external_id_match)),
            }
        }
        None => {
            let by_email = find_unique(directory, SearchQuery::Email(email.to_string())).await?;
            Ok(by_email.map_or(Resolution::NotFound, Resolution::SingleMatch))
        }
    }
}

/// Run a key lookup and enforce that at most one record matches.
async fn find_unique(
    directory: &dyn DirectoryApi,
    query: SearchQuery,
) -> ReconcileResult<Option<DirectoryUser>> {
    let mut users = directory
        .search_users(&query, SEARCH_PAGE_SIZE)
        .await
        .map_err(ReconcileError::transport(RunStep::Resolve))?;

    if users.len() > 1 {
        return Err(ReconcileError::AmbiguousDirectoryState {
            key: query.key(),
            matches: users.len(),
        });
    }
    Ok(users.pop())
}
