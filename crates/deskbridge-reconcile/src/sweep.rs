//! Operator sweep for redundant phone identities.
//!
//! The directory keeps a separate phone identity per spelling of a number, so
//! a user whose phone is `+61412345678` can also carry `0412 345 678`. The
//! sweep finds identities that denote the user's own phone under the
//! configured [`PhoneMatcher`] but are spelled differently. It reports them
//! and deletes them only when asked to.

use std::sync::Arc;

use deskbridge_directory::{DirectoryApi, IdentityId, SearchQuery, UserId};
use serde::Serialize;
use tracing::{info, warn};

use crate::cleaner::PhoneMatcher;
use crate::error::{ReconcileError, ReconcileResult, RunStep};
use crate::normalizer::strip_whitespace;
use crate::resolver::SEARCH_PAGE_SIZE;

/// A redundant identity found by the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepFinding {
    pub user_id: UserId,
    pub identity_id: IdentityId,
    pub value: String,
    pub url: String,
    pub deleted: bool,
}

/// Sweep of one user's phone identities.
pub struct IdentitySweep {
    directory: Arc<dyn DirectoryApi>,
    matcher: PhoneMatcher,
}

impl IdentitySweep {
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryApi>, matcher: PhoneMatcher) -> Self {
        Self { directory, matcher }
    }

    /// Find redundant phone identities of the user registered under `email`,
    /// deleting them when `apply` is set.
    pub async fn sweep(&self, email: &str, apply: bool) -> ReconcileResult<Vec<SweepFinding>> {
        if email.trim().is_empty() {
            return Err(ReconcileError::Validation("email is required".to_string()));
        }
        if self.matcher == PhoneMatcher::Exact {
            warn!("Phone matching is exact, no identity can be redundant");
        }

        let query = SearchQuery::Email(email.trim().to_string());
        let users = self
            .directory
            .search_users(&query, SEARCH_PAGE_SIZE)
            .await
            .map_err(ReconcileError::transport(RunStep::Resolve))?;
        if users.len() > 1 {
            return Err(ReconcileError::AmbiguousDirectoryState {
                key: query.key(),
                matches: users.len(),
            });
        }

        let mut findings = Vec::new();
        for user in users {
            let (Some(user_id), Some(phone)) = (user.id, user.phone.as_deref()) else {
                continue;
            };
            let phone = strip_whitespace(phone);
            if phone.is_empty() {
                continue;
            }

            let identities = self
                .directory
                .list_identities(user_id)
                .await
                .map_err(ReconcileError::transport(RunStep::Clean))?;

            for identity in identities.iter().filter(|i| i.is_phone_number()) {
                let value = strip_whitespace(&identity.value);
                if value.eq_ignore_ascii_case(&phone) || !self.matcher.matches(&value, &phone) {
                    continue;
                }

                if apply {
                    self.directory
                        .delete_identity(user_id, identity.id)
                        .await
                        .map_err(ReconcileError::transport(RunStep::Clean))?;
                    info!(user_id, url = %identity.url, "Deleted redundant phone identity");
                } else {
                    info!(user_id, url = %identity.url, "Would delete redundant phone identity");
                }

                findings.push(SweepFinding {
                    user_id,
                    identity_id: identity.id,
                    value: identity.value.clone(),
                    url: identity.url.clone(),
                    deleted: apply,
                });
            }
        }

        Ok(findings)
    }
}
