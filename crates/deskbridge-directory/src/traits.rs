//! The directory capability consumed by the reconciliation engine.

use async_trait::async_trait;

use crate::error::DirectoryResult;
use crate::models::{DirectoryUser, Identity, IdentityId, SearchQuery, UserId};

/// Operations the support-desk directory must provide.
///
/// Implemented over HTTP by [`crate::client::DirectoryClient`]; tests provide
/// in-memory implementations.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// Search users. `per_page` is a size hint only; callers must check
    /// uniqueness themselves.
    async fn search_users(
        &self,
        query: &SearchQuery,
        per_page: u32,
    ) -> DirectoryResult<Vec<DirectoryUser>>;

    /// Create the user, or update it in place when `user.id` (or its email /
    /// external id) already identifies a record. Returns the stored record.
    async fn create_or_update_user(&self, user: &DirectoryUser) -> DirectoryResult<DirectoryUser>;

    /// All identities attached to a user.
    async fn list_identities(&self, user_id: UserId) -> DirectoryResult<Vec<Identity>>;

    /// Delete one identity. Deleting an identity that is already gone succeeds.
    async fn delete_identity(&self, user_id: UserId, identity_id: IdentityId)
        -> DirectoryResult<()>;

    /// Merge `source` into `target`; `source` ceases to exist.
    ///
    /// Not idempotent against a half-completed remote merge, so it is never
    /// retried.
    async fn merge_users(&self, source: UserId, target: UserId) -> DirectoryResult<()>;
}
