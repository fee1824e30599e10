//! Client for the support-desk directory.
//!
//! Exposes the [`DirectoryApi`] capability (user search, create-or-update,
//! identity listing and deletion, user merge) and its HTTP implementation.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod retry;
pub mod traits;

pub use auth::DirectoryCredentials;
pub use client::{DirectoryClient, DirectoryConfig};
pub use error::{DirectoryError, DirectoryResult};
pub use models::{DirectoryUser, Identity, IdentityId, SearchQuery, UserId};
pub use retry::RetryPolicy;
pub use traits::DirectoryApi;
