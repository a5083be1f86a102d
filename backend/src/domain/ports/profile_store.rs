//! Port for profile document persistence.
//!
//! Adapters must enforce email uniqueness with a unique index and report a
//! collision as [`ProfileStoreError::DuplicateKey`]; the service's own
//! pre-check is advisory only.

use async_trait::async_trait;

use crate::domain::{Profile, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile store adapters.
    pub enum ProfileStoreError {
        /// Store connection could not be established.
        Connection { message } => "profile store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message } => "profile store query failed: {message}",
        /// A unique index rejected the write.
        DuplicateKey { index } => "profile store duplicate key on {index}",
    }
}

/// Profile persistence keyed by user id, with a unique email index.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Persist a new profile.
    async fn insert(&self, profile: &Profile) -> Result<(), ProfileStoreError>;

    /// Fetch a profile by its owner's identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Profile>, ProfileStoreError>;

    /// Fetch a profile by email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, ProfileStoreError>;

    /// Replace an existing profile.
    async fn update(&self, profile: &Profile) -> Result<(), ProfileStoreError>;
}
