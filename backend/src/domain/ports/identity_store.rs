//! Port for the identity linking documents.

use async_trait::async_trait;

use crate::domain::{IdentityRecord, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity store adapters.
    pub enum IdentityStoreError {
        /// Store connection could not be established.
        Connection { message } => "identity store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message } => "identity store query failed: {message}",
        /// A record with the same identifier already exists.
        DuplicateKey { index } => "identity store duplicate key on {index}",
    }
}

/// Linking records tying a profile and a credential to one identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Persist the record linking a profile and a credential.
    async fn insert(&self, record: &IdentityRecord) -> Result<(), IdentityStoreError>;

    /// Fetch a linking record by identity identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<IdentityRecord>, IdentityStoreError>;
}
