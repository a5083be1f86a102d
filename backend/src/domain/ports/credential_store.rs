//! Port for credential document persistence.

use async_trait::async_trait;

use crate::domain::{Credential, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential store adapters.
    pub enum CredentialStoreError {
        /// Store connection could not be established.
        Connection { message } => "credential store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message } => "credential store query failed: {message}",
        /// A unique index rejected the write.
        DuplicateKey { index } => "credential store duplicate key on {index}",
    }
}

/// Credential persistence keyed by user id, with a unique username index.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persist a new credential.
    async fn insert(&self, credential: &Credential) -> Result<(), CredentialStoreError>;

    /// Fetch a credential by its owner's identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Credential>, CredentialStoreError>;

    /// Fetch a credential by username.
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Credential>, CredentialStoreError>;

    /// Replace an existing credential.
    async fn update(&self, credential: &Credential) -> Result<(), CredentialStoreError>;
}
