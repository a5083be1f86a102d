//! Driving port for identity use-cases.
//!
//! Inbound adapters call this port to create, read, and update identities
//! without knowing which stores or hasher back the service. Every operation
//! takes the caller's [`CancellationToken`]; once it fires no further store
//! step is started.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{Error, Identity, IdentityUpdate, NewCredential, ProfileDetails, UserId};

/// Request to create an identity from unvalidated caller input.
#[derive(Debug)]
pub struct CreateIdentityRequest {
    /// Profile fields for the new identity.
    pub profile: ProfileDetails,
    /// Username, plaintext password and initial account status.
    pub credential: NewCredential,
}

/// Request to record a failed login attempt against a username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailedLoginRequest {
    /// Login name whose credential is charged with the failure.
    pub username: String,
    /// Why the login failed; must not be blank.
    pub reason: String,
}

impl RecordFailedLoginRequest {
    /// Build a request from a username and a failure reason.
    pub fn new(username: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            reason: reason.into(),
        }
    }
}

/// Driving port for identity operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityCommand: Send + Sync {
    /// Validate, hash, and persist a new identity.
    ///
    /// Fails with [`Error::InvalidInput`] or [`Error::AlreadyExists`] before
    /// anything is written.
    async fn create_identity(
        &self,
        request: CreateIdentityRequest,
        cancel: &CancellationToken,
    ) -> Result<Identity, Error>;

    /// Assemble an identity from its three stored documents.
    async fn get_identity(
        &self,
        id: &UserId,
        cancel: &CancellationToken,
    ) -> Result<Identity, Error>;

    /// Re-validate and replace an identity's profile and credential.
    async fn update_identity(
        &self,
        update: IdentityUpdate,
        cancel: &CancellationToken,
    ) -> Result<Identity, Error>;

    /// Count a failed login for `username`, locking the account when the
    /// configured threshold is reached.
    async fn record_failed_login(
        &self,
        request: RecordFailedLoginRequest,
        cancel: &CancellationToken,
    ) -> Result<Identity, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, RecordKind};
    use rstest::rstest;

    async fn lookup(port: &dyn IdentityCommand, id: &UserId) -> Result<Identity, Error> {
        port.get_identity(id, &CancellationToken::new()).await
    }

    #[rstest]
    #[tokio::test]
    async fn callers_see_port_errors_unchanged() {
        let id = UserId::random();
        let expected = id.clone();
        let mut port = MockIdentityCommand::new();
        port.expect_get_identity()
            .withf(move |requested, _| requested == &expected)
            .times(1)
            .returning(|requested, _| {
                Err(Error::not_found(RecordKind::Identity, requested.as_ref()))
            });

        let err = lookup(&port, &id).await.expect_err("missing identity");
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(err.to_string().contains(id.as_ref()));
    }

    #[rstest]
    fn failed_login_request_keeps_its_fields() {
        let request = RecordFailedLoginRequest::new("joao.silva", "bad password");
        assert_eq!(request.username, "joao.silva");
        assert_eq!(request.reason, "bad password");
    }
}
