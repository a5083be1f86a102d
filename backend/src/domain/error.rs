//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map them to their
//! protocol envelope through [`Error::code`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::validation::{
    CredentialViolation, LoginFailureViolation, ProfileViolation, ValidationError,
};

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// The request conflicts with an existing record.
    Conflict,
    /// The requested record does not exist.
    NotFound,
    /// An unexpected error occurred inside the domain or a store.
    InternalError,
    /// The operation was cancelled or ran out of time.
    ServiceUnavailable,
}

/// Field whose uniqueness a create would violate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    /// Profile email, compared case-insensitively.
    Email,
    /// Credential username.
    Username,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => f.write_str("email"),
            Self::Username => f.write_str("username"),
        }
    }
}

/// Stored document kinds making up an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Linking record.
    Identity,
    /// Profile document.
    Profile,
    /// Credential document.
    Credential,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Profile => f.write_str("profile"),
            Self::Credential => f.write_str("credential"),
        }
    }
}

/// Individual store call made by an identity operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStep {
    /// Profile read by id or email.
    ProfileLookup,
    /// Credential read by id or username.
    CredentialLookup,
    /// Linking record read.
    IdentityLookup,
    /// Profile write during creation.
    ProfileInsert,
    /// Credential write during creation.
    CredentialInsert,
    /// Linking record write; the last step of creation.
    IdentityInsert,
    /// Profile replacement.
    ProfileUpdate,
    /// Credential replacement.
    CredentialUpdate,
}

impl StoreStep {
    /// Whether the step mutates a store.
    pub const fn is_write(self) -> bool {
        matches!(
            self,
            Self::ProfileInsert
                | Self::CredentialInsert
                | Self::IdentityInsert
                | Self::ProfileUpdate
                | Self::CredentialUpdate
        )
    }

    /// Short label used in logs and messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProfileLookup => "profile_lookup",
            Self::CredentialLookup => "credential_lookup",
            Self::IdentityLookup => "identity_lookup",
            Self::ProfileInsert => "profile_insert",
            Self::CredentialInsert => "credential_insert",
            Self::IdentityInsert => "identity_insert",
            Self::ProfileUpdate => "profile_update",
            Self::CredentialUpdate => "credential_update",
        }
    }
}

impl fmt::Display for StoreStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is known about a step interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step was never started.
    NotStarted,
    /// The step was in flight; it may or may not have been applied.
    Unknown,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("not started"),
            Self::Unknown => f.write_str("outcome unknown"),
        }
    }
}

/// Failure of an identity operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A field rule was violated; nothing was written.
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
    /// A unique field is already taken.
    #[error("{field} is already in use")]
    AlreadyExists { field: UniqueField },
    /// A record is missing.
    #[error("{record} {key} not found")]
    NotFound { record: RecordKind, key: String },
    /// The update tried to change the creation instant.
    #[error("createdAt cannot be changed")]
    CreatedAtImmutable,
    /// The credential hasher failed; nothing was written.
    #[error("password hashing failed: {message}")]
    HashingFailed { message: String },
    /// One side of an identity update was written and the other was not.
    #[error("{updated} updated but {failed} update failed: {cause}")]
    PartialUpdateFailure {
        updated: RecordKind,
        failed: RecordKind,
        #[source]
        cause: Box<Error>,
    },
    /// A store reported a failure.
    #[error("{step} failed: {message}")]
    Storage { step: StoreStep, message: String },
    /// The caller cancelled the operation.
    #[error("{step} cancelled ({outcome})")]
    Cancelled {
        step: StoreStep,
        outcome: StepOutcome,
    },
    /// A store call exceeded the step timeout.
    #[error("{step} timed out after {timeout_ms} ms")]
    TimedOut { step: StoreStep, timeout_ms: u64 },
}

impl Error {
    /// Stable code for adapters.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) | Self::CreatedAtImmutable => ErrorCode::InvalidRequest,
            Self::AlreadyExists { .. } => ErrorCode::Conflict,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::HashingFailed { .. } | Self::PartialUpdateFailure { .. } | Self::Storage { .. } => {
                ErrorCode::InternalError
            }
            Self::Cancelled { .. } | Self::TimedOut { .. } => ErrorCode::ServiceUnavailable,
        }
    }

    /// Build a [`Error::NotFound`] for `record` keyed by `key`.
    pub fn not_found(record: RecordKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            record,
            key: key.into(),
        }
    }

    /// Build a [`Error::Storage`] for `step`.
    pub fn storage(step: StoreStep, message: impl Into<String>) -> Self {
        Self::Storage {
            step,
            message: message.into(),
        }
    }

    /// The validation failure, when this is [`Error::InvalidInput`].
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::InvalidInput(violation) => Some(violation),
            _ => None,
        }
    }
}

impl From<ProfileViolation> for Error {
    fn from(value: ProfileViolation) -> Self {
        Self::InvalidInput(value.into())
    }
}

impl From<CredentialViolation> for Error {
    fn from(value: CredentialViolation) -> Self {
        Self::InvalidInput(value.into())
    }
}

impl From<LoginFailureViolation> for Error {
    fn from(value: LoginFailureViolation) -> Self {
        Self::InvalidInput(value.into())
    }
}
