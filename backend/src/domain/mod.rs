//! Identity domain: aggregates, validation rules, ports, and the service.
//!
//! Public surface:
//! - [`Identity`], [`Profile`], [`Credential`] and their input types.
//! - [`validation`]: pure field rules and their violation kinds.
//! - [`Error`] and [`ErrorCode`]: the transport-agnostic error taxonomy.
//! - [`ports`]: store, hasher, and driving ports.
//! - [`IdentityService`]: orchestration over the ports.

pub mod error;
pub mod identity;
mod identity_service;
pub mod password;
pub mod ports;
pub mod validation;

pub use self::error::{Error, ErrorCode, RecordKind, StepOutcome, StoreStep, UniqueField};
pub use self::identity::{
    AccountStatus, Credential, CredentialUpdate, Identity, IdentityRecord, IdentityUpdate,
    LoginFailureFields, NewCredential, Profile, ProfileDetails, UserId, UserIdError,
};
pub use self::identity_service::{IdentityPolicy, IdentityService};
pub use self::password::PasswordHash;
pub use self::validation::{
    CredentialViolation, LoginFailureViolation, ProfileViolation, ValidationError,
};
