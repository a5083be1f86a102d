//! Identity aggregate and its profile and credential sub-records.
//!
//! An [`Identity`] links exactly one [`Profile`] and one [`Credential`] through
//! a shared [`UserId`]. The three records are persisted as independent
//! documents; [`IdentityRecord`] is the linking document.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::password::PasswordHash;
use super::validation::CredentialViolation;

/// Errors raised when parsing a [`UserId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserIdError {
    /// The identifier was empty.
    #[error("user id must not be empty")]
    Empty,
    /// The identifier was not a canonical UUID.
    #[error("user id must be a valid UUID")]
    Invalid,
}

/// Opaque identifier shared by an identity and its sub-records.
///
/// Generated once at creation and never reassigned. Parsed input is kept in
/// the canonical lowercase hyphenated form, so equality and hashing agree
/// with the underlying UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Parse a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserIdError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        let uuid = Uuid::new_v4();
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserIdError> {
        if id.is_empty() {
            return Err(UserIdError::Empty);
        }
        if id.trim() != id {
            return Err(UserIdError::Invalid);
        }
        let parsed = Uuid::parse_str(&id).map_err(|_| UserIdError::Invalid)?;
        Ok(Self(parsed, parsed.to_string()))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Lifecycle state of a credential.
///
/// Transitions between states are caller driven; every state other than
/// [`AccountStatus::Active`] must carry a status reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// The account may be used.
    Active,
    /// The account was deactivated.
    Inactive,
    /// The account awaits confirmation.
    Pending,
    /// The account was suspended.
    Suspended,
}

impl AccountStatus {
    /// All statuses in wire order.
    pub const ALL: [Self; 4] = [Self::Active, Self::Inactive, Self::Pending, Self::Suspended];

    /// Wire name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::Pending => "PENDING",
            Self::Suspended => "SUSPENDED",
        }
    }

    /// Whether a non-empty status reason is mandatory for this status.
    pub const fn requires_reason(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i32> for AccountStatus {
    type Error = CredentialViolation;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Active),
            1 => Ok(Self::Inactive),
            2 => Ok(Self::Pending),
            3 => Ok(Self::Suspended),
            other => Err(CredentialViolation::UnknownAccountStatus {
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = CredentialViolation;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| CredentialViolation::UnknownAccountStatus {
                value: value.to_owned(),
            })
    }
}

/// Personal and contact fields of a profile, as supplied by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    /// Single capitalised word.
    pub first_name: String,
    /// One or more capitalised words.
    pub last_name: String,
    /// Contact address; unique across profiles.
    pub email: String,
    /// Calendar date of birth.
    pub birth_date: NaiveDate,
    /// Domestic or international phone number.
    pub phone: String,
    /// Optional absolute URL of the avatar image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// Stored profile document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Identifier shared with the owning identity.
    pub user_id: UserId,
    /// Validated profile fields.
    #[serde(flatten)]
    pub details: ProfileDetails,
}

/// Credential input accepted by identity creation.
///
/// The plaintext password is held in a [`SecretString`] so it is redacted
/// from `Debug` output and zeroised on drop.
#[derive(Debug)]
pub struct NewCredential {
    /// Login name.
    pub username: String,
    /// Plaintext password; hashed before anything is persisted.
    pub password: SecretString,
    /// Initial account status.
    pub account_status: AccountStatus,
    /// Reason for a non-active status.
    pub status_reason: String,
}

/// Stored credential and account-state document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Identifier shared with the owning identity.
    pub user_id: UserId,
    /// Login name; unique across credentials.
    pub username: String,
    /// Salted one-way hash of the password.
    pub password_hash: PasswordHash,
    /// Current account status.
    pub account_status: AccountStatus,
    /// Reason for a non-active status; empty when active.
    #[serde(default)]
    pub status_reason: String,
    /// Creation instant; immutable.
    pub created_at: DateTime<Utc>,
    /// Instant of the last credential change.
    pub updated_at: DateTime<Utc>,
    /// Instant of the last successful login.
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    /// Count of failed logins since the last reset.
    #[serde(default)]
    pub failed_login_attempts: i32,
    /// Instant of the most recent failed login.
    #[serde(default)]
    pub last_failed_login: Option<DateTime<Utc>>,
    /// Reason recorded for the most recent failed login.
    #[serde(default)]
    pub last_failed_login_reason: String,
    /// Instant until which the account is locked.
    #[serde(default)]
    pub account_locked_until: Option<DateTime<Utc>>,
    /// Reason recorded for the lock.
    #[serde(default)]
    pub account_locked_reason: String,
}

impl Credential {
    /// Borrow the login-failure bookkeeping fields.
    pub fn login_failures(&self) -> LoginFailureFields<'_> {
        LoginFailureFields {
            failed_login_attempts: self.failed_login_attempts,
            last_failed_login: self.last_failed_login,
            last_failed_login_reason: self.last_failed_login_reason.as_str(),
        }
    }
}

/// Borrowed view over the login-failure fields checked by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginFailureFields<'a> {
    /// Failed attempts recorded so far.
    pub failed_login_attempts: i32,
    /// Instant of the most recent failure.
    pub last_failed_login: Option<DateTime<Utc>>,
    /// Reason for the most recent failure.
    pub last_failed_login_reason: &'a str,
}

/// Linking document tying a profile and a credential to one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRecord {
    /// Identity identifier.
    pub id: UserId,
    /// Identifier of the linked profile document.
    pub profile_ref: UserId,
    /// Identifier of the linked credential document.
    pub credential_ref: UserId,
}

impl IdentityRecord {
    /// Link both sub-records under `id`.
    pub fn linking(id: UserId) -> Self {
        Self {
            profile_ref: id.clone(),
            credential_ref: id.clone(),
            id,
        }
    }
}

/// Assembled identity returned to callers.
///
/// Never partially populated: a missing sub-record fails the whole read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Identity identifier.
    pub id: UserId,
    /// Linked profile.
    pub profile: Profile,
    /// Linked credential.
    pub credential: Credential,
}

/// Credential fields a caller may change through an identity update.
///
/// `created_at` is carried only so the update can prove it is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialUpdate {
    /// Login name.
    pub username: String,
    /// Account status.
    pub account_status: AccountStatus,
    /// Reason for a non-active status.
    #[serde(default)]
    pub status_reason: String,
    /// Creation instant as last read by the caller.
    pub created_at: DateTime<Utc>,
    /// Instant of the last successful login.
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    /// Count of failed logins.
    #[serde(default)]
    pub failed_login_attempts: i32,
    /// Instant of the most recent failed login.
    #[serde(default)]
    pub last_failed_login: Option<DateTime<Utc>>,
    /// Reason for the most recent failed login.
    #[serde(default)]
    pub last_failed_login_reason: String,
    /// Instant until which the account is locked.
    #[serde(default)]
    pub account_locked_until: Option<DateTime<Utc>>,
    /// Reason recorded for the lock.
    #[serde(default)]
    pub account_locked_reason: String,
}

impl CredentialUpdate {
    /// Borrow the login-failure bookkeeping fields.
    pub fn login_failures(&self) -> LoginFailureFields<'_> {
        LoginFailureFields {
            failed_login_attempts: self.failed_login_attempts,
            last_failed_login: self.last_failed_login,
            last_failed_login_reason: self.last_failed_login_reason.as_str(),
        }
    }
}

impl From<Credential> for CredentialUpdate {
    fn from(value: Credential) -> Self {
        let Credential {
            username,
            account_status,
            status_reason,
            created_at,
            last_login,
            failed_login_attempts,
            last_failed_login,
            last_failed_login_reason,
            account_locked_until,
            account_locked_reason,
            ..
        } = value;
        Self {
            username,
            account_status,
            status_reason,
            created_at,
            last_login,
            failed_login_attempts,
            last_failed_login,
            last_failed_login_reason,
            account_locked_until,
            account_locked_reason,
        }
    }
}

/// Full replacement of an identity's mutable fields.
///
/// The stored password hash is kept unless `new_password` is supplied.
#[derive(Debug)]
pub struct IdentityUpdate {
    /// Identity to update.
    pub id: UserId,
    /// Replacement profile fields.
    pub profile: ProfileDetails,
    /// Replacement credential fields.
    pub credential: CredentialUpdate,
    /// Optional new plaintext password.
    pub new_password: Option<SecretString>,
}

impl IdentityUpdate {
    /// Replace the password as part of this update.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.new_password = Some(SecretString::from(password.into()));
        self
    }
}

impl From<Identity> for IdentityUpdate {
    fn from(value: Identity) -> Self {
        let Identity {
            id,
            profile,
            credential,
        } = value;
        Self {
            id,
            profile: profile.details,
            credential: CredentialUpdate::from(credential),
            new_password: None,
        }
    }
}
