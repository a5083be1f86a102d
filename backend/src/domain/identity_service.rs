//! Identity orchestration service.
//!
//! Implements the [`IdentityCommand`] driving port by sequencing validation,
//! password hashing, and writes across the profile, credential, and identity
//! stores. The stores share no transaction: creation writes the profile
//! first, then the credential, then the linking record, so an interrupted
//! creation can only leave documents that no successful read will expose.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeDelta, Utc};
use mockable::Clock;
use secrecy::{ExposeSecret, SecretString};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::IdentitySettings;
use crate::domain::ports::{
    CreateIdentityRequest, CredentialHasher, CredentialStore, CredentialStoreError,
    IdentityCommand, IdentityStore, IdentityStoreError, ProfileStore, ProfileStoreError,
    RecordFailedLoginRequest,
};
use crate::domain::validation::{self, LoginFailureViolation};
use crate::domain::{
    AccountStatus, Credential, Error, Identity, IdentityRecord, IdentityUpdate, NewCredential,
    PasswordHash, Profile, RecordKind, StepOutcome, StoreStep, UniqueField, UserId,
};

/// Runtime limits applied by [`IdentityService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityPolicy {
    /// Upper bound on any single store call.
    pub step_timeout: Duration,
    /// Failed logins that lock the account; zero disables locking.
    pub max_failed_login_attempts: u32,
    /// How long a lock lasts.
    pub lockout: TimeDelta,
    /// Offset of the calendar that birth dates are compared in.
    pub calendar_offset: FixedOffset,
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(5),
            max_failed_login_attempts: 5,
            lockout: TimeDelta::minutes(15),
            calendar_offset: Utc.fix(),
        }
    }
}

impl IdentityPolicy {
    /// Derive the policy from loaded settings.
    pub fn from_settings(settings: &IdentitySettings) -> Self {
        Self {
            step_timeout: settings.step_timeout(),
            max_failed_login_attempts: settings.max_failed_login_attempts(),
            lockout: TimeDelta::minutes(i64::from(settings.lockout_minutes())),
            calendar_offset: settings.utc_offset().unwrap_or_else(|| {
                warn!(
                    minutes = settings.utc_offset_minutes,
                    "calendar offset out of range; using UTC",
                );
                Utc.fix()
            }),
        }
    }

    /// Calendar date of `now` in the configured offset.
    fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.calendar_offset).date_naive()
    }

    fn locks_at(&self, attempts: i32) -> bool {
        self.max_failed_login_attempts > 0
            && i64::from(attempts) >= i64::from(self.max_failed_login_attempts)
    }

    fn step_timeout_ms(&self) -> u64 {
        u64::try_from(self.step_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Conversion of a store port error into the domain taxonomy.
trait StoreFailure: std::fmt::Display {
    fn into_domain(self, step: StoreStep) -> Error;
}

impl StoreFailure for ProfileStoreError {
    fn into_domain(self, step: StoreStep) -> Error {
        match self {
            Self::DuplicateKey { .. } => Error::AlreadyExists {
                field: UniqueField::Email,
            },
            other => Error::storage(step, other.to_string()),
        }
    }
}

impl StoreFailure for CredentialStoreError {
    fn into_domain(self, step: StoreStep) -> Error {
        match self {
            Self::DuplicateKey { .. } => Error::AlreadyExists {
                field: UniqueField::Username,
            },
            other => Error::storage(step, other.to_string()),
        }
    }
}

impl StoreFailure for IdentityStoreError {
    fn into_domain(self, step: StoreStep) -> Error {
        Error::storage(step, self.to_string())
    }
}

/// Identity service implementing the [`IdentityCommand`] driving port.
#[derive(Clone)]
pub struct IdentityService<P, C, I, H> {
    profiles: Arc<P>,
    credentials: Arc<C>,
    identities: Arc<I>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
    policy: IdentityPolicy,
}

impl<P, C, I, H> IdentityService<P, C, I, H> {
    /// Create a service with the default [`IdentityPolicy`].
    pub fn new(
        profiles: Arc<P>,
        credentials: Arc<C>,
        identities: Arc<I>,
        hasher: Arc<H>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            profiles,
            credentials,
            identities,
            hasher,
            clock,
            policy: IdentityPolicy::default(),
        }
    }

    /// Replace the runtime policy.
    #[must_use]
    pub fn with_policy(mut self, policy: IdentityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Active runtime policy.
    pub fn policy(&self) -> &IdentityPolicy {
        &self.policy
    }
}

impl<P, C, I, H> IdentityService<P, C, I, H>
where
    P: ProfileStore,
    C: CredentialStore,
    I: IdentityStore,
    H: CredentialHasher + 'static,
{
    /// Run one store call under the caller's cancellation token and the step
    /// timeout.
    async fn step<T, E, F>(
        &self,
        step: StoreStep,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<T, Error>
    where
        F: Future<Output = Result<T, E>>,
        E: StoreFailure,
    {
        if cancel.is_cancelled() {
            debug!(step = %step, "cancelled before store call");
            return Err(Error::Cancelled {
                step,
                outcome: StepOutcome::NotStarted,
            });
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!(step = %step, write = step.is_write(), "store call cancelled in flight; outcome unknown");
                Err(Error::Cancelled { step, outcome: StepOutcome::Unknown })
            }
            result = tokio::time::timeout(self.policy.step_timeout, call) => match result {
                Ok(outcome) => outcome.map_err(|err| {
                    debug!(step = %step, error = %err, "store call failed");
                    err.into_domain(step)
                }),
                Err(_) => {
                    let timeout_ms = self.policy.step_timeout_ms();
                    warn!(step = %step, write = step.is_write(), timeout_ms, "store call timed out; outcome unknown");
                    Err(Error::TimedOut { step, timeout_ms })
                }
            },
        }
    }

    async fn hash_password(&self, password: SecretString) -> Result<PasswordHash, Error> {
        let hasher = Arc::clone(&self.hasher);
        match tokio::task::spawn_blocking(move || hasher.hash(&password)).await {
            Ok(Ok(hash)) => Ok(hash),
            Ok(Err(err)) => {
                error!(error = %err, "password hashing failed");
                Err(Error::HashingFailed {
                    message: err.to_string(),
                })
            }
            Err(join_error) => {
                error!(error = %join_error, "password hashing task failed");
                Err(Error::HashingFailed {
                    message: format!("hashing task failed: {join_error}"),
                })
            }
        }
    }

    async fn ensure_unique(
        &self,
        email: &str,
        username: &str,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        let existing_profile = self
            .step(StoreStep::ProfileLookup, cancel, self.profiles.find_by_email(email))
            .await?;
        if existing_profile.is_some() {
            debug!("email already registered");
            return Err(Error::AlreadyExists {
                field: UniqueField::Email,
            });
        }

        let existing_credential = self
            .step(
                StoreStep::CredentialLookup,
                cancel,
                self.credentials.find_by_username(username),
            )
            .await?;
        if existing_credential.is_some() {
            debug!(username, "username already registered");
            return Err(Error::AlreadyExists {
                field: UniqueField::Username,
            });
        }
        Ok(())
    }

    async fn load(&self, id: &UserId, cancel: &CancellationToken) -> Result<Identity, Error> {
        let record = self
            .step(StoreStep::IdentityLookup, cancel, self.identities.find_by_id(id))
            .await?
            .ok_or_else(|| Error::not_found(RecordKind::Identity, id.as_ref()))?;

        let (profile, credential) = tokio::try_join!(
            self.step(
                StoreStep::ProfileLookup,
                cancel,
                self.profiles.find_by_id(&record.profile_ref),
            ),
            self.step(
                StoreStep::CredentialLookup,
                cancel,
                self.credentials.find_by_id(&record.credential_ref),
            ),
        )?;
        let profile = profile.ok_or_else(|| {
            warn!(user_id = %id, "identity record without profile");
            Error::not_found(RecordKind::Profile, record.profile_ref.as_ref())
        })?;
        let credential = credential.ok_or_else(|| {
            warn!(user_id = %id, "identity record without credential");
            Error::not_found(RecordKind::Credential, record.credential_ref.as_ref())
        })?;

        Ok(Identity {
            id: record.id,
            profile,
            credential,
        })
    }

    fn new_credential(
        id: &UserId,
        username: String,
        account_status: AccountStatus,
        status_reason: String,
        password_hash: PasswordHash,
        now: DateTime<Utc>,
    ) -> Credential {
        Credential {
            user_id: id.clone(),
            username,
            password_hash,
            account_status,
            status_reason,
            created_at: now,
            updated_at: now,
            last_login: None,
            failed_login_attempts: 0,
            last_failed_login: None,
            last_failed_login_reason: String::new(),
            account_locked_until: None,
            account_locked_reason: String::new(),
        }
    }
}

#[async_trait]
impl<P, C, I, H> IdentityCommand for IdentityService<P, C, I, H>
where
    P: ProfileStore,
    C: CredentialStore,
    I: IdentityStore,
    H: CredentialHasher + 'static,
{
    async fn create_identity(
        &self,
        request: CreateIdentityRequest,
        cancel: &CancellationToken,
    ) -> Result<Identity, Error> {
        let CreateIdentityRequest {
            profile: details,
            credential,
        } = request;

        let today = self.policy.today(self.clock.utc());
        validation::validate_profile(&details, today)?;
        validation::validate_new_credential(&credential)?;
        self.ensure_unique(&details.email, &credential.username, cancel)
            .await?;

        let NewCredential {
            username,
            password,
            account_status,
            status_reason,
        } = credential;
        let id = UserId::random();
        let password_hash = self.hash_password(password).await?;
        let now = self.clock.utc();

        let profile = Profile {
            user_id: id.clone(),
            details,
        };
        let credential = Self::new_credential(
            &id,
            username,
            account_status,
            status_reason,
            password_hash,
            now,
        );
        let record = IdentityRecord::linking(id.clone());

        self.step(StoreStep::ProfileInsert, cancel, self.profiles.insert(&profile))
            .await?;
        if let Err(err) = self
            .step(StoreStep::CredentialInsert, cancel, self.credentials.insert(&credential))
            .await
        {
            warn!(
                user_id = %id,
                step = %StoreStep::CredentialInsert,
                error = %err,
                orphaned = "profile",
                "identity creation failed after profile write",
            );
            return Err(err);
        }
        if let Err(err) = self
            .step(StoreStep::IdentityInsert, cancel, self.identities.insert(&record))
            .await
        {
            warn!(
                user_id = %id,
                step = %StoreStep::IdentityInsert,
                error = %err,
                orphaned = "profile,credential",
                "identity creation failed after credential write",
            );
            return Err(err);
        }

        info!(user_id = %id, "identity created");
        Ok(Identity {
            id,
            profile,
            credential,
        })
    }

    async fn get_identity(
        &self,
        id: &UserId,
        cancel: &CancellationToken,
    ) -> Result<Identity, Error> {
        self.load(id, cancel).await
    }

    async fn update_identity(
        &self,
        update: IdentityUpdate,
        cancel: &CancellationToken,
    ) -> Result<Identity, Error> {
        let IdentityUpdate {
            id,
            profile: details,
            credential: changes,
            new_password,
        } = update;

        let now = self.clock.utc();
        validation::validate_profile(&details, self.policy.today(now))?;
        validation::validate_credential_update(&changes)?;
        validation::validate_login_failure(changes.login_failures(), now)?;
        if let Some(password) = &new_password {
            validation::validate_password(password.expose_secret())?;
        }

        let current = self.load(&id, cancel).await?;
        if changes.created_at != current.credential.created_at {
            debug!(user_id = %id, "update attempted to change createdAt");
            return Err(Error::CreatedAtImmutable);
        }

        let password_hash = match new_password {
            Some(password) => self.hash_password(password).await?,
            None => current.credential.password_hash.clone(),
        };

        let profile = Profile {
            user_id: current.profile.user_id.clone(),
            details,
        };
        let mut credential = Credential {
            user_id: current.credential.user_id.clone(),
            username: changes.username,
            password_hash,
            account_status: changes.account_status,
            status_reason: changes.status_reason,
            created_at: current.credential.created_at,
            updated_at: current.credential.updated_at,
            last_login: changes.last_login,
            failed_login_attempts: changes.failed_login_attempts,
            last_failed_login: changes.last_failed_login,
            last_failed_login_reason: changes.last_failed_login_reason,
            account_locked_until: changes.account_locked_until,
            account_locked_reason: changes.account_locked_reason,
        };
        if credential != current.credential {
            credential.updated_at = self.clock.utc();
        }

        let (profile_result, credential_result) = tokio::join!(
            self.step(StoreStep::ProfileUpdate, cancel, self.profiles.update(&profile)),
            self.step(
                StoreStep::CredentialUpdate,
                cancel,
                self.credentials.update(&credential),
            ),
        );

        match (profile_result, credential_result) {
            (Ok(()), Ok(())) => {
                info!(user_id = %id, "identity updated");
                Ok(Identity {
                    id: current.id,
                    profile,
                    credential,
                })
            }
            (Ok(()), Err(cause)) => {
                warn!(user_id = %id, error = %cause, "credential update failed after profile update");
                Err(Error::PartialUpdateFailure {
                    updated: RecordKind::Profile,
                    failed: RecordKind::Credential,
                    cause: Box::new(cause),
                })
            }
            (Err(cause), Ok(())) => {
                warn!(user_id = %id, error = %cause, "profile update failed after credential update");
                Err(Error::PartialUpdateFailure {
                    updated: RecordKind::Credential,
                    failed: RecordKind::Profile,
                    cause: Box::new(cause),
                })
            }
            (Err(profile_error), Err(credential_error)) => {
                error!(
                    user_id = %id,
                    profile_error = %profile_error,
                    credential_error = %credential_error,
                    "identity update failed on both records",
                );
                Err(profile_error)
            }
        }
    }

    async fn record_failed_login(
        &self,
        request: RecordFailedLoginRequest,
        cancel: &CancellationToken,
    ) -> Result<Identity, Error> {
        let RecordFailedLoginRequest { username, reason } = request;
        if reason.trim().is_empty() {
            return Err(LoginFailureViolation::MissingReason.into());
        }

        let mut credential = self
            .step(
                StoreStep::CredentialLookup,
                cancel,
                self.credentials.find_by_username(&username),
            )
            .await?
            .ok_or_else(|| Error::not_found(RecordKind::Credential, username.as_str()))?;
        let id = credential.user_id.clone();

        let (record, profile) = tokio::try_join!(
            self.step(StoreStep::IdentityLookup, cancel, self.identities.find_by_id(&id)),
            self.step(StoreStep::ProfileLookup, cancel, self.profiles.find_by_id(&id)),
        )?;
        let record = record.ok_or_else(|| Error::not_found(RecordKind::Identity, id.as_ref()))?;
        let profile = profile.ok_or_else(|| Error::not_found(RecordKind::Profile, id.as_ref()))?;

        let now = self.clock.utc();
        credential.failed_login_attempts = credential.failed_login_attempts.saturating_add(1);
        credential.last_failed_login = Some(now);
        credential.last_failed_login_reason = reason;
        credential.updated_at = now;
        if self.policy.locks_at(credential.failed_login_attempts) {
            credential.account_locked_until = Some(now + self.policy.lockout);
            credential.account_locked_reason = format!(
                "locked after {} failed login attempts",
                credential.failed_login_attempts
            );
            warn!(
                user_id = %id,
                attempts = credential.failed_login_attempts,
                "account locked after repeated failed logins",
            );
        }
        validation::validate_login_failure(credential.login_failures(), now)?;

        self.step(
            StoreStep::CredentialUpdate,
            cancel,
            self.credentials.update(&credential),
        )
        .await?;

        debug!(user_id = %id, attempts = credential.failed_login_attempts, "failed login recorded");
        Ok(Identity {
            id: record.id,
            profile,
            credential,
        })
    }
}

#[cfg(test)]
#[path = "identity_service_tests.rs"]
mod tests;
