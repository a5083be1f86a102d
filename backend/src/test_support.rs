//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`). Only
//! compiled for tests or with the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, NaiveDate, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use secrecy::SecretString;

use crate::domain::ports::CreateIdentityRequest;
use crate::domain::{AccountStatus, IdentityService, NewCredential, ProfileDetails};
use crate::outbound::hashing::Argon2CredentialHasher;
use crate::outbound::memory::{
    InMemoryCredentialStore, InMemoryIdentityStore, InMemoryProfileStore,
};

/// Clock whose current instant is set by the test.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    /// Jump the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Fixed instant used as "now" across the suites: 2025-06-15 12:00 UTC.
pub fn fixture_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).single() {
        Some(now) => now,
        None => panic!("valid fixture timestamp"),
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("valid fixture date {year}-{month}-{day}"),
    }
}

/// Profile fields that satisfy every rule.
pub fn valid_profile() -> ProfileDetails {
    ProfileDetails {
        first_name: "João".to_owned(),
        last_name: "Silva".to_owned(),
        email: "joao@x.com".to_owned(),
        birth_date: date(2000, 8, 10),
        phone: "+5541999999999".to_owned(),
        profile_image_url: None,
    }
}

/// Credential fields that satisfy every rule.
pub fn valid_credential() -> NewCredential {
    NewCredential {
        username: "joao.silva".to_owned(),
        password: SecretString::from("ValidPass123!".to_owned()),
        account_status: AccountStatus::Active,
        status_reason: String::new(),
    }
}

/// Create request built from [`valid_profile`] and [`valid_credential`].
pub fn valid_request() -> CreateIdentityRequest {
    CreateIdentityRequest {
        profile: valid_profile(),
        credential: valid_credential(),
    }
}

/// Create request for a second, distinct user.
pub fn other_request() -> CreateIdentityRequest {
    CreateIdentityRequest {
        profile: ProfileDetails {
            first_name: "Maria".to_owned(),
            last_name: "Souza Lima".to_owned(),
            email: "maria@example.com".to_owned(),
            birth_date: date(1988, 2, 29),
            phone: "(11) 98888-7777".to_owned(),
            profile_image_url: Some("https://cdn.example.com/maria.png".to_owned()),
        },
        credential: NewCredential {
            username: "maria_souza".to_owned(),
            password: SecretString::from("An0ther$Secret".to_owned()),
            account_status: AccountStatus::Pending,
            status_reason: "email confirmation".to_owned(),
        },
    }
}

/// Argon2id hasher with the smallest accepted cost, for fast tests.
pub fn fast_hasher() -> Argon2CredentialHasher {
    match Argon2CredentialHasher::new(8, 1, 1) {
        Ok(hasher) => hasher,
        Err(err) => panic!("test hasher parameters rejected: {err}"),
    }
}

/// Service wired to in-memory stores.
pub type MemoryIdentityService = IdentityService<
    InMemoryProfileStore,
    InMemoryCredentialStore,
    InMemoryIdentityStore,
    Argon2CredentialHasher,
>;

/// In-memory stores shared with a [`MemoryIdentityService`].
#[derive(Clone, Default)]
pub struct MemoryStores {
    /// Profile documents.
    pub profiles: Arc<InMemoryProfileStore>,
    /// Credential documents.
    pub credentials: Arc<InMemoryCredentialStore>,
    /// Linking records.
    pub identities: Arc<InMemoryIdentityStore>,
}

impl MemoryStores {
    /// Wire a service over these stores with a fast hasher.
    pub fn service(&self, clock: Arc<MutableClock>) -> MemoryIdentityService {
        IdentityService::new(
            Arc::clone(&self.profiles),
            Arc::clone(&self.credentials),
            Arc::clone(&self.identities),
            Arc::new(fast_hasher()),
            clock,
        )
    }
}
