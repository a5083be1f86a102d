//! Identity service configuration loaded via OrthoConfig.
//!
//! Values come from `IDENTITY_*` environment variables, command-line flags,
//! or a configuration file. Unset keys fall back to the defaults below.

use std::time::Duration;

use chrono::FixedOffset;
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_STEP_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_MAX_FAILED_LOGIN_ATTEMPTS: u32 = 5;
const DEFAULT_LOCKOUT_MINUTES: u32 = 15;
const DEFAULT_ARGON2_MEMORY_KIB: u32 = 19_456;
const DEFAULT_ARGON2_ITERATIONS: u32 = 2;
const DEFAULT_ARGON2_PARALLELISM: u32 = 1;

/// Settings for the identity service and its adapters.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "IDENTITY")]
pub struct IdentitySettings {
    /// Emit logs as JSON lines.
    #[ortho_config(default = false)]
    pub json_logs: bool,
    /// Per store-call timeout in milliseconds.
    pub step_timeout_ms: Option<u64>,
    /// Failed logins before the account is locked; 0 disables locking.
    pub max_failed_login_attempts: Option<u32>,
    /// Lock duration in minutes.
    pub lockout_minutes: Option<u32>,
    /// Argon2 memory cost in KiB.
    pub argon2_memory_kib: Option<u32>,
    /// Argon2 iteration count.
    pub argon2_iterations: Option<u32>,
    /// Argon2 degree of parallelism.
    pub argon2_parallelism: Option<u32>,
    /// Offset from UTC, in minutes, of the calendar used for birth dates.
    pub utc_offset_minutes: Option<i32>,
}

impl IdentitySettings {
    /// Per store-call timeout.
    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms.unwrap_or(DEFAULT_STEP_TIMEOUT_MS))
    }

    /// Failed logins that lock an account; 0 disables locking.
    pub fn max_failed_login_attempts(&self) -> u32 {
        self.max_failed_login_attempts
            .unwrap_or(DEFAULT_MAX_FAILED_LOGIN_ATTEMPTS)
    }

    /// Lock duration in minutes.
    pub fn lockout_minutes(&self) -> u32 {
        self.lockout_minutes.unwrap_or(DEFAULT_LOCKOUT_MINUTES)
    }

    /// Argon2 memory cost in KiB.
    pub fn argon2_memory_kib(&self) -> u32 {
        self.argon2_memory_kib.unwrap_or(DEFAULT_ARGON2_MEMORY_KIB)
    }

    /// Argon2 iteration count.
    pub fn argon2_iterations(&self) -> u32 {
        self.argon2_iterations.unwrap_or(DEFAULT_ARGON2_ITERATIONS)
    }

    /// Argon2 lanes.
    pub fn argon2_parallelism(&self) -> u32 {
        self.argon2_parallelism
            .unwrap_or(DEFAULT_ARGON2_PARALLELISM)
    }

    /// Calendar offset used to derive "today"; UTC when unset.
    ///
    /// Returns `None` when the configured offset is a day or more.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        let minutes = self.utc_offset_minutes.unwrap_or(0);
        FixedOffset::east_opt(minutes.checked_mul(60)?)
    }
}
