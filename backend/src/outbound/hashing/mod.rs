//! Argon2id credential hasher.
//!
//! Produces self-describing PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`)
//! so verification always uses the parameters a hash was created with, even
//! after the configured cost changes.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use secrecy::{ExposeSecret, SecretString};

use crate::config::IdentitySettings;
use crate::domain::PasswordHash;
use crate::domain::ports::{CredentialHasher, HashingError};

/// Argon2id hasher with fixed cost parameters.
#[derive(Clone)]
pub struct Argon2CredentialHasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for Argon2CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2CredentialHasher").finish_non_exhaustive()
    }
}

impl Argon2CredentialHasher {
    /// Build a hasher from explicit cost parameters.
    ///
    /// `memory_kib` must be at least eight times `parallelism`.
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, HashingError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|err| HashingError::hash(format!("invalid argon2 parameters: {err}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Build a hasher from loaded settings.
    pub fn from_settings(settings: &IdentitySettings) -> Result<Self, HashingError> {
        Self::new(
            settings.argon2_memory_kib(),
            settings.argon2_iterations(),
            settings.argon2_parallelism(),
        )
    }
}

impl CredentialHasher for Argon2CredentialHasher {
    fn hash(&self, plaintext: &SecretString) -> Result<PasswordHash, HashingError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.expose_secret().as_bytes(), &salt)
            .map_err(|err| HashingError::hash(err.to_string()))?;
        Ok(PasswordHash::from_phc(hash.to_string()))
    }

    fn verify(
        &self,
        plaintext: &SecretString,
        hash: &PasswordHash,
    ) -> Result<bool, HashingError> {
        let parsed = argon2::PasswordHash::new(hash.expose_phc())
            .map_err(|err| HashingError::malformed_hash(err.to_string()))?;
        match self
            .argon2
            .verify_password(plaintext.expose_secret().as_bytes(), &parsed)
        {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(HashingError::hash(err.to_string())),
        }
    }
}
