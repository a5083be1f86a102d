//! Port for one-way password hashing.
//!
//! Hashing is CPU bound and synchronous; the identity service moves calls
//! onto the blocking thread pool.

use secrecy::SecretString;

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential hashers.
    pub enum HashingError {
        /// Hash computation failed.
        Hash { message } => "password hashing failed: {message}",
        /// A stored hash could not be decoded.
        MalformedHash { message } => "stored password hash is malformed: {message}",
    }
}

/// Salted, deliberately slow password hashing.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password with a fresh salt.
    fn hash(&self, plaintext: &SecretString) -> Result<PasswordHash, HashingError>;

    /// Check a plaintext password against a stored hash in constant time.
    ///
    /// Returns `Ok(false)` on mismatch; errors are reserved for hashes that
    /// cannot be decoded.
    fn verify(&self, plaintext: &SecretString, hash: &PasswordHash)
    -> Result<bool, HashingError>;
}
