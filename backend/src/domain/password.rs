//! Password hash value type.

use std::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Salted one-way password hash encoded as a PHC string.
///
/// `Debug` output is redacted and equality is constant-time.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded PHC hash string.
    pub fn from_phc(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded PHC string, for storage adapters and verifiers only.
    pub fn expose_phc(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for PasswordHash {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl Eq for PasswordHash {}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}
