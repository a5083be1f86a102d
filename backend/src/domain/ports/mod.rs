//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod credential_hasher;
mod credential_store;
mod identity_command;
mod identity_store;
mod profile_store;

#[cfg(test)]
pub use credential_hasher::MockCredentialHasher;
pub use credential_hasher::{CredentialHasher, HashingError};
#[cfg(test)]
pub use credential_store::MockCredentialStore;
pub use credential_store::{CredentialStore, CredentialStoreError};
#[cfg(test)]
pub use identity_command::MockIdentityCommand;
pub use identity_command::{CreateIdentityRequest, IdentityCommand, RecordFailedLoginRequest};
#[cfg(test)]
pub use identity_store::MockIdentityStore;
pub use identity_store::{IdentityStore, IdentityStoreError};
#[cfg(test)]
pub use profile_store::MockProfileStore;
pub use profile_store::{ProfileStore, ProfileStoreError};
