//! In-memory document stores.
//!
//! Each store keeps its documents in a `HashMap` behind a `tokio` read/write
//! lock and maintains the unique indexes a document database would enforce.
//! They back local runs and integration tests; nothing is persisted.

mod credential_store;
mod identity_store;
mod profile_store;

pub use credential_store::InMemoryCredentialStore;
pub use identity_store::InMemoryIdentityStore;
pub use profile_store::InMemoryProfileStore;
