//! Outbound adapters implementing domain ports.
//!
//! - **memory**: in-memory profile, credential, and identity stores
//! - **hashing**: Argon2id credential hasher
//!
//! Adapters translate between domain types and their backing representation.
//! They contain no business logic.

pub mod hashing;
pub mod memory;
