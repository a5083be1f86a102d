//! Identity service library.
//!
//! The domain layer validates and orchestrates identity operations behind
//! ports; outbound adapters provide in-memory stores and an Argon2id hasher.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod telemetry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
