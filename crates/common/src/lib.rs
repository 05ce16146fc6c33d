//! Modular common utilities shared across Lingua crates.
//!
//! # Feature Tiers
//!
//! - default: clock abstraction and the credential store contract with an
//!   in-memory implementation
//! - `platform`: platform keychain integration (`keyring`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod clock;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod security;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{CredentialStore, CredentialStoreError, MemoryCredentialStore};
#[cfg(feature = "platform")]
pub use auth::KeychainCredentialStore;
pub use clock::{Clock, MockClock, SystemClock};
#[cfg(feature = "platform")]
pub use security::{KeychainError, KeychainProvider};
