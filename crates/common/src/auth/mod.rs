//! Credential storage
//!
//! The API client reads the current access token, refresh token and locale
//! preference through [`CredentialStore`] on every outbound request. The store
//! is pure storage: it never refreshes or validates anything.
//!
//! # Module Organization
//!
//! - **[`store`]**: the storage contract and the in-memory implementation
//! - **[`keychain`]** (`platform` feature): session-durable storage in the
//!   platform keychain

#[cfg(feature = "platform")]
mod keychain;
pub mod store;

#[cfg(feature = "platform")]
pub use keychain::KeychainCredentialStore;
pub use store::{CredentialStore, CredentialStoreError, MemoryCredentialStore};
