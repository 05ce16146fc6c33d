//! Platform keychain access

pub mod keychain;

pub use keychain::{KeychainError, KeychainProvider};
