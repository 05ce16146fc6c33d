//! Keychain-backed credential store
//!
//! Layers the [`CredentialStore`] contract over the generic
//! [`KeychainProvider`]; every key becomes one keychain entry under the
//! provider's service name, so credentials survive process restarts.

use tracing::warn;

use super::store::{CredentialStore, CredentialStoreError};
use crate::security::{KeychainError, KeychainProvider};

/// Session-durable credential store in the platform keychain
#[derive(Debug, Clone)]
pub struct KeychainCredentialStore {
    keychain: KeychainProvider,
}

impl KeychainCredentialStore {
    /// Store under `service_name` in the platform keychain
    pub fn new(service_name: impl Into<String>) -> Self {
        Self { keychain: KeychainProvider::new(service_name) }
    }

    /// Store over an existing provider
    pub fn from_provider(keychain: KeychainProvider) -> Self {
        Self { keychain }
    }
}

impl CredentialStore for KeychainCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, CredentialStoreError> {
        match self.keychain.get_secret(key) {
            Ok(value) => Ok(Some(value)),
            Err(KeychainError::NotFound) => Ok(None),
            Err(e) => {
                warn!(service = %self.keychain.service_name(), key = %key, error = %e, "keychain read failed");
                Err(CredentialStoreError::Unavailable(e.to_string()))
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CredentialStoreError> {
        self.keychain
            .set_secret(key, value)
            .map_err(|e| CredentialStoreError::Unavailable(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), CredentialStoreError> {
        self.keychain.delete_secret(key).map_err(|e| CredentialStoreError::Unavailable(e.to_string()))
    }
}
