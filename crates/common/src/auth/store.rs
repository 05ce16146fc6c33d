//! Credential store contract and in-memory implementation

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

/// Error type for credential store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialStoreError {
    /// The backing store could not be read or written
    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

/// Key/value storage for credentials and session preferences.
///
/// Implementations must be cheap to call: the outgoing interceptor reads from
/// the store synchronously on every request.
pub trait CredentialStore: Send + Sync {
    /// Read a value; `Ok(None)` when nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, CredentialStoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CredentialStoreError>;

    /// Remove a value. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), CredentialStoreError>;
}

/// Process-local credential store
///
/// Used for ephemeral sessions and as the test double for the keychain.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { values: RwLock::new(values) }
    }

    /// True when no value is held under any key
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, CredentialStoreError> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CredentialStoreError> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CredentialStoreError> {
        self.values.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_none_for_missing_key() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get("access_token").unwrap(), None);
    }

    #[test]
    fn set_overwrites_previous_value() {
        let store = MemoryCredentialStore::with_entries([("access_token", "A1")]);

        store.set("access_token", "A2").unwrap();

        assert_eq!(store.get("access_token").unwrap().as_deref(), Some("A2"));
    }

    #[test]
    fn remove_is_idempotent() {
        let store = MemoryCredentialStore::with_entries([("refresh_token", "R1")]);

        store.remove("refresh_token").unwrap();
        store.remove("refresh_token").unwrap();

        assert!(store.is_empty());
    }
}
