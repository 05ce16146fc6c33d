//! Response cache with per-entry expiry
//!
//! Time is passed in by the caller; the cache itself never reads a clock.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::Value;

use super::fingerprint::Fingerprint;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Successful read payloads keyed by fingerprint
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<Fingerprint, CacheEntry>,
}

impl ResponseCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Live payload for `key`. An expired entry is evicted on lookup.
    pub fn get(&mut self, key: &Fingerprint, now: Instant) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.payload.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `payload` for `key` until `expires_at`, replacing any earlier entry.
    pub fn insert(&mut self, key: Fingerprint, payload: Value, expires_at: Instant) {
        self.entries.insert(key, CacheEntry { payload, expires_at });
    }

    /// Drop every entry. Returns how many were held.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Evict every entry that is no longer live at `now`.
    ///
    /// Lookups only evict the key they touch; this sweeps entries for
    /// fingerprints nobody reads again. Returns how many were evicted.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before - self.entries.len()
    }

    /// Number of entries still live at `now`.
    pub fn live_len(&self, now: Instant) -> usize {
        self.entries.values().filter(|entry| entry.is_live(now)).count()
    }
}
