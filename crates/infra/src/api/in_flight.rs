//! Registry of reads that are currently on the wire

use std::collections::HashMap;

use futures::future::{BoxFuture, Shared};
use serde_json::Value;

use super::errors::ApiError;
use super::fingerprint::Fingerprint;

/// Settled outcome of one dispatched read, awaitable by any number of callers.
pub type SharedRead = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

struct Pending {
    ticket: u64,
    outcome: SharedRead,
}

/// At most one pending read per fingerprint.
///
/// Every registration gets a ticket; only the holder of the current ticket
/// may remove the entry, so a late settle never evicts a newer read.
#[derive(Default)]
pub struct InFlightRegistry {
    pending: HashMap<Fingerprint, Pending>,
    next_ticket: u64,
}

impl InFlightRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of the read pending for `key`, if any.
    pub fn get(&self, key: &Fingerprint) -> Option<SharedRead> {
        self.pending.get(key).map(|pending| pending.outcome.clone())
    }

    /// True if a read for `key` is pending
    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.pending.contains_key(key)
    }

    /// Reserve a ticket for a read about to be registered.
    pub fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Record `outcome` as the pending read for `key` under `ticket`.
    pub fn register(&mut self, key: Fingerprint, ticket: u64, outcome: SharedRead) {
        self.pending.insert(key, Pending { ticket, outcome });
    }

    /// Remove the entry for `key` if `ticket` still owns it.
    pub fn settle(&mut self, key: &Fingerprint, ticket: u64) -> bool {
        match self.pending.get(key) {
            Some(pending) if pending.ticket == ticket => {
                self.pending.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Number of pending reads
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
