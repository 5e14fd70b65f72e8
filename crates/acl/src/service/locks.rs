//! Per-entry critical sections
//!
//! [`EntryLocks`] hands out one async mutex per (credential, actor) pair.
//! Grants and deletes for a pair take it, so they reach the store one at a
//! time and in the order they acquired it. The entry for a pair is dropped
//! again once nobody holds or waits on it.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Lock table keyed by (credential uuid, actor)
#[derive(Debug, Default)]
pub struct EntryLocks {
    locks: DashMap<(Uuid, String), Arc<Mutex<()>>>,
}

impl EntryLocks {
    /// Create empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one pair
    pub async fn lock(&self, credential_uuid: Uuid, actor: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry((credential_uuid, actor.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Drop the lock for a pair nobody holds or waits on
    pub fn release_idle(&self, credential_uuid: Uuid, actor: &str) {
        self.locks
            .remove_if(&(credential_uuid, actor.to_string()), |_, mutex| {
                Arc::strong_count(mutex) == 1
            });
    }

    /// Number of pairs with a lock allocated
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Check if no lock is allocated
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
