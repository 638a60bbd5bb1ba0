//! Per-key lock arena.
//!
//! One async mutex per `(participant, pool)` key, created on first use and
//! dropped once nobody holds or waits for it.
//! Unrelated keys never contend.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::{ParticipantId, Pool};

pub(crate) type LockKey = (ParticipantId, Pool);

type LockMap = DashMap<LockKey, Arc<Mutex<()>>>;

/// Exclusive hold on one key. The map entry is dropped together with the
/// last guard or waiter of its key.
pub(crate) struct KeyGuard {
    key: LockKey,
    locks: Arc<LockMap>,
    mutex: Option<Arc<Mutex<()>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.mutex.take();
        // Runs under the shard lock, so no other task can clone the mutex meanwhile
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[derive(Debug, Default)]
pub(crate) struct KeyLocks {
    locks: Arc<LockMap>,
}

impl KeyLocks {
    pub(crate) async fn lock(&self, key: LockKey) -> KeyGuard {
        // The shard guard is released here, before anyone awaits the mutex
        let mutex = Arc::clone(&self.locks.entry(key).or_default());

        // Built before awaiting so a cancelled acquisition still cleans up
        let mut held = KeyGuard {
            key,
            locks: Arc::clone(&self.locks),
            mutex: Some(Arc::clone(&mutex)),
            guard: None,
        };
        held.guard = Some(mutex.lock_owned().await);
        held
    }

    /// Lock several keys. Keys are taken in sorted order so that two callers
    /// locking overlapping sets cannot deadlock.
    pub(crate) async fn lock_all(&self, mut keys: Vec<LockKey>) -> Vec<KeyGuard> {
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.lock(key).await);
        }
        guards
    }

    /// Keys currently held or waited on
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}
