//! In-memory stores.
//!
//! Process-lifetime storage for tests, tooling and single-node use. Both
//! stores can be switched offline to exercise storage-failure paths.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{LedgerStore, PlacementStore, PoolWrite, StoreError};
use crate::domain::{AccountSnapshot, ParticipantId, Placement};

fn check_online(offline: &AtomicBool) -> Result<(), StoreError> {
    if offline.load(Ordering::SeqCst) {
        return Err(StoreError::Unavailable("in-memory store switched offline".to_string()));
    }
    Ok(())
}

/// In-memory account store.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    accounts: Arc<DashMap<ParticipantId, AccountSnapshot>>,
    /// Serializes batches so the check and the writes are one step
    batch: Arc<Mutex<()>>,
    offline: Arc<AtomicBool>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load(
        &self,
        participant: ParticipantId,
    ) -> Result<Option<AccountSnapshot>, StoreError> {
        check_online(&self.offline)?;
        Ok(self.accounts.get(&participant).map(|a| a.clone()))
    }

    async fn create(&self, participant: ParticipantId) -> Result<bool, StoreError> {
        check_online(&self.offline)?;
        let mut created = false;
        self.accounts.entry(participant).or_insert_with(|| {
            created = true;
            AccountSnapshot::new(participant)
        });
        Ok(created)
    }

    async fn store_batch(&self, writes: &[PoolWrite]) -> Result<(), StoreError> {
        check_online(&self.offline)?;
        let _batch = self.batch.lock().await;

        // Validate first so a rejected batch leaves every pool untouched
        for write in writes {
            let current = self
                .accounts
                .get(&write.participant)
                .map(|account| account.pool(write.pool))
                .ok_or_else(|| {
                    StoreError::Corrupt(format!("write to missing account {}", write.participant))
                })?;

            if current != write.expected {
                return Err(StoreError::Conflict {
                    participant: write.participant,
                    pool: write.pool,
                });
            }
        }

        for write in writes {
            if let Some(mut account) = self.accounts.get_mut(&write.participant) {
                *account.pool_mut(write.pool) = write.balance;
            }
        }
        Ok(())
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<AccountSnapshot>, StoreError> {
        check_online(&self.offline)?;
        let mut accounts: Vec<AccountSnapshot> =
            self.accounts.iter().map(|a| a.value().clone()).collect();

        accounts.sort_by(|a, b| {
            b.total()
                .cmp(&a.total())
                .then_with(|| a.participant.cmp(&b.participant))
        });

        Ok(accounts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        check_online(&self.offline)?;
        Ok(self.accounts.len() as u64)
    }
}

/// In-memory placement store.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlacementStore {
    placements: Arc<RwLock<Vec<Placement>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryPlacementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlacementStore for MemoryPlacementStore {
    async fn load_all(&self) -> Result<Vec<Placement>, StoreError> {
        check_online(&self.offline)?;
        Ok(self.placements.read().await.clone())
    }

    async fn insert(&self, placement: &Placement) -> Result<(), StoreError> {
        check_online(&self.offline)?;
        self.placements.write().await.push(placement.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        check_online(&self.offline)?;
        let mut placements = self.placements.write().await;
        let before = placements.len();
        placements.retain(|p| p.id != id);
        Ok(placements.len() != before)
    }
}
