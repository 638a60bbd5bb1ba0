//! Store module
//!
//! Persistence seam behind the ledger and the bank registry.
//! In-memory implementations for tests and single-process use, PostgreSQL
//! implementations for durable deployments.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AccountSnapshot, Balance, ParticipantId, Placement, Pool};

pub use error::StoreError;
pub use memory::{MemoryLedgerStore, MemoryPlacementStore};
pub use postgres::{PgLedgerStore, PgPlacementStore};

/// New value for one pool of one existing account, conditional on the
/// value the writer last read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolWrite {
    pub participant: ParticipantId,
    pub pool: Pool,
    /// Value the pool must still hold for the write to apply
    pub expected: Balance,
    pub balance: Balance,
}

impl PoolWrite {
    pub fn new(
        participant: ParticipantId,
        pool: Pool,
        expected: Balance,
        balance: Balance,
    ) -> Self {
        Self {
            participant,
            pool,
            expected,
            balance,
        }
    }
}

/// Keyed store of participant accounts.
///
/// Writes are compare-and-set: a pool whose value changed since it was read
/// rejects the write with `StoreError::Conflict`. Ledgers in other tasks or
/// processes sharing the store therefore never lose each other's updates.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load both pools of an account, `None` if it was never created.
    async fn load(&self, participant: ParticipantId) -> Result<Option<AccountSnapshot>, StoreError>;

    /// Create an account with zero balances. Returns `false` if it already existed.
    async fn create(&self, participant: ParticipantId) -> Result<bool, StoreError>;

    /// Apply all writes or none of them. Every target account must exist and
    /// every target pool must still hold its `expected` value.
    async fn store_batch(&self, writes: &[PoolWrite]) -> Result<(), StoreError>;

    /// Accounts ordered by total holdings (descending), then participant id.
    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<AccountSnapshot>, StoreError>;

    /// Number of accounts
    async fn count(&self) -> Result<u64, StoreError>;

    /// Write a single pool
    async fn store(&self, write: PoolWrite) -> Result<(), StoreError> {
        self.store_batch(std::slice::from_ref(&write)).await
    }
}

/// Store of bank placements, kept in insertion order.
#[async_trait]
pub trait PlacementStore: Send + Sync {
    /// All placements, oldest first
    async fn load_all(&self) -> Result<Vec<Placement>, StoreError>;

    async fn insert(&self, placement: &Placement) -> Result<(), StoreError>;

    /// Returns `false` if no placement had this id.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}
