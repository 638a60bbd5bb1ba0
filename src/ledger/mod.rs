//! Ledger module
//!
//! Owns the (bank, wallet) pools of every participant. Reads, absolute sets
//! and relative adjustments are linearizable per `(participant, pool)` key;
//! different keys proceed in parallel.
//!
//! Within one `Ledger` a key lock serializes writers. Across ledgers or
//! processes sharing a store, compare-and-set writes detect interleaving and
//! the losing side re-reads and retries.

mod error;
mod locks;

use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{AccountSnapshot, Amount, Balance, Direction, ParticipantId, Pool};
use crate::store::{LedgerStore, PoolWrite};

pub use error::LedgerError;
pub(crate) use locks::{KeyGuard, LockKey};
use locks::KeyLocks;

/// Attempts per mutation before a write conflict is returned
pub(crate) const MAX_WRITE_ATTEMPTS: u32 = 16;

/// Randomized, exponentially growing pause after the given failed attempt
fn conflict_backoff(attempt: u32) -> Duration {
    let ceiling = 1u64 << attempt.min(6);
    Duration::from_millis(rand::thread_rng().gen_range(0..=ceiling))
}

/// Run `attempt_once` until it succeeds, fails with something other than a
/// write conflict, or runs out of attempts.
pub(crate) async fn retry_on_conflict<T, F, Fut>(
    operation: &'static str,
    mut attempt_once: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let mut attempt = 1;
    loop {
        match attempt_once().await {
            Err(e) if e.is_conflict() && attempt < MAX_WRITE_ATTEMPTS => {
                tokio::time::sleep(conflict_backoff(attempt)).await;
                tracing::warn!(
                    "Write conflict in {}, retrying (attempt {}/{})",
                    operation,
                    attempt,
                    MAX_WRITE_ATTEMPTS
                );
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Compute the value of a pool after adjusting it by `delta`.
pub fn apply_delta(
    participant: ParticipantId,
    pool: Pool,
    current: Balance,
    delta: &Amount,
    direction: Direction,
) -> Result<Balance, LedgerError> {
    match direction {
        Direction::Increase => Ok(current.credit(delta)?),
        Direction::Decrease => {
            if !current.is_sufficient_for(delta) {
                return Err(LedgerError::insufficient_funds(
                    participant,
                    pool,
                    delta.value(),
                    current.value(),
                ));
            }
            Ok(current.debit(delta)?)
        }
    }
}

/// Participant ledger over a [`LedgerStore`].
pub struct Ledger<S> {
    store: Arc<S>,
    locks: KeyLocks,
}

impl<S: LedgerStore> Ledger<S> {
    pub fn new(store: S) -> Self {
        Self::with_shared_store(Arc::new(store))
    }

    pub fn with_shared_store(store: Arc<S>) -> Self {
        Self {
            store,
            locks: KeyLocks::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Provision an account with zero balances.
    ///
    /// Returns `true` if the account was created, `false` if it already existed.
    pub async fn open_account(&self, participant: ParticipantId) -> Result<bool, LedgerError> {
        let created = self.store.create(participant).await.inspect_err(|e| {
            tracing::error!(participant = %participant, error = %e, "Failed to open account");
        })?;

        if created {
            tracing::info!(participant = %participant, "Opened economy account");
        }
        Ok(created)
    }

    /// Both pools of an account.
    pub async fn account(
        &self,
        participant: ParticipantId,
    ) -> Result<AccountSnapshot, LedgerError> {
        self.store
            .load(participant)
            .await
            .inspect_err(|e| {
                tracing::error!(participant = %participant, error = %e, "Failed to load account");
            })?
            .ok_or(LedgerError::NoSuchParticipant(participant))
    }

    /// Current value of one pool.
    pub async fn get_value(
        &self,
        participant: ParticipantId,
        pool: Pool,
    ) -> Result<Balance, LedgerError> {
        Ok(self.account(participant).await?.pool(pool))
    }

    /// Overwrite one pool of an existing account.
    ///
    /// Returns the stored value.
    pub async fn set_value(
        &self,
        participant: ParticipantId,
        pool: Pool,
        value: Amount,
    ) -> Result<Balance, LedgerError> {
        let _guard = self.locks.lock((participant, pool)).await;
        let balance = Balance::from(value);

        // Existence check and write happen under the same key lock
        let previous = retry_on_conflict("set_value", move || async move {
            let previous = self.account(participant).await?.pool(pool);
            self.write(PoolWrite::new(participant, pool, previous, balance)).await?;
            Ok::<_, LedgerError>(previous)
        })
        .await?;

        tracing::debug!(
            participant = %participant,
            pool = %pool,
            previous = %previous,
            balance = %balance,
            "Pool value set"
        );
        Ok(balance)
    }

    /// Add to or subtract from one pool of an existing account.
    ///
    /// Returns the value exactly after this adjustment. A decrease larger
    /// than the current value fails with `InsufficientFunds` and changes
    /// nothing.
    pub async fn adjust_value(
        &self,
        participant: ParticipantId,
        pool: Pool,
        delta: Amount,
        direction: Direction,
    ) -> Result<Balance, LedgerError> {
        let _guard = self.locks.lock((participant, pool)).await;

        let balance = retry_on_conflict("adjust_value", move || async move {
            let current = self.account(participant).await?.pool(pool);
            let balance = apply_delta(participant, pool, current, &delta, direction)
                .inspect_err(|e| {
                    tracing::debug!(
                        participant = %participant,
                        pool = %pool,
                        "Adjustment rejected: {}",
                        e
                    );
                })?;

            self.write(PoolWrite::new(participant, pool, current, balance)).await?;
            Ok::<_, LedgerError>(balance)
        })
        .await?;

        tracing::debug!(
            participant = %participant,
            pool = %pool,
            ?direction,
            delta = %delta,
            balance = %balance,
            "Pool value adjusted"
        );
        Ok(balance)
    }

    /// Accounts ordered by total holdings, `limit` entries starting at `offset`.
    pub async fn overview(
        &self,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<AccountSnapshot>, LedgerError> {
        Ok(self.store.list(offset, limit).await?)
    }

    /// Number of provisioned accounts
    pub async fn participant_count(&self) -> Result<u64, LedgerError> {
        Ok(self.store.count().await?)
    }

    /// Number of keys currently locked or waited on
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    pub(crate) async fn lock_keys(&self, keys: Vec<LockKey>) -> Vec<KeyGuard> {
        self.locks.lock_all(keys).await
    }

    /// Persist writes atomically. Callers must hold the locks of every key.
    pub(crate) async fn write_batch(&self, writes: &[PoolWrite]) -> Result<(), LedgerError> {
        self.store.store_batch(writes).await.map_err(|e| {
            if !e.is_conflict() {
                tracing::error!(writes = writes.len(), error = %e, "Failed to persist balances");
            }
            LedgerError::from(e)
        })
    }

    async fn write(&self, write: PoolWrite) -> Result<(), LedgerError> {
        self.write_batch(std::slice::from_ref(&write)).await
    }
}
