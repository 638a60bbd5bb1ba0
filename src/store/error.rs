//! Store Errors
//!
//! Failures of the backing store. These never say anything about whether an
//! account or placement exists.

use crate::domain::{HasStatus, ParticipantId, Pool, Status};

/// Errors that can occur in a ledger or placement store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Store could not be reached (offline, pool exhausted, ...)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Pool changed between read and write
    #[error("Concurrent update of {pool} of {participant}")]
    Conflict { participant: ParticipantId, pool: Pool },

    /// A stored record violates a domain invariant
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Check if this is a compare-and-set conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Unavailable(_) | StoreError::Conflict { .. } => true,
            StoreError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            StoreError::Corrupt(_) => false,
        }
    }
}

impl HasStatus for StoreError {
    fn status(&self) -> Status {
        Status::StorageUnavailable
    }
}
