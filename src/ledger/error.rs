//! Ledger Errors

use rust_decimal::Decimal;

use crate::domain::{AmountError, HasStatus, ParticipantId, Pool, Status};
use crate::store::StoreError;

/// Errors returned by ledger operations. A failed call never changes a balance.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Account was never created
    #[error("No such participant: {0}")]
    NoSuchParticipant(ParticipantId),

    /// Decrease would drive the pool below zero
    #[error("Insufficient funds in {pool} of {participant}: requested {requested}, available {available}")]
    InsufficientFunds {
        participant: ParticipantId,
        pool: Pool,
        requested: Decimal,
        available: Decimal,
    },

    /// Result would leave the representable range
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] AmountError),

    /// Backing store failed
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl LedgerError {
    pub fn insufficient_funds(
        participant: ParticipantId,
        pool: Pool,
        requested: Decimal,
        available: Decimal,
    ) -> Self {
        Self::InsufficientFunds {
            participant,
            pool,
            requested,
            available,
        }
    }

    /// Check if another writer changed the pool first
    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::Storage(e) if e.is_conflict())
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Storage(e) if e.is_retryable())
    }
}

impl HasStatus for LedgerError {
    fn status(&self) -> Status {
        match self {
            LedgerError::NoSuchParticipant(_) => Status::NoSuchParticipant,
            LedgerError::InsufficientFunds { .. } => Status::InsufficientFunds,
            LedgerError::InvalidInput(_) => Status::InvalidInput,
            LedgerError::Storage(_) => Status::StorageUnavailable,
        }
    }
}
