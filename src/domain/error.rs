//! Status codes
//!
//! Flat status-code view over the typed errors of the ledger, the registry
//! and boundary validation. Every call maps to exactly one code.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::AmountError;

/// Outcome code of a single core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    /// Targeted account does not exist
    NoSuchParticipant,
    /// Decrease would drive a pool below zero
    InsufficientFunds,
    /// Placement would violate the minimum separation
    TooClose,
    /// No placement within the interaction radius
    NotFound,
    /// Rejected at the boundary before reaching the core
    InvalidInput,
    /// Backing store failed; says nothing about account existence
    StorageUnavailable,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::NoSuchParticipant => "no_such_participant",
            Status::InsufficientFunds => "insufficient_funds",
            Status::TooClose => "too_close",
            Status::NotFound => "not_found",
            Status::InvalidInput => "invalid_input",
            Status::StorageUnavailable => "storage_unavailable",
        }
    }

    /// Collapse a typed result into its status code.
    pub fn of<T, E: HasStatus>(result: &Result<T, E>) -> Status {
        match result {
            Ok(_) => Status::Success,
            Err(e) => e.status(),
        }
    }

    pub fn is_success(&self) -> bool {
        *self == Status::Success
    }

    /// Client-recoverable outcomes; retrying unchanged will not help.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Status::Success | Status::StorageUnavailable)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can be reported as a [`Status`].
pub trait HasStatus {
    fn status(&self) -> Status;
}

impl HasStatus for AmountError {
    fn status(&self) -> Status {
        Status::InvalidInput
    }
}
