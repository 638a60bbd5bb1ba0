//! Error handling module
//!
//! Centralized error type for callers composing the ledger, the teller and
//! the bank registry.

use crate::domain::{AmountError, HasStatus, Status};
use crate::ledger::LedgerError;
use crate::registry::RegistryError;
use crate::store::StoreError;
use crate::teller::TellerError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Boundary validation
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] AmountError),

    // Component errors
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Teller(#[from] TellerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    // Infrastructure
    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Config(_) => "config_error",
            other => other.status().as_str(),
        }
    }

    /// Check if this is a client error (caller's fault, no retry)
    pub fn is_client_error(&self) -> bool {
        match self {
            AppError::Database(_) | AppError::Config(_) => false,
            other => other.status().is_client_error(),
        }
    }
}

impl HasStatus for AppError {
    fn status(&self) -> Status {
        match self {
            AppError::InvalidInput(e) => e.status(),
            AppError::Ledger(e) => e.status(),
            AppError::Teller(e) => e.status(),
            AppError::Registry(e) => e.status(),
            AppError::Storage(e) => e.status(),
            AppError::Database(_) | AppError::Config(_) => Status::StorageUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParticipantId;

    #[test]
    fn test_error_codes() {
        let err = AppError::from(LedgerError::NoSuchParticipant(ParticipantId::generate()));
        assert_eq!(err.error_code(), "no_such_participant");
        assert!(err.is_client_error());

        let err = AppError::from(RegistryError::TooClose {
            distance: 1.0,
            min_separation: 5.0,
        });
        assert_eq!(err.error_code(), "too_close");

        let err = AppError::from(AmountError::NotFinite);
        assert_eq!(err.error_code(), "invalid_input");
    }

    #[test]
    fn test_storage_errors_are_server_side() {
        let err = AppError::from(LedgerError::from(StoreError::Unavailable("down".into())));
        assert_eq!(err.error_code(), "storage_unavailable");
        assert!(!err.is_client_error());

        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.error_code(), "database_error");
        assert!(!err.is_client_error());
    }
}
