//! economy_ledger Library
//!
//! Two-pool (bank / wallet) participant ledger, teller transactions and a
//! registry of bank placements. Components are plain values wired together
//! by the caller; there is no process-wide state.

pub mod config;
pub mod db;
pub mod domain;
pub mod ledger;
pub mod registry;
pub mod store;
pub mod teller;

mod error;

pub use config::{Config, RegistrySettings};
pub use domain::{
    AccountSnapshot, Amount, AmountError, Balance, Direction, HasStatus, Location, ParticipantId,
    Placement, Pool, Status, TransactionKind, WorldId,
};
pub use error::{AppError, AppResult};
pub use ledger::{Ledger, LedgerError};
pub use registry::{BankRegistry, RegistryError};
pub use teller::{Teller, TellerError, TransactionReceipt, TransactionRequest};
