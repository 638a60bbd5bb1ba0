//! Domain module
//!
//! Core domain types and business rules.

pub mod amount;
pub mod error;
pub mod transaction;
pub mod types;

pub use amount::{Amount, AmountError, Balance};
pub use error::{HasStatus, Status};
pub use transaction::TransactionKind;
pub use types::{AccountSnapshot, Direction, Location, ParticipantId, Placement, Pool, WorldId};
