//! Teller
//!
//! Runs classified transactions (deposits, withdrawals, peer transfers) on
//! top of the ledger. Every pool involved is locked for the whole
//! transaction and all new values are written in one atomic batch.

mod commands;

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Amount, Direction, HasStatus, ParticipantId, Pool, Status, TransactionKind};
use crate::ledger::{apply_delta, retry_on_conflict, Ledger, LedgerError};
use crate::store::{LedgerStore, PoolWrite};

pub use commands::{PoolBalance, TransactionReceipt, TransactionRequest};

/// Teller errors
#[derive(Debug, thiserror::Error)]
pub enum TellerError {
    #[error("Unknown transaction: {0:?}")]
    UnknownTransaction(String),

    #[error("{0} requires a counterparty")]
    MissingCounterparty(TransactionKind),

    #[error("{0} does not take a counterparty")]
    UnexpectedCounterparty(TransactionKind),

    #[error("Cannot transfer to yourself")]
    SelfTransfer,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl HasStatus for TellerError {
    fn status(&self) -> Status {
        match self {
            TellerError::Ledger(e) => e.status(),
            _ => Status::InvalidInput,
        }
    }
}

/// One pool movement of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Leg {
    participant: ParticipantId,
    pool: Pool,
    direction: Direction,
}

impl Leg {
    fn debit(participant: ParticipantId, pool: Pool) -> Self {
        Self {
            participant,
            pool,
            direction: Direction::Decrease,
        }
    }

    fn credit(participant: ParticipantId, pool: Pool) -> Self {
        Self {
            participant,
            pool,
            direction: Direction::Increase,
        }
    }
}

/// Pool movements of a request, debits first.
fn legs(request: &TransactionRequest) -> Result<Vec<Leg>, TellerError> {
    let kind = request.kind;
    let from = request.participant;

    let counterparty = match (kind.is_peer_transfer(), request.counterparty) {
        (true, None) => return Err(TellerError::MissingCounterparty(kind)),
        (true, Some(to)) if to == from => return Err(TellerError::SelfTransfer),
        (false, Some(_)) => return Err(TellerError::UnexpectedCounterparty(kind)),
        (_, to) => to,
    };

    let legs = match (kind, counterparty) {
        (TransactionKind::BankDeposit, _) => {
            vec![Leg::debit(from, Pool::Wallet), Leg::credit(from, Pool::Bank)]
        }
        (TransactionKind::BankWithdrawal, _) => {
            vec![Leg::debit(from, Pool::Bank), Leg::credit(from, Pool::Wallet)]
        }
        (TransactionKind::WalletWithdrawal, _) => vec![Leg::debit(from, Pool::Wallet)],
        (TransactionKind::BankTransfer | TransactionKind::WalletTransfer, Some(to)) => {
            let pool = kind.source_pool();
            vec![Leg::debit(from, pool), Leg::credit(to, pool)]
        }
        (_, None) => return Err(TellerError::MissingCounterparty(kind)),
    };
    Ok(legs)
}

/// Executes transactions against a shared ledger.
pub struct Teller<S> {
    ledger: Arc<Ledger<S>>,
}

impl<S: LedgerStore> Teller<S> {
    pub fn new(ledger: Arc<Ledger<S>>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    /// Classify `label` and execute it.
    pub async fn execute_label(
        &self,
        label: &str,
        participant: ParticipantId,
        amount: Amount,
        counterparty: Option<ParticipantId>,
    ) -> Result<TransactionReceipt, TellerError> {
        let kind = TransactionKind::classify(label)
            .ok_or_else(|| TellerError::UnknownTransaction(label.to_string()))?;

        let mut request = TransactionRequest::new(kind, participant, amount);
        request.counterparty = counterparty;
        self.execute(request).await
    }

    /// Execute a transaction. Either every leg is applied or none is.
    pub async fn execute(
        &self,
        request: TransactionRequest,
    ) -> Result<TransactionReceipt, TellerError> {
        let legs = legs(&request)?;

        let _guards = self
            .ledger
            .lock_keys(legs.iter().map(|leg| (leg.participant, leg.pool)).collect())
            .await;

        let (legs, amount) = (legs.as_slice(), request.amount);
        let writes = retry_on_conflict("transaction", move || self.apply_legs(legs, amount)).await?;

        let receipt = TransactionReceipt {
            transaction_id: Uuid::new_v4(),
            kind: request.kind,
            participant: request.participant,
            counterparty: request.counterparty,
            amount: request.amount,
            balances: writes
                .iter()
                .map(|w| PoolBalance {
                    participant: w.participant,
                    pool: w.pool,
                    balance: w.balance,
                })
                .collect(),
        };

        tracing::info!(
            transaction_id = %receipt.transaction_id,
            kind = %receipt.kind,
            participant = %receipt.participant,
            counterparty = ?receipt.counterparty,
            amount = %receipt.amount,
            "Transaction executed"
        );
        Ok(receipt)
    }

    /// Read, compute and write every leg once.
    async fn apply_legs(
        &self,
        legs: &[Leg],
        amount: Amount,
    ) -> Result<Vec<PoolWrite>, LedgerError> {
        let mut writes = Vec::with_capacity(legs.len());
        for leg in legs {
            let current = self.ledger.get_value(leg.participant, leg.pool).await?;
            let balance = apply_delta(leg.participant, leg.pool, current, &amount, leg.direction)?;
            writes.push(PoolWrite::new(leg.participant, leg.pool, current, balance));
        }

        self.ledger.write_batch(&writes).await?;
        Ok(writes)
    }
}
