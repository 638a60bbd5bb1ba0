//! Teller request and receipt definitions

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Amount, Balance, ParticipantId, Pool, TransactionKind};

/// Request to run one classified transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub kind: TransactionKind,
    /// Participant whose funds are moved
    pub participant: ParticipantId,
    pub amount: Amount,
    /// Receiving participant, only for peer transfers
    pub counterparty: Option<ParticipantId>,
}

impl TransactionRequest {
    pub fn new(kind: TransactionKind, participant: ParticipantId, amount: Amount) -> Self {
        Self {
            kind,
            participant,
            amount,
            counterparty: None,
        }
    }

    pub fn with_counterparty(mut self, counterparty: ParticipantId) -> Self {
        self.counterparty = Some(counterparty);
        self
    }
}

/// Value of one pool right after a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBalance {
    pub participant: ParticipantId,
    pub pool: Pool,
    pub balance: Balance,
}

/// Result of a successful transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_id: Uuid,
    pub kind: TransactionKind,
    pub participant: ParticipantId,
    pub counterparty: Option<ParticipantId>,
    pub amount: Amount,
    /// Every pool touched, with its post-transaction value
    pub balances: Vec<PoolBalance>,
}

impl TransactionReceipt {
    pub fn balance_of(&self, participant: ParticipantId, pool: Pool) -> Option<Balance> {
        self.balances
            .iter()
            .find(|b| b.participant == participant && b.pool == pool)
            .map(|b| b.balance)
    }
}
