//! Transaction kinds
//!
//! Maps free-text transaction labels onto the closed set of kinds that
//! decide which pool a transfer affects and whether it moves money between
//! two participants.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Pool;

/// Kind of a teller transaction.
///
/// Declaration order is the classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Wallet to bank
    BankDeposit,
    /// Bank to wallet
    BankWithdrawal,
    /// Bank to another participant's bank
    BankTransfer,
    /// Cash taken out of the wallet
    WalletWithdrawal,
    /// Wallet to another participant's wallet
    WalletTransfer,
}

impl TransactionKind {
    /// All kinds, in classification priority order.
    pub const ALL: [TransactionKind; 5] = [
        TransactionKind::BankDeposit,
        TransactionKind::BankWithdrawal,
        TransactionKind::BankTransfer,
        TransactionKind::WalletWithdrawal,
        TransactionKind::WalletTransfer,
    ];

    /// Canonical label matched by [`TransactionKind::classify`].
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::BankDeposit => "deposit",
            TransactionKind::BankWithdrawal => "withdraw",
            TransactionKind::BankTransfer => "bank-transfer",
            TransactionKind::WalletWithdrawal => "take-out",
            TransactionKind::WalletTransfer => "wallet-transfer",
        }
    }

    /// Classify a label by case-insensitive substring containment.
    ///
    /// The first kind in declaration order whose canonical label occurs in
    /// `label` wins, regardless of match length.
    pub fn classify(label: &str) -> Option<TransactionKind> {
        let haystack = label.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| haystack.contains(kind.label()))
    }

    pub fn is_transaction(label: &str) -> bool {
        Self::classify(label).is_some()
    }

    pub fn affects_bank_pool(&self) -> bool {
        matches!(
            self,
            TransactionKind::BankWithdrawal | TransactionKind::BankTransfer
        )
    }

    pub fn affects_wallet_pool(&self) -> bool {
        matches!(
            self,
            TransactionKind::BankDeposit
                | TransactionKind::WalletWithdrawal
                | TransactionKind::WalletTransfer
        )
    }

    /// Whether the transaction moves money to another participant.
    pub fn is_peer_transfer(&self) -> bool {
        matches!(
            self,
            TransactionKind::BankTransfer | TransactionKind::WalletTransfer
        )
    }

    /// Pool the funds are drawn from.
    pub fn source_pool(&self) -> Pool {
        if self.affects_bank_pool() {
            Pool::Bank
        } else {
            Pool::Wallet
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
