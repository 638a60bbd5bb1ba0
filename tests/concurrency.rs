//! Concurrency tests: per-key linearizability and registry serialization

use std::sync::Arc;

use economy_ledger::store::MemoryLedgerStore;
use economy_ledger::{
    Direction, HasStatus, Ledger, Location, ParticipantId, Pool, Status, Teller, TransactionKind,
    TransactionRequest,
};
use rust_decimal_macros::dec;

mod common;
use common::{amount, memory_ledger, memory_registry};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increases_lose_no_update() {
    let participant = ParticipantId::generate();
    let ledger = Arc::new(memory_ledger(&[participant]).await);

    let mut handles = Vec::new();
    for _ in 0..50 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            for _ in 0..100 {
                ledger
                    .adjust_value(participant, Pool::Bank, amount(dec!(1)), Direction::Increase)
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(ledger.get_value(participant, Pool::Bank).await.unwrap().value(), dec!(5000));
    assert_eq!(ledger.get_value(participant, Pool::Wallet).await.unwrap().value(), dec!(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_decreases_never_overdraw() {
    let participant = ParticipantId::generate();
    let ledger = Arc::new(memory_ledger(&[participant]).await);
    ledger.set_value(participant, Pool::Wallet, amount(dec!(100))).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..200 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            let result = ledger
                .adjust_value(participant, Pool::Wallet, amount(dec!(1)), Direction::Decrease)
                .await;
            Status::of(&result)
        }));
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Status::Success => succeeded += 1,
            Status::InsufficientFunds => insufficient += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(succeeded, 100);
    assert_eq!(insufficient, 100);
    assert_eq!(ledger.get_value(participant, Pool::Wallet).await.unwrap().value(), dec!(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_returned_value_matches_operation() {
    let participant = ParticipantId::generate();
    let ledger = Arc::new(memory_ledger(&[participant]).await);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::spawn(async move {
            ledger
                .adjust_value(participant, Pool::Bank, amount(dec!(1)), Direction::Increase)
                .await
                .unwrap()
                .value()
        }));
    }

    let mut observed = Vec::new();
    for handle in handles {
        observed.push(handle.await.unwrap());
    }
    observed.sort();

    // Each increase saw a distinct post-operation value: 1, 2, ..., 20
    let expected: Vec<_> = (1..=20).map(rust_decimal::Decimal::from).collect();
    assert_eq!(observed, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposing_transfers_do_not_deadlock() {
    let a = ParticipantId::generate();
    let b = ParticipantId::generate();
    let ledger = Arc::new(memory_ledger(&[a, b]).await);
    for participant in [a, b] {
        ledger.set_value(participant, Pool::Bank, amount(dec!(500))).await.unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..100 {
        let teller = Teller::new(Arc::clone(&ledger));
        let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
        handles.push(tokio::spawn(async move {
            let request =
                TransactionRequest::new(TransactionKind::BankTransfer, from, amount(dec!(3)))
                    .with_counterparty(to);
            teller.execute(request).await.map(|_| ()).map_err(|e| e.status())
        }));
    }

    let joined = tokio::time::timeout(std::time::Duration::from_secs(10), async {
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
    })
    .await;
    assert!(joined.is_ok(), "transfers deadlocked");

    let total = ledger.get_value(a, Pool::Bank).await.unwrap().value()
        + ledger.get_value(b, Pool::Bank).await.unwrap().value();
    assert_eq!(total, dec!(1000));
    // 50 transfers each way cancel out
    assert_eq!(ledger.get_value(a, Pool::Bank).await.unwrap().value(), dec!(500));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_placements_in_one_area() {
    let registry = Arc::new(memory_registry().await);

    let mut handles = Vec::new();
    for i in 0..20 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            let offset = f64::from(i) * 0.1;
            let result = registry
                .add_placement(&Location::new("W", offset, 64.0, offset), ParticipantId::generate())
                .await;
            Status::of(&result)
        }));
    }

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    assert_eq!(statuses.iter().filter(|s| s.is_success()).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == Status::TooClose).count(), 19);
    assert_eq!(registry.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tellers_on_separate_ledgers_conserve_money() {
    let a = ParticipantId::generate();
    let b = ParticipantId::generate();
    let store = MemoryLedgerStore::new();
    let ledgers = [
        Arc::new(Ledger::new(store.clone())),
        Arc::new(Ledger::new(store)),
    ];
    for participant in [a, b] {
        ledgers[0].open_account(participant).await.unwrap();
        ledgers[0].set_value(participant, Pool::Wallet, amount(dec!(500))).await.unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..40 {
        let teller = Teller::new(Arc::clone(&ledgers[i % 2]));
        let (from, to) = if i % 4 < 2 { (a, b) } else { (b, a) };
        handles.push(tokio::spawn(async move {
            for _ in 0..10 {
                let request =
                    TransactionRequest::new(TransactionKind::WalletTransfer, from, amount(dec!(2)))
                        .with_counterparty(to);
                teller.execute(request).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Equal traffic each way from both ledgers
    assert_eq!(ledgers[1].get_value(a, Pool::Wallet).await.unwrap().value(), dec!(500));
    assert_eq!(ledgers[1].get_value(b, Pool::Wallet).await.unwrap().value(), dec!(500));
    assert_eq!(ledgers[0].lock_count() + ledgers[1].lock_count(), 0);
}
