//! Integration tests for the PostgreSQL stores
//!
//! These tests require a database connection and skip when DATABASE_URL is unset.

use std::sync::Arc;

use economy_ledger::store::{
    LedgerStore, PgLedgerStore, PgPlacementStore, PlacementStore, PoolWrite, StoreError,
};
use economy_ledger::{
    Balance, BankRegistry, Direction, Ledger, LedgerError, Location, ParticipantId, Pool,
    RegistrySettings, Status,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

mod common;
use common::amount;

#[tokio::test]
async fn test_pg_ledger_scenario() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let ledger = Ledger::new(PgLedgerStore::new(pool));
    let p1 = ParticipantId::generate();
    let p2 = ParticipantId::generate();

    assert!(ledger.open_account(p1).await.unwrap());
    ledger.set_value(p1, Pool::Bank, amount(dec!(100))).await.unwrap();

    let balance = ledger
        .adjust_value(p1, Pool::Bank, amount(dec!(30)), Direction::Decrease)
        .await
        .unwrap();
    assert_eq!(balance.value(), dec!(70));

    let too_much = ledger
        .adjust_value(p1, Pool::Bank, amount(dec!(1000)), Direction::Decrease)
        .await;
    assert_eq!(Status::of(&too_much), Status::InsufficientFunds);
    assert_eq!(ledger.get_value(p1, Pool::Bank).await.unwrap().value(), dec!(70));
    assert_eq!(ledger.get_value(p1, Pool::Wallet).await.unwrap(), Balance::zero());

    let missing = ledger.get_value(p2, Pool::Bank).await;
    assert!(matches!(missing, Err(LedgerError::NoSuchParticipant(_))));
}

#[tokio::test]
async fn test_pg_batch_rolls_back() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let store = PgLedgerStore::new(pool);
    let present = ParticipantId::generate();
    store.create(present).await.unwrap();

    let writes = [
        PoolWrite::new(present, Pool::Wallet, Balance::zero(), Balance::new(dec!(42)).unwrap()),
        PoolWrite::new(ParticipantId::generate(), Pool::Wallet, Balance::zero(), Balance::zero()),
    ];
    let result = store.store_batch(&writes).await;
    assert!(matches!(result, Err(StoreError::Corrupt(_))));

    let account = store.load(present).await.unwrap().unwrap();
    assert_eq!(account.wallet, Balance::zero());
}

#[tokio::test]
async fn test_pg_stale_write_is_rejected() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let store = PgLedgerStore::new(pool);
    let participant = ParticipantId::generate();
    store.create(participant).await.unwrap();

    let seven = Balance::new(dec!(7)).unwrap();
    store
        .store(PoolWrite::new(participant, Pool::Bank, Balance::zero(), seven))
        .await
        .unwrap();

    let one = Balance::new(dec!(1)).unwrap();
    let stale = PoolWrite::new(participant, Pool::Bank, Balance::zero(), one);
    assert!(matches!(store.store(stale).await, Err(StoreError::Conflict { .. })));
    assert_eq!(store.load(participant).await.unwrap().unwrap().bank, seven);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pg_ledgers_sharing_a_database_lose_no_update() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let participant = ParticipantId::generate();
    let first = Arc::new(Ledger::new(PgLedgerStore::new(pool.clone())));
    let second = Arc::new(Ledger::new(PgLedgerStore::new(pool)));
    first.open_account(participant).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let ledger = if i % 2 == 0 { Arc::clone(&first) } else { Arc::clone(&second) };
        handles.push(tokio::spawn(async move {
            for _ in 0..10 {
                ledger
                    .adjust_value(participant, Pool::Wallet, amount(dec!(1)), Direction::Increase)
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(second.get_value(participant, Pool::Wallet).await.unwrap().value(), dec!(80));
}

#[tokio::test]
async fn test_pg_registry_survives_reload() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    // A fresh world keeps this test isolated from other rows
    let world = format!("test-{}", Uuid::new_v4());
    let settings = RegistrySettings::new(5.0, 2.0).unwrap();
    let owner = ParticipantId::generate();

    let registry = BankRegistry::load(PgPlacementStore::new(pool.clone()), settings)
        .await
        .unwrap();
    let first = registry
        .add_placement(
            &Location::new(world.as_str(), 0.0, 64.0, 0.0).with_rotation(90.0, 10.0),
            owner,
        )
        .await
        .unwrap();
    let second = registry
        .add_placement(&Location::new(world.as_str(), 30.0, 64.0, 0.0), owner)
        .await
        .unwrap();

    let reloaded = BankRegistry::load(PgPlacementStore::new(pool.clone()), settings)
        .await
        .unwrap();
    let ours: Vec<_> = reloaded
        .list_placements()
        .await
        .into_iter()
        .filter(|p| p.location.world.as_str() == world)
        .collect();
    assert_eq!(ours.len(), 2);
    assert_eq!(ours[0].id, first.id);
    assert_eq!(ours[0].location.yaw, 90.0);
    assert_eq!(ours[0].location.pitch, 0.0);
    assert_eq!(ours[1].id, second.id);

    reloaded
        .remove_placement(&Location::new(world.as_str(), 0.5, 64.0, 0.5))
        .await
        .unwrap();
    let remaining: Vec<_> = PgPlacementStore::new(pool)
        .load_all()
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.location.world.as_str() == world)
        .collect();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second.id);
}
