//! Common test utilities

#![allow(dead_code)]

use economy_ledger::store::{MemoryLedgerStore, MemoryPlacementStore};
use economy_ledger::{db, Amount, BankRegistry, Ledger, ParticipantId, RegistrySettings};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect to the test database and make sure the schema exists.
///
/// Returns `None` when DATABASE_URL is not set, so database tests skip.
/// Tests never truncate: each one uses fresh participant ids and world names.
pub async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    // Parallel tests may race on CREATE TABLE IF NOT EXISTS; the check below decides
    if let Err(e) = db::apply_schema(&pool).await {
        eprintln!("Applying schema failed, checking existing tables: {}", e);
    }
    assert!(db::check_schema(&pool).await.expect("Failed to check schema"));

    Some(pool)
}

pub fn amount(value: Decimal) -> Amount {
    Amount::new(value).expect("valid test amount")
}

/// In-memory ledger with the given accounts opened (zero balances).
pub async fn memory_ledger(participants: &[ParticipantId]) -> Ledger<MemoryLedgerStore> {
    let ledger = Ledger::new(MemoryLedgerStore::new());
    for participant in participants {
        ledger.open_account(*participant).await.expect("open account");
    }
    ledger
}

/// Empty in-memory registry with separation 5.0 and interaction radius 2.0.
pub async fn memory_registry() -> BankRegistry<MemoryPlacementStore> {
    BankRegistry::load(
        MemoryPlacementStore::new(),
        RegistrySettings::new(5.0, 2.0).expect("valid settings"),
    )
    .await
    .expect("load registry")
}
