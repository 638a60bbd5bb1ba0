//! PostgreSQL stores
//!
//! Durable implementations of the store traits. Schema lives in
//! `migrations/001_economy.sql`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{LedgerStore, PlacementStore, PoolWrite, StoreError};
use crate::domain::{AccountSnapshot, Balance, Location, ParticipantId, Placement, Pool, WorldId};

fn balance_from_row(
    participant: Uuid,
    column: &str,
    value: Decimal,
) -> Result<Balance, StoreError> {
    Balance::new(value).map_err(|e| {
        StoreError::Corrupt(format!("{} of {}: {}", column, participant, e))
    })
}

fn snapshot_from_row(
    participant: Uuid,
    bank: Decimal,
    wallet: Decimal,
) -> Result<AccountSnapshot, StoreError> {
    Ok(AccountSnapshot {
        participant: ParticipantId::new(participant),
        bank: balance_from_row(participant, "bank", bank)?,
        wallet: balance_from_row(participant, "wallet", wallet)?,
    })
}

/// Account store backed by the `economy_accounts` table.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn load(
        &self,
        participant: ParticipantId,
    ) -> Result<Option<AccountSnapshot>, StoreError> {
        let row: Option<(Decimal, Decimal)> = sqlx::query_as(
            r#"
            SELECT bank, wallet FROM economy_accounts
            WHERE participant_id = $1
            "#,
        )
        .bind(participant.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(bank, wallet)| snapshot_from_row(participant.as_uuid(), bank, wallet))
            .transpose()
    }

    async fn create(&self, participant: ParticipantId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO economy_accounts (participant_id, bank, wallet, created_at, updated_at)
            VALUES ($1, 0, 0, NOW(), NOW())
            ON CONFLICT (participant_id) DO NOTHING
            "#,
        )
        .bind(participant.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn store_batch(&self, writes: &[PoolWrite]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for write in writes {
            // Compare-and-set: only apply if the pool still holds what the caller read
            let sql = match write.pool {
                Pool::Bank => {
                    r#"
                    UPDATE economy_accounts SET bank = $3, updated_at = NOW()
                    WHERE participant_id = $1 AND bank = $2
                    "#
                }
                Pool::Wallet => {
                    r#"
                    UPDATE economy_accounts SET wallet = $3, updated_at = NOW()
                    WHERE participant_id = $1 AND wallet = $2
                    "#
                }
            };

            let result = sqlx::query(sql)
                .bind(write.participant.as_uuid())
                .bind(write.expected.value())
                .bind(write.balance.value())
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                let exists: bool = sqlx::query_scalar(
                    "SELECT EXISTS (SELECT 1 FROM economy_accounts WHERE participant_id = $1)",
                )
                .bind(write.participant.as_uuid())
                .fetch_one(&mut *tx)
                .await?;

                // Dropping the transaction rolls back earlier writes
                if !exists {
                    return Err(StoreError::Corrupt(format!(
                        "write to missing account {}",
                        write.participant
                    )));
                }
                return Err(StoreError::Conflict {
                    participant: write.participant,
                    pool: write.pool,
                });
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<AccountSnapshot>, StoreError> {
        let rows: Vec<(Uuid, Decimal, Decimal)> = sqlx::query_as(
            r#"
            SELECT participant_id, bank, wallet FROM economy_accounts
            ORDER BY (bank + wallet) DESC, participant_id ASC
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(participant, bank, wallet)| snapshot_from_row(participant, bank, wallet))
            .collect()
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM economy_accounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}

type PlacementRow = (Uuid, String, f64, f64, f64, f32, f32, Uuid, DateTime<Utc>);

/// Placement store backed by the `bank_placements` table.
#[derive(Debug, Clone)]
pub struct PgPlacementStore {
    pool: PgPool,
}

impl PgPlacementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlacementStore for PgPlacementStore {
    async fn load_all(&self) -> Result<Vec<Placement>, StoreError> {
        let rows: Vec<PlacementRow> = sqlx::query_as(
            r#"
            SELECT id, world, x, y, z, yaw, pitch, owner_id, placed_at
            FROM bank_placements
            ORDER BY seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, world, x, y, z, yaw, pitch, owner, placed_at)| Placement {
                id,
                location: Location {
                    world: WorldId::new(world),
                    x,
                    y,
                    z,
                    yaw,
                    pitch,
                },
                owner: ParticipantId::new(owner),
                placed_at,
            })
            .collect())
    }

    async fn insert(&self, placement: &Placement) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO bank_placements (id, world, x, y, z, yaw, pitch, owner_id, placed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(placement.id)
        .bind(placement.location.world.as_str())
        .bind(placement.location.x)
        .bind(placement.location.y)
        .bind(placement.location.z)
        .bind(placement.location.yaw)
        .bind(placement.location.pitch)
        .bind(placement.owner.as_uuid())
        .bind(placement.placed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM bank_placements WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
