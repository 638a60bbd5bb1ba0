//! Database module
//!
//! Database connection and schema verification utilities.

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

use crate::config::Config;

/// Tables the PostgreSQL stores read and write
const REQUIRED_TABLES: [&str; 2] = ["economy_accounts", "bank_placements"];

/// Open a connection pool using the configured limits.
///
/// Returns `Ok(None)` when no `DATABASE_URL` is configured.
pub async fn connect(config: &Config) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(database_url) = config.database_url.as_deref() else {
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;

    Ok(Some(pool))
}

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Check if required tables exist.
/// The schema is shipped as raw SQL in `migrations/`.
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    tracing::info!("Economy schema verified");
    Ok(true)
}

/// Apply `migrations/001_economy.sql`. Statements are idempotent.
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    // A bare &str runs through the simple protocol, which accepts multiple statements
    pool.execute(include_str!("../migrations/001_economy.sql"))
        .await?;
    Ok(())
}
