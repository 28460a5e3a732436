//! Postgres persistence for factors, predictions and games.
//!
//! This module provides:
//! - A small connection pool, checked with `SELECT 1` before use
//! - Schema bootstrap for the three tables the service uses
//! - Repository implementations for each persistence collaborator
//! - Retry with backoff for transient database errors

pub mod factors;
pub mod games;
pub mod predictions;
pub mod retry;

pub use factors::PgFactorRepository;
pub use games::PgGameSource;
pub use predictions::PgPredictionHistory;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// Pool sizing for the prediction service.
///
/// Each command runs a handful of queries in sequence, so the pool stays
/// small and fails fast when the database is unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbPoolConfig {
    pub max_connections: u32,
    /// Also bounds the initial connect, after which the service drops to demo mode.
    pub acquire_timeout: Duration,
}

impl Default for DbPoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 2,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Connect to Postgres and confirm the server answers a trivial query.
pub async fn create_pool(database_url: &str, config: &DbPoolConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(database_url)
        .await
        .context("Failed to connect to the prediction database")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("Prediction database did not answer")?;

    tracing::info!(
        "Connected to prediction database (max_connections={}, acquire_timeout={}s)",
        config.max_connections,
        config.acquire_timeout.as_secs()
    );
    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS factors (
        factor_id      INTEGER PRIMARY KEY,
        name           TEXT NOT NULL UNIQUE,
        base_weight    DOUBLE PRECISION NOT NULL,
        current_weight DOUBLE PRECISION NOT NULL,
        min_weight     DOUBLE PRECISION NOT NULL,
        max_weight     DOUBLE PRECISION NOT NULL,
        CHECK (min_weight <= base_weight AND base_weight <= max_weight),
        CHECK (min_weight <= current_weight AND current_weight <= max_weight)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS games (
        game_id        TEXT PRIMARY KEY,
        sport          TEXT NOT NULL,
        team_a         TEXT NOT NULL,
        team_b         TEXT NOT NULL,
        scheduled_date DATE NOT NULL,
        result         TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS predictions (
        id                   BIGSERIAL PRIMARY KEY,
        game_id              TEXT NOT NULL,
        predicted_outcome    TEXT NOT NULL,
        confidence           DOUBLE PRECISION NOT NULL,
        reasons              TEXT NOT NULL DEFAULT '[]',
        factor_contributions TEXT NOT NULL DEFAULT '{}',
        created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS predictions_game_id_idx ON predictions (game_id, created_at DESC)",
];

/// Create the factors, games and predictions tables if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(*statement)
            .execute(pool)
            .await
            .context("Failed to apply schema")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_is_small() {
        let config = DbPoolConfig::default();
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_schema_covers_all_tables() {
        let joined = SCHEMA.join("\n");
        for table in ["factors", "games", "predictions"] {
            assert!(joined.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")));
        }
    }
}
