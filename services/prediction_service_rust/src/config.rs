use anyhow::{anyhow, Context, Result};
use betcheck_core::db::retry::DEFAULT_MAX_ATTEMPTS;
use betcheck_core::db::DbPoolConfig;
use betcheck_core::LearningConfig;
use std::env;
use std::time::Duration;

/// Marker left in template `.env` files; treated as "not configured".
const PLACEHOLDER_PROJECT: &str = "your-project-id";

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` runs the service in demo mode (no persistence, no learning).
    pub database_url: Option<String>,
    pub db_pool: DbPoolConfig,
    pub db_max_attempts: u32,
    pub learning: LearningConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = normalize_database_url(env::var("DATABASE_URL").ok());

        let defaults = LearningConfig::default();
        let learning = LearningConfig {
            learning_rate: parse_rate(
                "LEARNING_RATE",
                env::var("LEARNING_RATE").ok(),
                defaults.learning_rate,
            )?,
            adjustment_fraction: parse_rate(
                "WEIGHT_ADJUSTMENT_FRACTION",
                env::var("WEIGHT_ADJUSTMENT_FRACTION").ok(),
                defaults.adjustment_fraction,
            )?,
        };

        let pool_defaults = DbPoolConfig::default();
        let db_pool = DbPoolConfig {
            max_connections: parse_count(
                "DB_MAX_CONNECTIONS",
                env::var("DB_MAX_CONNECTIONS").ok(),
                pool_defaults.max_connections,
            )?,
            acquire_timeout: Duration::from_secs(u64::from(parse_count(
                "DB_ACQUIRE_TIMEOUT_SECS",
                env::var("DB_ACQUIRE_TIMEOUT_SECS").ok(),
                pool_defaults.acquire_timeout.as_secs() as u32,
            )?)),
        };
        let db_max_attempts = parse_count(
            "DB_MAX_ATTEMPTS",
            env::var("DB_MAX_ATTEMPTS").ok(),
            DEFAULT_MAX_ATTEMPTS,
        )?;

        Ok(Self {
            database_url,
            db_pool,
            db_max_attempts,
            learning,
        })
    }

    pub fn persistence_configured(&self) -> bool {
        self.database_url.is_some()
    }
}

fn normalize_database_url(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.contains(PLACEHOLDER_PROJECT))
}

/// Parse a positive integer setting, or fall back to `default` when unset.
fn parse_count(key: &str, raw: Option<String>, default: u32) -> Result<u32> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: u32 = raw
        .trim()
        .parse()
        .with_context(|| format!("Invalid {key}: {raw} (expected integer)"))?;
    if value == 0 {
        return Err(anyhow!("Invalid {key}: {raw} (must be at least 1)"));
    }
    Ok(value)
}

/// Parse a finite, non-negative rate, or fall back to `default` when unset.
fn parse_rate(key: &str, raw: Option<String>, default: f64) -> Result<f64> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Invalid {key}: {raw} (expected number)"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(anyhow!("Invalid {key}: {raw} (expected finite non-negative number)"));
    }
    Ok(value)
}
