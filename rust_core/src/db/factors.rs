use crate::db::retry::{execute_with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::error::RepositoryResult;
use crate::factor_store::FactorRepository;
use crate::models::Factor;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;

/// Factor repository over the `factors` table.
#[derive(Debug, Clone)]
pub struct PgFactorRepository {
    pool: PgPool,
    max_attempts: u32,
}

impl PgFactorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Insert any of `factors` not already present. Existing rows keep their weights.
    pub async fn seed(&self, factors: &[Factor]) -> RepositoryResult<u64> {
        let pool = &self.pool;
        let mut inserted = 0;
        for factor in factors {
            inserted += execute_with_retry("seed factor", self.max_attempts, move || {
                insert_factor(pool, factor)
            })
            .await?;
        }

        if inserted > 0 {
            info!("Seeded {} factors", inserted);
        }
        Ok(inserted)
    }
}

async fn insert_factor(pool: &PgPool, factor: &Factor) -> RepositoryResult<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO factors (factor_id, name, base_weight, current_weight, min_weight, max_weight)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (factor_id) DO NOTHING
        "#,
    )
    .bind(factor.id)
    .bind(factor.name.as_str())
    .bind(factor.base_weight)
    .bind(factor.current_weight)
    .bind(factor.min_weight)
    .bind(factor.max_weight)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

async fn select_factors(pool: &PgPool) -> RepositoryResult<Vec<Factor>> {
    let rows = sqlx::query(
        "SELECT factor_id, name, base_weight, current_weight, min_weight, max_weight \
         FROM factors ORDER BY factor_id",
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(factor_from_row).collect()
}

async fn update_weight(pool: &PgPool, factor_id: i32, weight: f64) -> RepositoryResult<()> {
    sqlx::query("UPDATE factors SET current_weight = $2 WHERE factor_id = $1")
        .bind(factor_id)
        .bind(weight)
        .execute(pool)
        .await?;
    Ok(())
}

fn factor_from_row(row: &PgRow) -> RepositoryResult<Factor> {
    Ok(Factor {
        id: row.try_get("factor_id")?,
        name: row.try_get("name")?,
        base_weight: row.try_get("base_weight")?,
        current_weight: row.try_get("current_weight")?,
        min_weight: row.try_get("min_weight")?,
        max_weight: row.try_get("max_weight")?,
    })
}

#[async_trait]
impl FactorRepository for PgFactorRepository {
    async fn get_all_factors(&self) -> RepositoryResult<Vec<Factor>> {
        let pool = &self.pool;
        execute_with_retry("load factors", self.max_attempts, move || select_factors(pool)).await
    }

    async fn set_factor_weight(&self, factor_id: i32, weight: f64) -> RepositoryResult<()> {
        let pool = &self.pool;
        execute_with_retry("update factor weight", self.max_attempts, move || {
            update_weight(pool, factor_id, weight)
        })
        .await
    }

    fn backend_name(&self) -> &str {
        "postgres"
    }
}
