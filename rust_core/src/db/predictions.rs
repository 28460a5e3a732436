use crate::db::retry::{execute_with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::error::RepositoryResult;
use crate::history::PredictionHistory;
use crate::models::{FactorContributions, Prediction};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// Prediction history over the `predictions` table.
///
/// Reasons and contributions are stored as JSON text so key order survives.
#[derive(Debug, Clone)]
pub struct PgPredictionHistory {
    pool: PgPool,
    max_attempts: u32,
}

impl PgPredictionHistory {
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
}

async fn select_latest(pool: &PgPool, game_id: &str) -> RepositoryResult<Option<Prediction>> {
    let row = sqlx::query(
        r#"
        SELECT game_id, predicted_outcome, confidence, reasons, factor_contributions
        FROM predictions
        WHERE game_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(game_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(prediction_from_row).transpose()
}

async fn insert_prediction(
    pool: &PgPool,
    prediction: &Prediction,
    reasons: &str,
    contributions: &str,
) -> RepositoryResult<()> {
    sqlx::query(
        r#"
        INSERT INTO predictions
            (game_id, predicted_outcome, confidence, reasons, factor_contributions)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(prediction.event_id.as_str())
    .bind(prediction.predicted_outcome.as_str())
    .bind(prediction.confidence)
    .bind(reasons)
    .bind(contributions)
    .execute(pool)
    .await?;
    Ok(())
}

fn prediction_from_row(row: &PgRow) -> RepositoryResult<Prediction> {
    let reasons: String = row.try_get("reasons")?;
    let contributions: String = row.try_get("factor_contributions")?;
    Ok(Prediction {
        event_id: row.try_get("game_id")?,
        predicted_outcome: row.try_get("predicted_outcome")?,
        confidence: row.try_get("confidence")?,
        reasons: serde_json::from_str(&reasons)?,
        factor_contributions: serde_json::from_str::<FactorContributions>(&contributions)?,
    })
}

#[async_trait]
impl PredictionHistory for PgPredictionHistory {
    async fn get_prediction(&self, event_id: &str) -> RepositoryResult<Option<Prediction>> {
        let pool = &self.pool;
        execute_with_retry("load prediction", self.max_attempts, move || {
            select_latest(pool, event_id)
        })
        .await
    }

    async fn record_prediction(&self, prediction: &Prediction) -> RepositoryResult<()> {
        let reasons = serde_json::to_string(&prediction.reasons)?;
        let contributions = serde_json::to_string(&prediction.factor_contributions)?;
        let pool = &self.pool;
        let (reasons, contributions) = (reasons.as_str(), contributions.as_str());
        execute_with_retry("record prediction", self.max_attempts, move || {
            insert_prediction(pool, prediction, reasons, contributions)
        })
        .await
    }
}
