use crate::db::retry::{execute_with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::error::RepositoryResult;
use crate::games::GameSource;
use crate::models::Game;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// Game source over the `games` table.
#[derive(Debug, Clone)]
pub struct PgGameSource {
    pool: PgPool,
    max_attempts: u32,
}

impl PgGameSource {
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

fn game_from_row(row: &PgRow) -> RepositoryResult<Game> {
    Ok(Game {
        game_id: row.try_get("game_id")?,
        sport: row.try_get("sport")?,
        team_a: row.try_get("team_a")?,
        team_b: row.try_get("team_b")?,
        scheduled_date: row.try_get("scheduled_date")?,
        result: row.try_get("result")?,
    })
}

async fn select_open(pool: &PgPool, sport: Option<&str>) -> RepositoryResult<Vec<Game>> {
    let rows = sqlx::query(
        r#"
        SELECT game_id, sport, team_a, team_b, scheduled_date, result
        FROM games
        WHERE result IS NULL
          AND ($1::TEXT IS NULL OR lower(sport) = lower($1))
        ORDER BY scheduled_date, game_id
        "#,
    )
    .bind(sport)
    .fetch_all(pool)
    .await?;

    rows.iter().map(game_from_row).collect()
}

async fn select_one(pool: &PgPool, game_id: &str) -> RepositoryResult<Option<Game>> {
    let row = sqlx::query(
        r#"
        SELECT game_id, sport, team_a, team_b, scheduled_date, result
        FROM games
        WHERE game_id = $1
        "#,
    )
    .bind(game_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(game_from_row).transpose()
}

async fn update_result(pool: &PgPool, game_id: &str, outcome: &str) -> RepositoryResult<bool> {
    let result =
        sqlx::query("UPDATE games SET result = $2 WHERE game_id = $1 AND result IS NULL")
            .bind(game_id)
            .bind(outcome)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl GameSource for PgGameSource {
    async fn list_open_games(&self, sport: Option<&str>) -> RepositoryResult<Vec<Game>> {
        let pool = &self.pool;
        execute_with_retry("list games", self.max_attempts, move || select_open(pool, sport)).await
    }

    async fn get_game(&self, game_id: &str) -> RepositoryResult<Option<Game>> {
        let pool = &self.pool;
        execute_with_retry("load game", self.max_attempts, move || select_one(pool, game_id)).await
    }

    async fn record_result(&self, game_id: &str, outcome: &str) -> RepositoryResult<bool> {
        let pool = &self.pool;
        execute_with_retry("record game result", self.max_attempts, move || {
            update_result(pool, game_id, outcome)
        })
        .await
    }
}
