//! Request handling for the prediction service.
//!
//! Each command resolves its game through the [`GameSource`], calls into the
//! engine and returns a serializable record.

use anyhow::{anyhow, bail, Context, Result};
use betcheck_core::db::{self, PgFactorRepository, PgGameSource, PgPredictionHistory};
use betcheck_core::{
    default_factors, Factor, FactorStore, Game, GameSource, InMemoryGameSource,
    InMemoryPredictionHistory, LearningConfig, Prediction, PredictionEngine, PredictionHistory,
    ResultLog, StaticComparisonSource,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;

pub const SERVICE_NAME: &str = "bet-check-api";

/// Response for a reported result: the result itself plus the weights after learning.
#[derive(Debug, Serialize)]
pub struct SettleResponse {
    #[serde(flatten)]
    pub result: ResultLog,
    pub factors: Vec<Factor>,
}

pub struct App {
    engine: PredictionEngine,
    games: Arc<dyn GameSource>,
    persistence: bool,
}

impl App {
    pub fn new(engine: PredictionEngine, games: Arc<dyn GameSource>, persistence: bool) -> Self {
        Self {
            engine,
            games,
            persistence,
        }
    }

    /// Wire collaborators from config.
    ///
    /// Persistence is attempted once. Any failure while connecting, creating
    /// the schema or seeding factors drops the service into demo mode.
    pub async fn from_config(config: &Config) -> Self {
        if let Some(url) = &config.database_url {
            match connect_postgres(url, config).await {
                Ok(app) => return app,
                Err(e) => warn!("Could not connect to database: {:#}. Running in demo mode", e),
            }
        } else {
            warn!("DATABASE_URL not configured. Running in demo mode - database features disabled");
        }
        Self::demo(config.learning)
    }

    /// No persistence: default factors, demo games, learning disabled.
    pub fn demo(learning: LearningConfig) -> Self {
        let engine = PredictionEngine::new(
            Arc::new(FactorStore::unavailable()),
            Arc::new(StaticComparisonSource::reference()),
            Arc::new(InMemoryPredictionHistory::new()),
        )
        .with_learning(learning);
        Self::new(engine, Arc::new(InMemoryGameSource::demo()), false)
    }

    pub fn engine(&self) -> &PredictionEngine {
        &self.engine
    }

    pub fn health(&self) -> serde_json::Value {
        json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "persistence": self.persistence,
        })
    }

    pub async fn list_games(&self, sport: Option<&str>) -> Result<Vec<Game>> {
        self.games
            .list_open_games(sport)
            .await
            .context("Failed to list games")
    }

    pub async fn factors(&self) -> Vec<Factor> {
        self.engine.store().get_all().await
    }

    /// Predict a game and record the prediction for later learning.
    pub async fn predict(&self, game_id: &str) -> Result<Prediction> {
        let game = self.find_game(game_id).await?;
        if game.team_a.trim().is_empty() || game.team_b.trim().is_empty() {
            bail!("Game {} is missing a competitor name", game_id);
        }

        let prediction = self
            .engine
            .calculate_prediction(&game.game_id, &game.team_a, &game.team_b)
            .await;

        if let Err(e) = self.engine.history().record_prediction(&prediction).await {
            warn!("Failed to record prediction for {}: {}", game_id, e);
        }

        Ok(prediction)
    }

    /// Record a game's result and learn from it.
    ///
    /// A game is settled at most once; learning runs only on the first result.
    pub async fn settle(&self, game_id: &str, actual_outcome: &str) -> Result<SettleResponse> {
        let game = self.find_game(game_id).await?;
        if let Some(existing) = &game.result {
            bail!("Game {} is already settled ({} won)", game_id, existing);
        }
        if !game.has_competitor(actual_outcome) {
            bail!(
                "Outcome '{}' is neither {} nor {}",
                actual_outcome,
                game.team_a,
                game.team_b
            );
        }

        match self.games.record_result(game_id, actual_outcome).await {
            Ok(true) => {}
            Ok(false) => bail!("Game {} was settled by another request", game_id),
            Err(e) => warn!("Failed to record result for {}: {}", game_id, e),
        }

        self.engine.update_weights(game_id, actual_outcome).await;
        info!("Settled {}: {} won", game_id, actual_outcome);

        Ok(SettleResponse {
            result: ResultLog {
                game_id: game_id.to_string(),
                actual_outcome: actual_outcome.to_string(),
            },
            factors: self.factors().await,
        })
    }

    async fn find_game(&self, game_id: &str) -> Result<Game> {
        self.games
            .get_game(game_id)
            .await
            .with_context(|| format!("Failed to load game {game_id}"))?
            .ok_or_else(|| anyhow!("Game not found: {game_id}"))
    }
}

async fn connect_postgres(url: &str, config: &Config) -> Result<App> {
    let pool = db::create_pool(url, &config.db_pool).await?;
    db::ensure_schema(&pool).await?;

    let factors = PgFactorRepository::new(pool.clone()).with_max_attempts(config.db_max_attempts);
    factors
        .seed(&default_factors())
        .await
        .context("Failed to seed factors")?;

    let history: Arc<dyn PredictionHistory> =
        Arc::new(PgPredictionHistory::new(pool.clone()).with_max_attempts(config.db_max_attempts));
    let games: Arc<dyn GameSource> =
        Arc::new(PgGameSource::new(pool).with_max_attempts(config.db_max_attempts));

    let engine = PredictionEngine::new(
        Arc::new(FactorStore::new(Arc::new(factors))),
        Arc::new(StaticComparisonSource::reference()),
        history,
    )
    .with_learning(config.learning);

    Ok(App::new(engine, games, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use betcheck_core::InMemoryFactorRepository;

    /// In-memory app with learning enabled.
    fn learning_app() -> App {
        let engine = PredictionEngine::new(
            Arc::new(FactorStore::new(Arc::new(InMemoryFactorRepository::with_defaults()))),
            Arc::new(StaticComparisonSource::reference()),
            Arc::new(InMemoryPredictionHistory::new()),
        );
        App::new(engine, Arc::new(InMemoryGameSource::demo()), true)
    }

    #[tokio::test]
    async fn test_health() {
        let app = App::demo(LearningConfig::default());
        let health = app.health();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["service"], SERVICE_NAME);
        assert_eq!(health["persistence"], false);
    }

    #[tokio::test]
    async fn test_predict_unknown_game() {
        let app = App::demo(LearningConfig::default());
        let err = app.predict("nba_missing").await.unwrap_err();
        assert!(err.to_string().contains("Game not found"));
    }

    #[tokio::test]
    async fn test_predict_records_history() {
        let app = learning_app();
        let p = app.predict("nba_demo_1").await.unwrap();
        assert_eq!(p.predicted_outcome, "Los Angeles Lakers");

        let stored = app
            .engine()
            .history()
            .get_prediction("nba_demo_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, p);
    }

    #[tokio::test]
    async fn test_settle_learns_and_closes_game() {
        let app = learning_app();
        let p = app.predict("nba_demo_2").await.unwrap();
        let response = app.settle("nba_demo_2", &p.predicted_outcome).await.unwrap();

        for (after, before) in response.factors.iter().zip(default_factors().iter()) {
            assert!((after.current_weight - (before.current_weight + 0.005)).abs() < 1e-12);
        }

        let open = app.list_games(Some("nba")).await.unwrap();
        assert!(open.iter().all(|g| g.game_id != "nba_demo_2"));
    }

    #[tokio::test]
    async fn test_settle_twice_learns_once() {
        let app = learning_app();
        let p = app.predict("nba_demo_1").await.unwrap();
        app.settle("nba_demo_1", &p.predicted_outcome).await.unwrap();

        let err = app
            .settle("nba_demo_1", &p.predicted_outcome)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already settled"));

        let factors = app.factors().await;
        assert!((factors[0].current_weight - 0.205).abs() < 1e-12);
        for (after, before) in factors.iter().zip(default_factors().iter()) {
            assert!((after.current_weight - (before.current_weight + 0.005)).abs() < 1e-12);
        }
    }

    #[tokio::test]
    async fn test_settle_rejects_foreign_outcome() {
        let app = learning_app();
        let err = app.settle("nba_demo_1", "New York Knicks").await.unwrap_err();
        assert!(err.to_string().contains("neither"));
        assert_eq!(app.factors().await, default_factors());
    }

    #[tokio::test]
    async fn test_demo_mode_does_not_learn() {
        let app = App::demo(LearningConfig::default());
        let p = app.predict("nba_demo_1").await.unwrap();
        app.settle("nba_demo_1", &p.predicted_outcome).await.unwrap();
        assert_eq!(app.factors().await, default_factors());
    }

    #[test]
    fn test_settle_response_shape() {
        let response = SettleResponse {
            result: ResultLog {
                game_id: "g1".into(),
                actual_outcome: "A".into(),
            },
            factors: vec![],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["game_id"], "g1");
        assert_eq!(json["actual_outcome"], "A");
    }
}
