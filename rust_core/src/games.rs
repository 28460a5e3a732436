//! Game source collaborator: where scheduled games come from.

use crate::error::RepositoryResult;
use crate::models::Game;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;

#[async_trait]
pub trait GameSource: Send + Sync {
    /// Unsettled games, optionally filtered by sport (case-insensitive).
    async fn list_open_games(&self, sport: Option<&str>) -> RepositoryResult<Vec<Game>>;

    async fn get_game(&self, game_id: &str) -> RepositoryResult<Option<Game>>;

    /// Mark an open game settled. Returns false if the game is unknown or
    /// already has a result, in which case nothing is written.
    async fn record_result(&self, game_id: &str, outcome: &str) -> RepositoryResult<bool>;
}

/// The two fallback NBA games used when no game store is configured.
pub fn demo_games(date: NaiveDate) -> Vec<Game> {
    vec![
        Game::new("nba_demo_1", "nba", "Los Angeles Lakers", "Boston Celtics", date),
        Game::new("nba_demo_2", "nba", "Golden State Warriors", "Denver Nuggets", date),
    ]
}

#[derive(Debug, Default)]
pub struct InMemoryGameSource {
    games: RwLock<Vec<Game>>,
}

impl InMemoryGameSource {
    pub fn new(games: Vec<Game>) -> Self {
        Self {
            games: RwLock::new(games),
        }
    }

    /// Demo games scheduled for today (UTC).
    pub fn demo() -> Self {
        Self::new(demo_games(Utc::now().date_naive()))
    }
}

#[async_trait]
impl GameSource for InMemoryGameSource {
    async fn list_open_games(&self, sport: Option<&str>) -> RepositoryResult<Vec<Game>> {
        let games = self.games.read();
        Ok(games
            .iter()
            .filter(|g| !g.is_settled())
            .filter(|g| sport.map_or(true, |s| g.sport.eq_ignore_ascii_case(s)))
            .cloned()
            .collect())
    }

    async fn get_game(&self, game_id: &str) -> RepositoryResult<Option<Game>> {
        Ok(self
            .games
            .read()
            .iter()
            .find(|g| g.game_id == game_id)
            .cloned())
    }

    async fn record_result(&self, game_id: &str, outcome: &str) -> RepositoryResult<bool> {
        let mut games = self.games.write();
        match games
            .iter_mut()
            .find(|g| g.game_id == game_id && !g.is_settled())
        {
            Some(game) => {
                game.result = Some(outcome.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
