//! Bet Check Core - weighted-factor game prediction with adaptive weights.
//!
//! This module provides:
//! - Factor Store with bounded, clamped weights and a default-factor fallback
//! - Prediction engine: weighted scoring, confidence and ranked reasons
//! - Weight learning from observed outcomes
//! - Pluggable collaborators for factor persistence, prediction history,
//!   comparison scores and game schedules
//! - Postgres implementations of the persistence collaborators

pub mod comparison;
pub mod db;
pub mod error;
pub mod factor_store;
pub mod games;
pub mod history;
pub mod models;
pub mod prediction;

pub use comparison::{FactorComparisonSource, StaticComparisonSource};
pub use error::{RepositoryError, RepositoryResult};
pub use factor_store::{FactorRepository, FactorStore, InMemoryFactorRepository, NudgeReport};
pub use games::{GameSource, InMemoryGameSource};
pub use history::{InMemoryPredictionHistory, PredictionHistory};
pub use models::{
    default_factors, ContributionPair, Factor, FactorComparison, FactorContributions, Game,
    Prediction, ResultLog,
};
pub use prediction::{score_matchup, LearningConfig, PredictionEngine};
