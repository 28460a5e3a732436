//! Prediction engine.
//!
//! Combines per-factor comparison scores with the current factor weights to
//! pick a winner, and nudges those weights once the real outcome is known.
//!
//! Scoring for competitors A and B:
//! - each factor present in both the store and the comparison source adds
//!   `score * current_weight` to that competitor's total
//! - the larger total wins; A wins exact ties (including 0 + 0)
//! - confidence is the winner's share of the combined total, as a percentage

pub mod reasons;

use crate::comparison::FactorComparisonSource;
use crate::factor_store::FactorStore;
use crate::history::PredictionHistory;
use crate::models::{ContributionPair, Factor, FactorComparison, FactorContributions, Prediction};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub use reasons::{rank_reasons, MAX_REASONS};

/// Confidence reported when neither competitor scores anything.
pub const DEAD_HEAT_CONFIDENCE: f64 = 50.0;

/// How far factor weights move after an observed outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningConfig {
    pub learning_rate: f64,
    /// Fraction of the learning rate applied per update.
    pub adjustment_fraction: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            adjustment_fraction: 0.1,
        }
    }
}

impl LearningConfig {
    /// Magnitude of a single weight nudge.
    pub fn delta(&self) -> f64 {
        self.learning_rate * self.adjustment_fraction
    }
}

/// Round to `places` decimal places.
#[inline]
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Score a matchup from an explicit factor set and comparison set.
///
/// Factors are visited in slice order; factors without a comparison (and
/// comparisons without a factor) are skipped.
pub fn score_matchup(
    event_id: &str,
    competitor_a: &str,
    competitor_b: &str,
    factors: &[Factor],
    comparisons: &[FactorComparison],
) -> Prediction {
    let by_factor: HashMap<i32, &FactorComparison> =
        comparisons.iter().map(|c| (c.factor_id, c)).collect();

    let mut total_a = 0.0;
    let mut total_b = 0.0;
    let mut factor_contributions = FactorContributions::new();

    for factor in factors {
        let Some(scores) = by_factor.get(&factor.id) else {
            continue;
        };
        let contribution_a = scores.score_a * factor.current_weight;
        let contribution_b = scores.score_b * factor.current_weight;
        total_a += contribution_a;
        total_b += contribution_b;

        factor_contributions.insert(
            factor.name.clone(),
            ContributionPair {
                competitor_a: round_to(contribution_a, 3),
                competitor_b: round_to(contribution_b, 3),
            },
        );
    }

    let winner_is_a = total_a >= total_b;
    let (winner, winning_total) = if winner_is_a {
        (competitor_a, total_a)
    } else {
        (competitor_b, total_b)
    };

    let combined = total_a + total_b;
    let confidence = if combined > 0.0 {
        round_to((winning_total / combined * 100.0).min(100.0), 2)
    } else {
        DEAD_HEAT_CONFIDENCE
    };

    let reasons = rank_reasons(&factor_contributions, winner, winner_is_a);

    Prediction {
        event_id: event_id.to_string(),
        predicted_outcome: winner.to_string(),
        confidence,
        reasons,
        factor_contributions,
    }
}

pub struct PredictionEngine {
    store: Arc<FactorStore>,
    comparisons: Arc<dyn FactorComparisonSource>,
    history: Arc<dyn PredictionHistory>,
    learning: LearningConfig,
}

impl PredictionEngine {
    pub fn new(
        store: Arc<FactorStore>,
        comparisons: Arc<dyn FactorComparisonSource>,
        history: Arc<dyn PredictionHistory>,
    ) -> Self {
        Self {
            store,
            comparisons,
            history,
            learning: LearningConfig::default(),
        }
    }

    pub fn with_learning(mut self, learning: LearningConfig) -> Self {
        self.learning = learning;
        self
    }

    pub fn store(&self) -> &Arc<FactorStore> {
        &self.store
    }

    pub fn history(&self) -> &Arc<dyn PredictionHistory> {
        &self.history
    }

    /// Predict the winner between `competitor_a` and `competitor_b`.
    ///
    /// Reads the store but never writes it. A failing comparison source is
    /// treated as having no comparisons, which yields a dead heat.
    pub async fn calculate_prediction(
        &self,
        event_id: &str,
        competitor_a: &str,
        competitor_b: &str,
    ) -> Prediction {
        let factors = self.store.get_all().await;
        let comparisons = match self
            .comparisons
            .compare(event_id, competitor_a, competitor_b)
            .await
        {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "Comparison source '{}' failed for {}: {}",
                    self.comparisons.source_name(),
                    event_id,
                    e
                );
                Vec::new()
            }
        };

        let prediction =
            score_matchup(event_id, competitor_a, competitor_b, &factors, &comparisons);
        debug!(
            "Predicted {} for {} ({:.2}% over {} factors)",
            prediction.predicted_outcome,
            event_id,
            prediction.confidence,
            prediction.factor_contributions.len()
        );
        prediction
    }

    /// Learn from an observed outcome.
    ///
    /// Every factor moves by the same delta: up when the recorded prediction
    /// was right, down when it was wrong. Missing history, disabled learning
    /// and persistence failures are logged and otherwise ignored.
    pub async fn update_weights(&self, event_id: &str, actual_outcome: &str) {
        if !self.store.is_learning_enabled() {
            info!("Learning disabled, skipping weight update for {}", event_id);
            return;
        }

        let recorded = match self.history.get_prediction(event_id).await {
            Ok(Some(p)) => p,
            Ok(None) => {
                debug!("No recorded prediction for {}, nothing to learn", event_id);
                return;
            }
            Err(e) => {
                error!("Failed to load prediction for {}: {}", event_id, e);
                return;
            }
        };

        let was_correct = recorded.predicted_outcome == actual_outcome;
        let delta = if was_correct {
            self.learning.delta()
        } else {
            -self.learning.delta()
        };

        match self.store.nudge_all(delta).await {
            Ok(report) => info!(
                "Weights {} by {:.4} after {} prediction for {} ({} factors, {} pinned)",
                if was_correct { "raised" } else { "lowered" },
                delta.abs(),
                if was_correct { "correct" } else { "incorrect" },
                event_id,
                report.updated,
                report.pinned
            ),
            Err(e) => error!("Error updating weights for {}: {}", event_id, e),
        }
    }
}
