// Shared models for the Bet Check prediction services
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod prediction;

pub use prediction::{ContributionPair, FactorContributions, Prediction};

// ============================================================================
// Factors
// ============================================================================

/// A named weighting factor.
///
/// `current_weight` is the only mutable field and always stays inside
/// `[min_weight, max_weight]`. Construct through [`Factor::new`] or go
/// through [`Factor::with_current_weight`] to keep that bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    #[serde(rename = "factor_id")]
    pub id: i32,
    pub name: String,
    pub base_weight: f64,
    pub current_weight: f64,
    pub min_weight: f64,
    pub max_weight: f64,
}

impl Factor {
    /// Create a factor whose current weight starts at its base weight.
    pub fn new(
        id: i32,
        name: impl Into<String>,
        base_weight: f64,
        min_weight: f64,
        max_weight: f64,
    ) -> Self {
        let mut factor = Self {
            id,
            name: name.into(),
            base_weight,
            current_weight: base_weight,
            min_weight,
            max_weight,
        };
        factor.current_weight = factor.clamp_weight(base_weight);
        factor
    }

    /// Clamp a candidate weight into this factor's `[min_weight, max_weight]` range.
    ///
    /// A NaN candidate collapses to `min_weight`.
    pub fn clamp_weight(&self, weight: f64) -> f64 {
        if weight.is_nan() {
            return self.min_weight;
        }
        weight.max(self.min_weight).min(self.max_weight)
    }

    /// Copy of this factor with a new (clamped) current weight.
    pub fn with_current_weight(&self, weight: f64) -> Self {
        Self {
            current_weight: self.clamp_weight(weight),
            ..self.clone()
        }
    }

    /// Whether `current_weight` sits at either bound.
    pub fn is_pinned(&self) -> bool {
        self.current_weight <= self.min_weight || self.current_weight >= self.max_weight
    }
}

/// Factor set used for seeding and whenever persistence is unavailable.
pub fn default_factors() -> Vec<Factor> {
    vec![
        Factor::new(1, "Recent Form", 0.20, 0.05, 0.40),
        Factor::new(2, "Injury Status", 0.18, 0.05, 0.35),
        Factor::new(3, "Offensive Efficiency", 0.22, 0.10, 0.40),
        Factor::new(4, "Defensive Efficiency", 0.20, 0.10, 0.35),
        Factor::new(5, "Home Court Advantage", 0.20, 0.05, 0.35),
    ]
}

// ============================================================================
// Factor Comparisons
// ============================================================================

/// Raw per-factor scores for the two competitors, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorComparison {
    pub factor_id: i32,
    pub score_a: f64,
    pub score_b: f64,
}

impl FactorComparison {
    /// Scores are clamped into `[0, 1]`.
    pub fn new(factor_id: i32, score_a: f64, score_b: f64) -> Self {
        Self {
            factor_id,
            score_a: clamp_unit(score_a),
            score_b: clamp_unit(score_b),
        }
    }
}

fn clamp_unit(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

// ============================================================================
// Games
// ============================================================================

/// A scheduled game between two competitors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub game_id: String,
    pub sport: String,
    pub team_a: String,
    pub team_b: String,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub result: Option<String>,
}

impl Game {
    pub fn new(
        game_id: impl Into<String>,
        sport: impl Into<String>,
        team_a: impl Into<String>,
        team_b: impl Into<String>,
        scheduled_date: NaiveDate,
    ) -> Self {
        Self {
            game_id: game_id.into(),
            sport: sport.into().to_lowercase(),
            team_a: team_a.into(),
            team_b: team_b.into(),
            scheduled_date,
            result: None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.result.is_some()
    }

    /// Whether `name` is one of this game's two competitors.
    pub fn has_competitor(&self, name: &str) -> bool {
        self.team_a == name || self.team_b == name
    }
}

/// Observed result reported for a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultLog {
    pub game_id: String,
    pub actual_outcome: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_factors_respect_bounds() {
        let factors = default_factors();
        assert_eq!(factors.len(), 5);
        for f in &factors {
            assert!(f.min_weight <= f.base_weight && f.base_weight <= f.max_weight);
            assert_eq!(f.current_weight, f.base_weight);
        }
        let ids: Vec<i32> = factors.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_clamp_weight() {
        let f = Factor::new(1, "Recent Form", 0.5, 0.1, 0.9);
        assert_eq!(f.clamp_weight(1.5), 0.9);
        assert_eq!(f.clamp_weight(-0.2), 0.1);
        assert_eq!(f.clamp_weight(0.3), 0.3);
        assert_eq!(f.clamp_weight(f64::NAN), 0.1);
    }

    #[test]
    fn test_with_current_weight_keeps_base() {
        let f = Factor::new(1, "Recent Form", 0.5, 0.1, 0.9);
        let g = f.with_current_weight(2.0);
        assert_eq!(g.current_weight, 0.9);
        assert_eq!(g.base_weight, 0.5);
        assert!(g.is_pinned());
        assert!(!f.is_pinned());
    }

    #[test]
    fn test_comparison_scores_clamped() {
        let c = FactorComparison::new(3, 1.4, -0.1);
        assert_eq!(c.score_a, 1.0);
        assert_eq!(c.score_b, 0.0);
    }

    #[test]
    fn test_factor_serializes_with_factor_id() {
        let f = Factor::new(2, "Injury Status", 0.18, 0.05, 0.35);
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["factor_id"], 2);
        assert_eq!(json["name"], "Injury Status");
    }

    #[test]
    fn test_game_sport_lowercased() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let game = Game::new("nba_1", "NBA", "Lakers", "Celtics", date);
        assert_eq!(game.sport, "nba");
        assert!(game.has_competitor("Celtics"));
        assert!(!game.has_competitor("Knicks"));
        assert!(!game.is_settled());
    }
}
