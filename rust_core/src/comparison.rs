//! Sources of per-factor comparison scores.

use crate::models::FactorComparison;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Supplies a [`FactorComparison`] per factor for a pair of competitors.
#[async_trait]
pub trait FactorComparisonSource: Send + Sync {
    /// Comparisons for `competitor_a` vs `competitor_b`.
    ///
    /// Factors without a comparison are simply absent from the result.
    async fn compare(
        &self,
        event_id: &str,
        competitor_a: &str,
        competitor_b: &str,
    ) -> Result<Vec<FactorComparison>>;

    /// Source name for logging and debugging
    fn source_name(&self) -> &str;
}

/// Fixed scores keyed by factor id, the same for every matchup.
#[derive(Debug, Clone)]
pub struct StaticComparisonSource {
    scores: HashMap<i32, FactorComparison>,
}

impl StaticComparisonSource {
    pub fn new(comparisons: impl IntoIterator<Item = FactorComparison>) -> Self {
        Self {
            scores: comparisons.into_iter().map(|c| (c.factor_id, c)).collect(),
        }
    }

    /// Illustrative scores for the five default factors.
    pub fn reference() -> Self {
        Self::new([
            FactorComparison::new(1, 0.75, 0.65),
            FactorComparison::new(2, 0.70, 0.80),
            FactorComparison::new(3, 0.82, 0.68),
            FactorComparison::new(4, 0.72, 0.75),
            FactorComparison::new(5, 0.80, 0.60),
        ])
    }
}

impl Default for StaticComparisonSource {
    fn default() -> Self {
        Self::reference()
    }
}

#[async_trait]
impl FactorComparisonSource for StaticComparisonSource {
    async fn compare(
        &self,
        _event_id: &str,
        _competitor_a: &str,
        _competitor_b: &str,
    ) -> Result<Vec<FactorComparison>> {
        let mut comparisons: Vec<FactorComparison> = self.scores.values().copied().collect();
        comparisons.sort_by_key(|c| c.factor_id);
        Ok(comparisons)
    }

    fn source_name(&self) -> &str {
        "static"
    }
}
