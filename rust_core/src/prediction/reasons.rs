//! Human-readable reasons behind a prediction.

use crate::models::{ContributionPair, FactorContributions};
use std::cmp::Ordering;

/// Most reasons attached to a single prediction.
pub const MAX_REASONS: usize = 3;

/// Rank factors by how far apart the two contributions are and describe the
/// top [`MAX_REASONS`] from the winner's side.
///
/// The sort is stable: factors with identical gaps keep iteration order.
pub fn rank_reasons(
    contributions: &FactorContributions,
    winner: &str,
    winner_is_a: bool,
) -> Vec<String> {
    let mut ranked: Vec<(&str, &ContributionPair)> = contributions.iter().collect();
    ranked.sort_by(|x, y| {
        y.1.abs_difference()
            .partial_cmp(&x.1.abs_difference())
            .unwrap_or(Ordering::Equal)
    });

    ranked
        .into_iter()
        .take(MAX_REASONS)
        .map(|(name, pair)| {
            let value = if winner_is_a { pair.competitor_a } else { pair.competitor_b };
            format!(
                "{}: {} has stronger {} ({:.2})",
                name,
                winner,
                name.to_lowercase(),
                value
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contributions(rows: &[(&str, f64, f64)]) -> FactorContributions {
        let mut c = FactorContributions::new();
        for (name, a, b) in rows {
            c.insert(
                *name,
                ContributionPair {
                    competitor_a: *a,
                    competitor_b: *b,
                },
            );
        }
        c
    }

    #[test]
    fn test_top_three_by_gap() {
        let c = contributions(&[
            ("Recent Form", 0.15, 0.13),
            ("Injury Status", 0.126, 0.144),
            ("Offensive Efficiency", 0.18, 0.15),
            ("Defensive Efficiency", 0.144, 0.15),
            ("Home Court Advantage", 0.16, 0.12),
        ]);
        let reasons = rank_reasons(&c, "Lakers", true);
        assert_eq!(
            reasons,
            vec![
                "Home Court Advantage: Lakers has stronger home court advantage (0.16)",
                "Offensive Efficiency: Lakers has stronger offensive efficiency (0.18)",
                "Recent Form: Lakers has stronger recent form (0.15)",
            ]
        );
    }

    #[test]
    fn test_ties_keep_iteration_order() {
        let c = contributions(&[("First", 0.2, 0.1), ("Second", 0.1, 0.2), ("Third", 0.3, 0.2)]);
        let reasons = rank_reasons(&c, "B", false);
        assert!(reasons[0].starts_with("First: B"));
        assert!(reasons[0].ends_with("(0.10)"));
        assert!(reasons[1].starts_with("Second: B"));
        assert!(reasons[2].starts_with("Third: B"));
    }

    #[test]
    fn test_fewer_than_three_factors() {
        let c = contributions(&[("Only", 0.4, 0.1)]);
        assert_eq!(rank_reasons(&c, "A", true).len(), 1);
        assert!(rank_reasons(&FactorContributions::new(), "A", true).is_empty());
    }
}
