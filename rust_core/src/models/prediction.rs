//! Prediction record and its ordered per-factor contribution map.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Weighted contribution of one factor to each competitor's total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContributionPair {
    #[serde(rename = "team_a")]
    pub competitor_a: f64,
    #[serde(rename = "team_b")]
    pub competitor_b: f64,
}

impl ContributionPair {
    pub fn abs_difference(&self) -> f64 {
        (self.competitor_a - self.competitor_b).abs()
    }
}

/// Factor name -> contribution pair, kept in insertion order.
///
/// Serializes as a JSON object whose keys appear in factor iteration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactorContributions {
    entries: Vec<(String, ContributionPair)>,
}

impl FactorContributions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a factor's pair. Replacing keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, pair: ContributionPair) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = pair,
            None => self.entries.push((name, pair)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ContributionPair> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, pair)| pair)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContributionPair)> {
        self.entries.iter().map(|(n, pair)| (n.as_str(), pair))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FactorContributions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, pair) in &self.entries {
            map.serialize_entry(name, pair)?;
        }
        map.end()
    }
}

struct ContributionsVisitor;

impl<'de> Visitor<'de> for ContributionsVisitor {
    type Value = FactorContributions;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of factor name to contribution pair")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
        let mut contributions = FactorContributions::new();
        while let Some((name, pair)) = access.next_entry::<String, ContributionPair>()? {
            contributions.insert(name, pair);
        }
        Ok(contributions)
    }
}

impl<'de> Deserialize<'de> for FactorContributions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ContributionsVisitor)
    }
}

/// Outcome of a single prediction request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "game_id")]
    pub event_id: String,
    pub predicted_outcome: String,
    /// Percentage in (50, 100], or exactly 50 for a dead heat.
    pub confidence: f64,
    /// Up to three sentences, most differentiating factor first.
    pub reasons: Vec<String>,
    pub factor_contributions: FactorContributions,
}
