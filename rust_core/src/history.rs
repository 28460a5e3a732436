//! Prediction history collaborator.

use crate::error::RepositoryResult;
use crate::models::Prediction;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Remembers which prediction was served for each event.
#[async_trait]
pub trait PredictionHistory: Send + Sync {
    /// Most recently recorded prediction for `event_id`, if any.
    async fn get_prediction(&self, event_id: &str) -> RepositoryResult<Option<Prediction>>;

    async fn record_prediction(&self, prediction: &Prediction) -> RepositoryResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryPredictionHistory {
    predictions: RwLock<HashMap<String, Prediction>>,
}

impl InMemoryPredictionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.predictions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.read().is_empty()
    }
}

#[async_trait]
impl PredictionHistory for InMemoryPredictionHistory {
    async fn get_prediction(&self, event_id: &str) -> RepositoryResult<Option<Prediction>> {
        Ok(self.predictions.read().get(event_id).cloned())
    }

    async fn record_prediction(&self, prediction: &Prediction) -> RepositoryResult<()> {
        self.predictions
            .write()
            .insert(prediction.event_id.clone(), prediction.clone());
        Ok(())
    }
}
