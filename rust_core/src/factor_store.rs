//! Factor Store: the current factor set and its bounded weights.
//!
//! The store wraps an optional [`FactorRepository`]. Whether a repository is
//! present is decided once, at construction:
//! - with a repository, reads go to it and fall back to the default factor
//!   set if it errors; writes are clamped and persisted
//! - without one, the default factor set is served and learning is disabled
//!
//! All writes are serialized behind one async mutex. Reads take no lock.

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{default_factors, Factor};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Persistence collaborator for factors.
#[async_trait]
pub trait FactorRepository: Send + Sync {
    /// All stored factors, in any order.
    async fn get_all_factors(&self) -> RepositoryResult<Vec<Factor>>;

    /// Overwrite one factor's current weight. Unknown ids are a no-op.
    async fn set_factor_weight(&self, factor_id: i32, weight: f64) -> RepositoryResult<()>;

    /// Backend name for logging
    fn backend_name(&self) -> &str;
}

/// Process-local factor repository.
#[derive(Debug)]
pub struct InMemoryFactorRepository {
    factors: RwLock<Vec<Factor>>,
}

impl InMemoryFactorRepository {
    pub fn new(factors: Vec<Factor>) -> Self {
        Self {
            factors: RwLock::new(factors),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_factors())
    }
}

#[async_trait]
impl FactorRepository for InMemoryFactorRepository {
    async fn get_all_factors(&self) -> RepositoryResult<Vec<Factor>> {
        Ok(self.factors.read().clone())
    }

    async fn set_factor_weight(&self, factor_id: i32, weight: f64) -> RepositoryResult<()> {
        let mut factors = self.factors.write();
        if let Some(f) = factors.iter_mut().find(|f| f.id == factor_id) {
            f.current_weight = weight;
        }
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

/// Result of nudging every factor by the same delta.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NudgeReport {
    /// Factors whose weight was written.
    pub updated: usize,
    /// Factors left sitting at one of their weight bounds.
    pub pinned: usize,
}

pub struct FactorStore {
    repository: Option<Arc<dyn FactorRepository>>,
    defaults: Vec<Factor>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for FactorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactorStore")
            .field(
                "backend",
                &self.repository.as_ref().map(|r| r.backend_name().to_string()),
            )
            .field("defaults", &self.defaults.len())
            .finish()
    }
}

impl FactorStore {
    /// Store backed by a persistence collaborator.
    pub fn new(repository: Arc<dyn FactorRepository>) -> Self {
        info!("Factor store using '{}' backend", repository.backend_name());
        Self {
            repository: Some(repository),
            defaults: default_factors(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store with no persistence: serves the default factor set, never learns.
    pub fn unavailable() -> Self {
        info!("Factor store has no persistence; serving default factors, learning disabled");
        Self {
            repository: None,
            defaults: default_factors(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn is_learning_enabled(&self) -> bool {
        self.repository.is_some()
    }

    /// Current factor set ordered by id.
    ///
    /// Repository failures degrade to the default set rather than erroring.
    pub async fn get_all(&self) -> Vec<Factor> {
        let mut factors = match &self.repository {
            Some(repo) => match repo.get_all_factors().await {
                Ok(factors) => factors,
                Err(e) => {
                    warn!(
                        "Failed to read factors from '{}' backend, using defaults: {}",
                        repo.backend_name(),
                        e
                    );
                    self.defaults.clone()
                }
            },
            None => self.defaults.clone(),
        };
        factors.sort_by_key(|f| f.id);
        factors
    }

    /// Set one factor's current weight, clamped into its bounds.
    ///
    /// Unknown ids are ignored. Without a repository this is a no-op.
    pub async fn update_weight(&self, factor_id: i32, new_weight: f64) -> RepositoryResult<()> {
        let Some(repo) = &self.repository else {
            debug!("Ignoring weight update for factor {}: learning disabled", factor_id);
            return Ok(());
        };

        let _guard = self.write_lock.lock().await;
        let factors = repo.get_all_factors().await?;
        let Some(factor) = factors.iter().find(|f| f.id == factor_id) else {
            debug!("Ignoring weight update for unknown factor {}", factor_id);
            return Ok(());
        };

        let clamped = factor.clamp_weight(new_weight);
        repo.set_factor_weight(factor_id, clamped).await
    }

    /// Move every factor's current weight by `delta`, clamped per factor.
    ///
    /// Runs as one read-then-write sequence under the write lock. The first
    /// failing write aborts the loop; factors written before it stay written.
    pub async fn nudge_all(&self, delta: f64) -> RepositoryResult<NudgeReport> {
        let Some(repo) = &self.repository else {
            return Err(RepositoryError::Unavailable(
                "factor store has no persistence backend".to_string(),
            ));
        };

        let _guard = self.write_lock.lock().await;
        let mut factors = repo.get_all_factors().await?;
        factors.sort_by_key(|f| f.id);

        let mut report = NudgeReport::default();
        for factor in &factors {
            let moved = factor.with_current_weight(factor.current_weight + delta);
            if moved.is_pinned() {
                report.pinned += 1;
            }
            repo.set_factor_weight(factor.id, moved.current_weight)
                .await
                .map_err(|e| {
                    warn!(
                        "Weight update stopped at factor {} ({} of {} written): {}",
                        factor.id,
                        report.updated,
                        factors.len(),
                        e
                    );
                    e
                })?;
            report.updated += 1;
        }

        Ok(report)
    }
}
