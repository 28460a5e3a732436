//! End-to-end tests for the predict -> record -> settle -> learn loop.
//!
//! Uses the in-memory collaborators only; no database or network required.

use betcheck_core::{
    default_factors, FactorStore, InMemoryFactorRepository, InMemoryPredictionHistory,
    LearningConfig, PredictionEngine, PredictionHistory, StaticComparisonSource,
};
use std::sync::Arc;

fn build_engine() -> (PredictionEngine, Arc<InMemoryPredictionHistory>) {
    let repo = Arc::new(InMemoryFactorRepository::with_defaults());
    let store = Arc::new(FactorStore::new(repo));
    let history = Arc::new(InMemoryPredictionHistory::new());
    let engine = PredictionEngine::new(
        store,
        Arc::new(StaticComparisonSource::reference()),
        history.clone(),
    )
    .with_learning(LearningConfig::default());
    (engine, history)
}

#[tokio::test]
async fn test_reference_prediction_for_demo_game() {
    let (engine, _) = build_engine();
    let p = engine
        .calculate_prediction("nba_demo_1", "Los Angeles Lakers", "Boston Celtics")
        .await;

    assert_eq!(p.event_id, "nba_demo_1");
    assert_eq!(p.predicted_outcome, "Los Angeles Lakers");
    assert!((p.confidence - 52.3).abs() < 1e-9);
    assert_eq!(
        p.reasons[0],
        "Home Court Advantage: Los Angeles Lakers has stronger home court advantage (0.16)"
    );

    let names: Vec<&str> = p.factor_contributions.names().collect();
    assert_eq!(
        names,
        vec![
            "Recent Form",
            "Injury Status",
            "Offensive Efficiency",
            "Defensive Efficiency",
            "Home Court Advantage",
        ]
    );
}

#[tokio::test]
async fn test_reasons_ordered_by_gap() {
    let (engine, _) = build_engine();
    let p = engine.calculate_prediction("g", "A", "B").await;

    assert!(p.reasons.len() <= 3);
    let gaps: Vec<f64> = p
        .reasons
        .iter()
        .map(|r| {
            let name = r.split(':').next().unwrap();
            p.factor_contributions.get(name).unwrap().abs_difference()
        })
        .collect();
    assert!(gaps.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_correct_predictions_raise_every_factor() {
    let (engine, history) = build_engine();
    let p = engine.calculate_prediction("g1", "A", "B").await;
    history.record_prediction(&p).await.unwrap();

    let before = engine.store().get_all().await;
    engine.update_weights("g1", &p.predicted_outcome).await;
    let after = engine.store().get_all().await;

    for (b, a) in before.iter().zip(after.iter()) {
        assert!(a.current_weight >= b.current_weight);
        assert!((a.current_weight - (b.current_weight + 0.005)).abs() < 1e-12);
        assert_eq!(a.base_weight, b.base_weight);
    }
}

#[tokio::test]
async fn test_wrong_predictions_lower_until_min() {
    let (engine, history) = build_engine();
    let p = engine.calculate_prediction("g1", "A", "B").await;
    history.record_prediction(&p).await.unwrap();

    for _ in 0..100 {
        engine.update_weights("g1", "B").await;
    }

    for f in engine.store().get_all().await {
        assert_eq!(f.current_weight, f.min_weight, "{} not pinned at min", f.name);
    }
}

#[tokio::test]
async fn test_learning_changes_next_prediction() {
    let (engine, history) = build_engine();
    let first = engine.calculate_prediction("g1", "A", "B").await;
    history.record_prediction(&first).await.unwrap();
    engine.update_weights("g1", "B").await;

    let second = engine.calculate_prediction("g1", "A", "B").await;
    assert_ne!(first.factor_contributions, second.factor_contributions);
}

#[tokio::test]
async fn test_unknown_event_leaves_store_unchanged() {
    let (engine, _) = build_engine();
    engine.update_weights("never_predicted", "A").await;
    assert_eq!(engine.store().get_all().await, default_factors());
}

#[tokio::test]
async fn test_concurrent_updates_are_serialized() {
    let (engine, history) = build_engine();
    let engine = Arc::new(engine);
    let p = engine.calculate_prediction("g1", "A", "B").await;
    history.record_prediction(&p).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine.update_weights("g1", "A").await;
        }));
    }
    for t in tasks {
        t.await.unwrap();
    }

    // No lost updates: 10 nudges of 0.005 each, within every factor's headroom.
    let defaults = default_factors();
    for (f, d) in engine.store().get_all().await.iter().zip(defaults.iter()) {
        let expected = (d.current_weight + 0.05).min(d.max_weight);
        assert!((f.current_weight - expected).abs() < 1e-9, "{}", f.name);
    }
}
