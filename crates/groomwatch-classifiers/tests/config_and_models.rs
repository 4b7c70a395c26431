//! Integration tests for configuration types, the model factory and the
//! classifier lifecycle.

use groomwatch_classifiers::config::{EvaluationConfig, ModelConfig, ModelType};
use groomwatch_classifiers::metrics::{f1_score, MetricReport};
use groomwatch_classifiers::models::factory::build_model;
use groomwatch_classifiers::Error;
use ndarray::Array2;

fn clusters() -> (Array2<f64>, Vec<u8>) {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..12 {
        let offset = i as f64 * 0.02;
        rows.extend_from_slice(&[0.9 - offset, 0.1 + offset, 0.0]);
        labels.push(1);
        rows.extend_from_slice(&[0.1 + offset, 0.0, 0.9 - offset]);
        labels.push(0);
    }
    (Array2::from_shape_vec((24, 3), rows).unwrap(), labels)
}

fn all_model_types() -> Vec<ModelConfig> {
    vec![
        ModelConfig::new(ModelType::logistic_regression()),
        ModelConfig::new(ModelType::linear_svm()),
        ModelConfig::new(ModelType::Mlp {
            hidden_units: 8,
            learning_rate: 1e-2,
            alpha: 1e-4,
            batch_size: 8,
            max_epochs: 300,
            tol: 1e-5,
            n_iter_no_change: 10,
        }),
    ]
}

// ---------------------------------------------------------------------------
// Classifier lifecycle
// ---------------------------------------------------------------------------

#[test]
fn every_model_learns_separable_clusters() {
    let (x, y) = clusters();
    for config in all_model_types() {
        let mut model = build_model(&config, 42);
        model.fit(&x, &y).unwrap();
        let score = model.score(&x, &y).unwrap();
        assert!(score >= 0.9, "{} scored {}", model.name(), score);
        let predictions = model.predict(&x).unwrap();
        assert!(f1_score(&y, &predictions).unwrap() >= 0.9);
    }
}

#[test]
fn every_model_rejects_predict_before_fit() {
    let (x, _) = clusters();
    for config in all_model_types() {
        let model = build_model(&config, 42);
        assert!(matches!(model.predict(&x), Err(Error::NotFitted { .. })));
    }
}

#[test]
fn every_model_rejects_second_fit() {
    let (x, y) = clusters();
    for config in all_model_types() {
        let mut model = build_model(&config, 42);
        model.fit(&x, &y).unwrap();
        assert!(matches!(
            model.fit(&x, &y),
            Err(Error::AlreadyFitted { .. })
        ));
    }
}

#[test]
fn every_model_rejects_single_class_training() {
    let (x, _) = clusters();
    let y = vec![0u8; x.nrows()];
    for config in all_model_types() {
        let mut model = build_model(&config, 42);
        assert!(matches!(
            model.fit(&x, &y),
            Err(Error::InsufficientData(_))
        ));
        assert!(!model.is_fitted());
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn evaluation_config_round_trips_json() {
    let config = EvaluationConfig::default();
    let json = serde_json::to_string_pretty(&config).unwrap();
    assert!(json.contains("\"max_features\""));
    assert!(json.contains("\"keyword_scope\": \"both\""));
    let parsed: EvaluationConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn metric_report_rejects_mismatched_lengths() {
    assert!(matches!(
        MetricReport::compute(&[1, 0, 1], &[1]),
        Err(Error::MetricComputation { expected: 3, actual: 1 })
    ));
}
