//! End-to-end runs of the evaluation pipeline on a synthetic chat corpus.

use std::io::Write;
use std::path::PathBuf;

use groomwatch_classifiers::config::{EvaluationConfig, KeywordScope, ModelConfig, ModelType};
use groomwatch_classifiers::corpus::Corpus;
use groomwatch_classifiers::evaluation::{
    run_evaluation, run_pipeline, DetectorRole, Evaluation, EvaluationScope,
};
use groomwatch_classifiers::Stage;

const GROOMING_TEMPLATES: &[&str] = &[
    "you are so mature for your age, this stays our secret",
    "don't tell your parents we talk every night",
    "are you alone right now? send me a pic",
    "delete this chat after you read it, nobody needs to know",
    "what school do you go to, maybe we could meet in person",
    "you can trust me more than your friends, keep this between us",
];

const NORMAL_TEMPLATES: &[&str] = &[
    "good game tonight, want a rematch tomorrow",
    "did you finish the science homework yet",
    "my dog chewed the controller again lol",
    "practice moved to thursday after school",
    "that new level is really hard, I keep falling",
    "mom says dinner is ready, brb",
    "the football match was amazing on saturday",
];

/// 30 grooming and 70 normal messages with per-row variation.
fn synthetic_rows() -> Vec<(String, u8)> {
    let mut rows = Vec::new();
    for i in 0..30 {
        let text = format!("{} {}", GROOMING_TEMPLATES[i % GROOMING_TEMPLATES.len()], i);
        rows.push((text, 1));
    }
    for i in 0..70 {
        let text = format!("{} round {}", NORMAL_TEMPLATES[i % NORMAL_TEMPLATES.len()], i);
        rows.push((text, 0));
    }
    rows
}

fn write_csv(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("chats.csv");
    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer.write_record(["text", "label"]).unwrap();
    for (text, label) in synthetic_rows() {
        writer.write_record([text, label.to_string()]).unwrap();
    }
    writer.flush().unwrap();
    path
}

fn quick_baselines() -> Vec<ModelConfig> {
    vec![
        ModelConfig::named("svm_baseline", ModelType::linear_svm()),
        ModelConfig::named(
            "mlp_baseline",
            ModelType::Mlp {
                hidden_units: 16,
                learning_rate: 1e-2,
                alpha: 1e-4,
                batch_size: 32,
                max_epochs: 200,
                tol: 1e-4,
                n_iter_no_change: 10,
            },
        ),
    ]
}

// ---------------------------------------------------------------------------
// Full run from a CSV file
// ---------------------------------------------------------------------------

#[test]
fn hundred_sample_corpus_yields_stratified_test_split() {
    let dir = tempfile::tempdir().unwrap();
    let config = EvaluationConfig {
        data_path: write_csv(&dir),
        baselines: quick_baselines(),
        ..EvaluationConfig::default()
    };

    let report = run_evaluation(config).unwrap();

    assert_eq!(report.run.corpus.grooming, 30);
    assert_eq!(report.run.corpus.normal, 70);
    assert_eq!(report.run.test.grooming, 6);
    assert_eq!(report.run.test.normal, 14);
    assert_eq!(report.run.train.total(), 80);
    assert!(report.run.vocabulary_size > 0);
    assert!(report.run.vocabulary_size <= 1000);
}

#[test]
fn every_score_lies_in_unit_interval() {
    let dir = tempfile::tempdir().unwrap();
    let config = EvaluationConfig {
        data_path: write_csv(&dir),
        baselines: quick_baselines(),
        ..EvaluationConfig::default()
    };

    let report = run_evaluation(config).unwrap();

    for model in &report.models {
        let m = &model.metrics;
        for score in [m.accuracy, m.f1, m.precision, m.recall] {
            assert!((0.0..=1.0).contains(&score), "{} scored {}", model.name, score);
        }
        let expected_support = match model.scope {
            EvaluationScope::TestSplit => 20,
            EvaluationScope::FullCorpus => 100,
        };
        assert_eq!(m.support, expected_support);
    }
}

#[test]
fn f1_delta_is_the_exact_difference() {
    let dir = tempfile::tempdir().unwrap();
    let config = EvaluationConfig {
        data_path: write_csv(&dir),
        baselines: quick_baselines(),
        ..EvaluationConfig::default()
    };

    let report = run_evaluation(config).unwrap();
    let primary = report.primary().unwrap();
    assert_eq!(primary.role, DetectorRole::Primary);

    // svm, mlp and the keyword filter on the test split
    assert_eq!(report.f1_deltas.len(), 3);
    for delta in &report.f1_deltas {
        let baseline = report
            .model(&delta.baseline, EvaluationScope::TestSplit)
            .unwrap();
        assert_eq!(delta.primary_f1, primary.metrics.f1);
        assert_eq!(delta.baseline_f1, baseline.metrics.f1);
        assert_eq!(delta.delta, delta.primary_f1 - delta.baseline_f1);
    }
}

#[test]
fn repeated_runs_with_same_seed_agree() {
    let dir = tempfile::tempdir().unwrap();
    let config = EvaluationConfig {
        data_path: write_csv(&dir),
        baselines: quick_baselines(),
        ..EvaluationConfig::default()
    };

    let first = run_evaluation(config.clone()).unwrap();
    let second = run_evaluation(config).unwrap();
    assert_eq!(first.models, second.models);
    assert_eq!(first.f1_deltas, second.f1_deltas);
}

#[test]
fn report_serializes_with_scope_labels() {
    let dir = tempfile::tempdir().unwrap();
    let config = EvaluationConfig {
        data_path: write_csv(&dir),
        baselines: vec![ModelConfig::named("svm_baseline", ModelType::linear_svm())],
        ..EvaluationConfig::default()
    };

    let report = run_evaluation(config).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"test_split\""));
    assert!(json.contains("\"full_corpus\""));
    assert!(json.contains("Leiva-Bianchi"));
}

// ---------------------------------------------------------------------------
// In-memory corpus and stage failures
// ---------------------------------------------------------------------------

#[test]
fn keyword_scope_controls_keyword_reports() {
    let rows = synthetic_rows();
    let texts: Vec<&str> = rows.iter().map(|(t, _)| t.as_str()).collect();
    let labels: Vec<u8> = rows.iter().map(|(_, l)| *l).collect();
    let corpus = Corpus::from_pairs(&texts, &labels).unwrap();

    let config = EvaluationConfig {
        keyword_scope: KeywordScope::TestSplit,
        baselines: Vec::new(),
        ..EvaluationConfig::default()
    };
    let report = run_pipeline(Evaluation::from_corpus(config, corpus)).unwrap();

    assert!(report
        .model("keyword_filter", EvaluationScope::TestSplit)
        .is_some());
    assert!(report
        .model("keyword_filter", EvaluationScope::FullCorpus)
        .is_none());
    assert_eq!(report.paired_tests.len(), 1);
}

#[test]
fn too_few_grooming_samples_fail_in_split_stage() {
    let texts = ["our secret", "nice game", "homework due", "see you at practice"];
    let labels = [1, 0, 0, 0];
    let corpus = Corpus::from_pairs(&texts, &labels).unwrap();

    let err = run_pipeline(Evaluation::from_corpus(EvaluationConfig::default(), corpus))
        .unwrap_err();
    assert_eq!(err.stage, Stage::SplitReady);
    assert!(err.to_string().contains("stratified split"));
}

#[test]
fn bad_label_fails_in_load_stage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "text,label\nhello there,0\nwhere do you live,yes").unwrap();

    let config = EvaluationConfig {
        data_path: path,
        ..EvaluationConfig::default()
    };
    let err = run_evaluation(config).unwrap_err();
    assert_eq!(err.stage, Stage::DataLoaded);
}
