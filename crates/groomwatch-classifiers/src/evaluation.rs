//! Staged benchmark pipeline comparing the primary classifier against the
//! trained baselines and the keyword filter.
//!
//! Each stage consumes the previous one and returns a new value, so a later
//! stage can only be reached through every earlier one:
//!
//! `Evaluation` → `LoadedCorpus` → `SplitCorpus` → `FittedFeatures` →
//! `TrainedModels` → `ScoredDetectors` → `ComparisonReport`.
//!
//! Every failure is wrapped in a [`PipelineError`] naming the stage that was
//! being entered.
use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::EvaluationConfig;
use crate::corpus::{load_corpus, Corpus, CorpusReaderConfig, GROOMING};
use crate::error::{Error, PipelineError, Stage};
use crate::features::TfidfVectorizer;
use crate::keyword::KeywordDetector;
use crate::metrics::{mcnemar, McNemarResult, MetricReport};
use crate::models::factory::build_model;
use crate::models::TextClassifier;
use crate::split::{stratified_split, Split};

/// Whether a detector is the one under test or a point of comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorRole {
    Primary,
    Baseline,
}

/// Which samples a detector was scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationScope {
    TestSplit,
    FullCorpus,
}

impl std::fmt::Display for EvaluationScope {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            EvaluationScope::TestSplit => write!(f, "test split"),
            EvaluationScope::FullCorpus => write!(f, "full corpus"),
        }
    }
}

/// (normal, grooming) sample counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub normal: usize,
    pub grooming: usize,
}

impl ClassCounts {
    fn of(labels: &[u8]) -> Self {
        let grooming = labels.iter().filter(|&&l| l == GROOMING).count();
        Self {
            normal: labels.len() - grooming,
            grooming,
        }
    }

    pub fn total(&self) -> usize {
        self.normal + self.grooming
    }
}

/// Scores of one detector on one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub name: String,
    pub role: DetectorRole,
    pub scope: EvaluationScope,
    pub metrics: MetricReport,
}

/// F1 of the primary model minus F1 of one baseline, both on the test split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct F1Delta {
    pub primary: String,
    pub baseline: String,
    pub primary_f1: f64,
    pub baseline_f1: f64,
    pub delta: f64,
}

impl F1Delta {
    fn between(primary: &ModelReport, baseline: &ModelReport) -> Self {
        Self {
            primary: primary.name.clone(),
            baseline: baseline.name.clone(),
            primary_f1: primary.metrics.f1,
            baseline_f1: baseline.metrics.f1,
            delta: primary.metrics.f1 - baseline.metrics.f1,
        }
    }
}

/// McNemar's test of the primary model against one baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedTest {
    pub primary: String,
    pub baseline: String,
    #[serde(flatten)]
    pub result: McNemarResult,
}

/// A published figure quoted next to the measured results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteratureFigure {
    pub model: String,
    pub metric: String,
    pub value: f64,
    pub source: String,
}

const META_ANALYSIS: &str = "Leiva-Bianchi et al. (2025) meta-analysis";

/// Reference scores from the grooming-detection literature.
pub fn literature_figures() -> Vec<LiteratureFigure> {
    vec![
        LiteratureFigure {
            model: "svm".to_string(),
            metric: "f1".to_string(),
            value: 0.79,
            source: META_ANALYSIS.to_string(),
        },
        LiteratureFigure {
            model: "mlp".to_string(),
            metric: "accuracy".to_string(),
            value: 0.92,
            source: META_ANALYSIS.to_string(),
        },
    ]
}

/// Facts about the run the scores depend on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub timestamp: DateTime<Utc>,
    pub config: EvaluationConfig,
    pub corpus: ClassCounts,
    pub train: ClassCounts,
    pub test: ClassCounts,
    pub vocabulary_size: usize,
    pub random_seed: u64,
}

/// Final output of a benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub run: RunMetadata,
    pub models: Vec<ModelReport>,
    pub f1_deltas: Vec<F1Delta>,
    pub paired_tests: Vec<PairedTest>,
    pub literature: Vec<LiteratureFigure>,
}

impl ComparisonReport {
    pub fn primary(&self) -> Option<&ModelReport> {
        self.models.iter().find(|m| m.role == DetectorRole::Primary)
    }

    pub fn model(&self, name: &str, scope: EvaluationScope) -> Option<&ModelReport> {
        self.models
            .iter()
            .find(|m| m.name == name && m.scope == scope)
    }

    pub fn delta_against(&self, baseline: &str) -> Option<&F1Delta> {
        self.f1_deltas.iter().find(|d| d.baseline == baseline)
    }
}

fn at(stage: Stage) -> impl Fn(Error) -> PipelineError {
    move |source| PipelineError::new(stage, source)
}

/// Idle pipeline holding only its configuration.
#[derive(Debug, Clone)]
pub struct Evaluation {
    config: EvaluationConfig,
    corpus: Option<Corpus>,
}

impl Evaluation {
    pub fn new(config: EvaluationConfig) -> Self {
        Self {
            config,
            corpus: None,
        }
    }

    /// Evaluate an in-memory corpus; `data_path` and the column names are ignored.
    pub fn from_corpus(config: EvaluationConfig, corpus: Corpus) -> Self {
        Self {
            config,
            corpus: Some(corpus),
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Validate the configuration and read the corpus.
    pub fn load(self) -> std::result::Result<LoadedCorpus, PipelineError> {
        self.config.validate().map_err(at(Stage::Idle))?;

        let corpus = match self.corpus {
            Some(corpus) => corpus,
            None => {
                let reader = CorpusReaderConfig {
                    text_column: self.config.text_column.clone(),
                    label_column: self.config.label_column.clone(),
                    delimiter: None,
                };
                load_corpus(&self.config.data_path, &reader).map_err(at(Stage::DataLoaded))?
            }
        };
        if corpus.is_empty() {
            return Err(PipelineError::new(
                Stage::DataLoaded,
                Error::InsufficientData("corpus holds no samples".to_string()),
            ));
        }

        log::info!("Stage: {}", Stage::DataLoaded);
        corpus.log_summary();
        Ok(LoadedCorpus {
            config: self.config,
            corpus,
        })
    }
}

/// Corpus read and validated.
#[derive(Debug, Clone)]
pub struct LoadedCorpus {
    config: EvaluationConfig,
    corpus: Corpus,
}

impl LoadedCorpus {
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn split(self) -> std::result::Result<SplitCorpus, PipelineError> {
        let split = stratified_split(
            &self.corpus.labels(),
            self.config.test_fraction,
            self.config.random_seed,
        )
        .map_err(at(Stage::SplitReady))?;

        log::info!(
            "Stage: {} ({} train / {} test)",
            Stage::SplitReady,
            split.train.len(),
            split.test.len()
        );
        Ok(SplitCorpus {
            config: self.config,
            corpus: self.corpus,
            split,
        })
    }
}

/// Corpus partitioned into train and test indices.
#[derive(Debug, Clone)]
pub struct SplitCorpus {
    config: EvaluationConfig,
    corpus: Corpus,
    split: Split,
}

impl SplitCorpus {
    pub fn split_indices(&self) -> &Split {
        &self.split
    }

    /// Fit the vectorizer on train texts only, then transform both sides.
    pub fn fit_extractor(self) -> std::result::Result<FittedFeatures, PipelineError> {
        let stage = Stage::ExtractorFitted;
        let mut vectorizer = TfidfVectorizer::new(self.config.features.clone()).map_err(at(stage))?;

        let train_texts = self.corpus.texts_at(&self.split.train);
        let test_texts = self.corpus.texts_at(&self.split.test);
        let x_train = vectorizer.fit_transform(&train_texts).map_err(at(stage))?;
        let x_test = vectorizer.transform(&test_texts).map_err(at(stage))?;

        log::info!("Stage: {} ({} terms)", stage, x_train.ncols());
        log::debug!("Train matrix {:?}, test matrix {:?}", x_train.dim(), x_test.dim());

        Ok(FittedFeatures {
            y_train: self.corpus.labels_at(&self.split.train),
            y_test: self.corpus.labels_at(&self.split.test),
            config: self.config,
            corpus: self.corpus,
            split: self.split,
            vectorizer,
            x_train,
            x_test,
        })
    }
}

/// Train and test feature matrices in one shared vocabulary.
#[derive(Debug, Clone)]
pub struct FittedFeatures {
    config: EvaluationConfig,
    corpus: Corpus,
    split: Split,
    vectorizer: TfidfVectorizer,
    x_train: Array2<f64>,
    x_test: Array2<f64>,
    y_train: Vec<u8>,
    y_test: Vec<u8>,
}

impl FittedFeatures {
    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn train_matrix(&self) -> &Array2<f64> {
        &self.x_train
    }

    pub fn test_matrix(&self) -> &Array2<f64> {
        &self.x_test
    }

    /// Fit the primary model, then each baseline, in configuration order.
    pub fn train(self) -> std::result::Result<TrainedModels, PipelineError> {
        let stage = Stage::ModelsTrained;
        let seed = self.config.random_seed;

        let mut primary = build_model(&self.config.primary, seed);
        log::debug!("Training primary model {}", primary.name());
        primary.fit(&self.x_train, &self.y_train).map_err(at(stage))?;

        let mut baselines = Vec::with_capacity(self.config.baselines.len());
        for config in &self.config.baselines {
            let mut model = build_model(config, seed);
            log::debug!("Training baseline {}", model.name());
            model.fit(&self.x_train, &self.y_train).map_err(at(stage))?;
            baselines.push(model);
        }

        log::info!("Stage: {} ({} models)", stage, 1 + baselines.len());
        Ok(TrainedModels {
            features: self,
            primary,
            baselines,
        })
    }
}

/// Every configured classifier fitted on the same train matrix.
pub struct TrainedModels {
    features: FittedFeatures,
    primary: Box<dyn TextClassifier>,
    baselines: Vec<Box<dyn TextClassifier>>,
}

/// Predictions of one detector on one scope.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorPredictions {
    pub name: String,
    pub role: DetectorRole,
    pub scope: EvaluationScope,
    pub predictions: Vec<u8>,
}

impl TrainedModels {
    pub fn primary(&self) -> &dyn TextClassifier {
        self.primary.as_ref()
    }

    pub fn baselines(&self) -> impl Iterator<Item = &dyn TextClassifier> {
        self.baselines.iter().map(|m| m.as_ref())
    }

    /// Predict with every detector and score against the matching labels.
    pub fn score(self) -> std::result::Result<ScoredDetectors, PipelineError> {
        let stage = Stage::Scored;
        let features = self.features;
        let config = &features.config;

        let mut predictions = vec![DetectorPredictions {
            name: self.primary.name().to_string(),
            role: DetectorRole::Primary,
            scope: EvaluationScope::TestSplit,
            predictions: self.primary.predict(&features.x_test).map_err(at(stage))?,
        }];
        for model in &self.baselines {
            predictions.push(DetectorPredictions {
                name: model.name().to_string(),
                role: DetectorRole::Baseline,
                scope: EvaluationScope::TestSplit,
                predictions: model.predict(&features.x_test).map_err(at(stage))?,
            });
        }

        let keyword = match &config.keyword_phrases {
            Some(phrases) => KeywordDetector::new(phrases),
            None => KeywordDetector::default(),
        };
        if config.keyword_scope.includes_test_split() {
            let texts = features.corpus.texts_at(&features.split.test);
            predictions.push(DetectorPredictions {
                name: keyword.name().to_string(),
                role: DetectorRole::Baseline,
                scope: EvaluationScope::TestSplit,
                predictions: keyword.predict_batch(&texts),
            });
        }
        if config.keyword_scope.includes_full_corpus() {
            predictions.push(DetectorPredictions {
                name: keyword.name().to_string(),
                role: DetectorRole::Baseline,
                scope: EvaluationScope::FullCorpus,
                predictions: keyword.predict_batch(&features.corpus.texts()),
            });
        }

        let all_labels = features.corpus.labels();
        let mut reports = Vec::with_capacity(predictions.len());
        for detector in &predictions {
            let truth = match detector.scope {
                EvaluationScope::TestSplit => &features.y_test,
                EvaluationScope::FullCorpus => &all_labels,
            };
            let metrics = MetricReport::compute(truth, &detector.predictions).map_err(at(stage))?;
            log::debug!(
                "{} on {}: accuracy {:.4}, f1 {:.4}",
                detector.name,
                detector.scope,
                metrics.accuracy,
                metrics.f1
            );
            reports.push(ModelReport {
                name: detector.name.clone(),
                role: detector.role,
                scope: detector.scope,
                metrics,
            });
        }

        log::info!("Stage: {} ({} detector reports)", stage, reports.len());
        Ok(ScoredDetectors {
            features,
            predictions,
            reports,
        })
    }
}

/// Metric reports for every detector, not yet compared.
#[derive(Debug, Clone)]
pub struct ScoredDetectors {
    features: FittedFeatures,
    predictions: Vec<DetectorPredictions>,
    reports: Vec<ModelReport>,
}

impl ScoredDetectors {
    pub fn reports(&self) -> &[ModelReport] {
        &self.reports
    }

    pub fn predictions(&self) -> &[DetectorPredictions] {
        &self.predictions
    }

    /// Compare the primary model with every test-split baseline.
    pub fn report(self) -> std::result::Result<ComparisonReport, PipelineError> {
        let stage = Stage::Reported;
        let features = self.features;

        let primary_idx = self
            .reports
            .iter()
            .position(|r| r.role == DetectorRole::Primary)
            .ok_or_else(|| {
                PipelineError::new(
                    stage,
                    Error::InvalidConfig("no primary detector was scored".to_string()),
                )
            })?;
        let primary = &self.reports[primary_idx];
        let primary_predictions = &self.predictions[primary_idx].predictions;

        let mut f1_deltas = Vec::new();
        let mut paired_tests = Vec::new();
        for (report, detector) in self.reports.iter().zip(&self.predictions) {
            if report.role != DetectorRole::Baseline || report.scope != EvaluationScope::TestSplit {
                continue;
            }
            f1_deltas.push(F1Delta::between(primary, report));
            let result = mcnemar(&features.y_test, primary_predictions, &detector.predictions)
                .map_err(at(stage))?;
            paired_tests.push(PairedTest {
                primary: primary.name.clone(),
                baseline: report.name.clone(),
                result,
            });
        }
        if f1_deltas.is_empty() {
            log::warn!("No baseline was scored on the test split; no F1 deltas reported");
        }

        let vocabulary_size = features.vectorizer.vocabulary().map_err(at(stage))?.len();
        let run = RunMetadata {
            timestamp: Utc::now(),
            corpus: ClassCounts::of(&features.corpus.labels()),
            train: ClassCounts::of(&features.y_train),
            test: ClassCounts::of(&features.y_test),
            vocabulary_size,
            random_seed: features.config.random_seed,
            config: features.config,
        };

        log::info!("Stage: {}", stage);
        Ok(ComparisonReport {
            run,
            models: self.reports,
            f1_deltas,
            paired_tests,
            literature: literature_figures(),
        })
    }
}

/// Run every stage in order.
pub fn run_evaluation(config: EvaluationConfig) -> std::result::Result<ComparisonReport, PipelineError> {
    run_pipeline(Evaluation::new(config))
}

/// Run every stage in order on an already built pipeline.
pub fn run_pipeline(evaluation: Evaluation) -> std::result::Result<ComparisonReport, PipelineError> {
    evaluation
        .load()?
        .split()?
        .fit_extractor()?
        .train()?
        .score()?
        .report()
}
