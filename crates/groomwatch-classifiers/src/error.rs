use std::fmt;
use std::path::PathBuf;

/// Errors raised by the detectors and the evaluation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source file missing, malformed, or lacking a required column.
    #[error("failed to load corpus from {}: {reason}", path.display())]
    DataLoad { path: PathBuf, reason: String },

    /// A transform or predict call reached a component before its fit step.
    #[error("{component} used before it was fitted")]
    NotFitted { component: String },

    /// A component was fitted a second time; build a fresh instance instead.
    #[error("{component} is already fitted; construct a new instance to retrain")]
    AlreadyFitted { component: String },

    /// Not enough samples to keep both classes on both sides of a split.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Predictions and labels disagree in length.
    #[error("metric computation failed: expected {expected} predictions, got {actual}")]
    MetricComputation { expected: usize, actual: usize },

    /// Prediction input has a different number of feature columns than the
    /// model was trained on.
    #[error("{component} expects {expected} feature columns, got {actual}")]
    FeatureMismatch {
        component: String,
        expected: usize,
        actual: usize,
    },

    /// The underlying learning library rejected the training input.
    #[error("failed to fit {model}: {reason}")]
    ModelFit { model: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn data_load(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Error::DataLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn not_fitted(component: &str) -> Self {
        Error::NotFitted {
            component: component.to_string(),
        }
    }

    pub(crate) fn already_fitted(component: &str) -> Self {
        Error::AlreadyFitted {
            component: component.to_string(),
        }
    }

    pub(crate) fn model_fit(model: &str, reason: impl fmt::Display) -> Self {
        Error::ModelFit {
            model: model.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Pipeline stages, in the order the harness walks through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    DataLoaded,
    SplitReady,
    ExtractorFitted,
    ModelsTrained,
    Scored,
    Reported,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Stage::Idle => "validate configuration",
            Stage::DataLoaded => "load corpus",
            Stage::SplitReady => "stratified split",
            Stage::ExtractorFitted => "fit feature extractor",
            Stage::ModelsTrained => "train classifiers",
            Stage::Scored => "score detectors",
            Stage::Reported => "report",
        };
        write!(f, "{}", name)
    }
}

/// A failure tagged with the stage that was being entered when it happened.
#[derive(Debug, thiserror::Error)]
#[error("stage '{stage}' failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl PipelineError {
    pub fn new(stage: Stage, source: Error) -> Self {
        Self { stage, source }
    }
}
