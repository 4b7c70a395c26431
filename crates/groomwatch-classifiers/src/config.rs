use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::keyword::KEYWORD_DETECTOR_NAME;

/// Central configuration for one trainable classifier.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Display name used in reports. Defaults to the model type name.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    LogisticRegression {
        /// L2 penalty strength.
        alpha: f64,
        max_iterations: u64,
        gradient_tolerance: f64,
    },
    LinearSvm {
        /// Penalty weights for the positive and negative class.
        c: (f64, f64),
        eps: f64,
    },
    Mlp {
        hidden_units: usize,
        learning_rate: f64,
        /// L2 penalty strength.
        alpha: f64,
        batch_size: usize,
        max_epochs: usize,
        tol: f64,
        n_iter_no_change: usize,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::logistic_regression()
    }
}

impl ModelType {
    pub fn logistic_regression() -> Self {
        ModelType::LogisticRegression {
            alpha: 1.0,
            max_iterations: 1000,
            gradient_tolerance: 1e-4,
        }
    }

    pub fn linear_svm() -> Self {
        ModelType::LinearSvm {
            c: (1.0, 1.0),
            eps: 1e-3,
        }
    }

    pub fn mlp() -> Self {
        ModelType::Mlp {
            hidden_units: 100,
            learning_rate: 1e-3,
            alpha: 1e-4,
            batch_size: 200,
            max_epochs: 1000,
            tol: 1e-4,
            n_iter_no_change: 10,
        }
    }

    /// Short identifier, also accepted by `FromStr`.
    pub fn type_name(&self) -> &'static str {
        match self {
            ModelType::LogisticRegression { .. } => "logistic",
            ModelType::LinearSvm { .. } => "svm",
            ModelType::Mlp { .. } => "mlp",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            ModelType::LogisticRegression {
                alpha,
                max_iterations,
                ..
            } => {
                if *alpha < 0.0 || *max_iterations == 0 {
                    return Err(Error::InvalidConfig(
                        "logistic regression needs alpha >= 0 and max_iterations > 0".to_string(),
                    ));
                }
            }
            ModelType::LinearSvm { c, eps } => {
                if c.0 <= 0.0 || c.1 <= 0.0 || *eps <= 0.0 {
                    return Err(Error::InvalidConfig(
                        "linear SVM needs positive C weights and eps".to_string(),
                    ));
                }
            }
            ModelType::Mlp {
                hidden_units,
                learning_rate,
                batch_size,
                max_epochs,
                ..
            } => {
                if *hidden_units == 0 || *batch_size == 0 || *max_epochs == 0 || *learning_rate <= 0.0
                {
                    return Err(Error::InvalidConfig(
                        "MLP needs hidden_units, batch_size, max_epochs and learning_rate > 0"
                            .to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logistic" | "logistic_regression" | "lr" => Ok(ModelType::logistic_regression()),
            "svm" | "linear_svm" => Ok(ModelType::linear_svm()),
            "mlp" => Ok(ModelType::mlp()),
            _ => Err(format!(
                "Unknown model type: {}. Valid options are: logistic, svm, mlp",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(model_type: ModelType) -> Self {
        Self {
            name: None,
            model_type,
        }
    }

    pub fn named(name: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            name: Some(name.into()),
            model_type,
        }
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.model_type.type_name().to_string())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new(ModelType::default())
    }
}

/// Vectorizer settings.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    /// Vocabulary cap.
    pub max_features: usize,
    /// Inclusive n-gram orders, e.g. `(1, 2)` for unigrams and bigrams.
    pub ngram_range: (usize, usize),
    pub remove_stop_words: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_features: 1000,
            ngram_range: (1, 2),
            remove_stop_words: true,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(Error::InvalidConfig("max_features must be at least 1".to_string()));
        }
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(Error::InvalidConfig(format!(
                "ngram_range ({}, {}) must satisfy 1 <= min <= max",
                min_n, max_n
            )));
        }
        Ok(())
    }
}

/// Where the keyword baseline is scored.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeywordScope {
    /// Same held-out split as the trained models.
    TestSplit,
    /// Every corpus sample, the way legacy filters are usually quoted.
    FullCorpus,
    Both,
}

impl KeywordScope {
    pub fn includes_test_split(&self) -> bool {
        matches!(self, KeywordScope::TestSplit | KeywordScope::Both)
    }

    pub fn includes_full_corpus(&self) -> bool {
        matches!(self, KeywordScope::FullCorpus | KeywordScope::Both)
    }
}

impl FromStr for KeywordScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test" | "test_split" => Ok(KeywordScope::TestSplit),
            "full" | "full_corpus" => Ok(KeywordScope::FullCorpus),
            "both" => Ok(KeywordScope::Both),
            _ => Err(format!(
                "Unknown keyword scope: {}. Valid options are: test, full, both",
                s
            )),
        }
    }
}

/// Everything a benchmark run needs. Every field has a default so partial
/// JSON files are accepted.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvaluationConfig {
    pub data_path: PathBuf,
    pub text_column: String,
    pub label_column: String,
    #[serde(flatten)]
    pub features: FeatureConfig,
    pub test_fraction: f64,
    pub random_seed: u64,
    pub keyword_scope: KeywordScope,
    /// Replaces the built-in red-flag phrase list when set.
    pub keyword_phrases: Option<Vec<String>>,
    pub primary: ModelConfig,
    pub baselines: Vec<ModelConfig>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/synthetic_chats.csv"),
            text_column: "text".to_string(),
            label_column: "label".to_string(),
            features: FeatureConfig::default(),
            test_fraction: 0.2,
            random_seed: 42,
            keyword_scope: KeywordScope::Both,
            keyword_phrases: None,
            primary: ModelConfig::named("logistic_regression", ModelType::logistic_regression()),
            baselines: vec![
                ModelConfig::named("svm_baseline", ModelType::linear_svm()),
                ModelConfig::named("mlp_baseline", ModelType::mlp()),
            ],
        }
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "test_fraction must lie strictly between 0 and 1, got {}",
                self.test_fraction
            )));
        }
        if let Some(phrases) = &self.keyword_phrases {
            if phrases.iter().all(|p| p.trim().is_empty()) {
                return Err(Error::InvalidConfig(
                    "keyword_phrases must contain at least one non-empty phrase".to_string(),
                ));
            }
        }
        let mut names = vec![KEYWORD_DETECTOR_NAME.to_string()];
        for model in std::iter::once(&self.primary).chain(&self.baselines) {
            model.model_type.validate()?;
            let name = model.display_name();
            if names.contains(&name) {
                return Err(Error::InvalidConfig(format!("duplicate model name '{}'", name)));
            }
            names.push(name);
        }
        Ok(())
    }
}
