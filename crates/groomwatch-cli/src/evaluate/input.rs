//! Evaluation configuration loading and command-line overrides.
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;

use groomwatch_classifiers::config::{EvaluationConfig, KeywordScope, ModelConfig, ModelType};

use crate::util::validate_tsv_or_csv_file;

/// Load an evaluation configuration from a JSON file. Missing fields take
/// their defaults.
pub fn load_evaluation_config<P: AsRef<Path>>(path: P) -> Result<EvaluationConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: EvaluationConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}

/// Parse `MIN,MAX` into an inclusive n-gram range.
pub fn parse_ngram_range(value: &str) -> std::result::Result<(usize, usize), String> {
    let (min, max) = value
        .split_once(',')
        .ok_or_else(|| format!("expected MIN,MAX but got '{}'", value))?;
    let min = min
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid minimum n-gram order '{}': {}", min.trim(), e))?;
    let max = max
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("invalid maximum n-gram order '{}': {}", max.trim(), e))?;
    if min == 0 || min > max {
        return Err(format!("n-gram range must satisfy 1 <= MIN <= MAX, got {},{}", min, max));
    }
    Ok((min, max))
}

/// Values given on the command line that replace configuration fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluateOverrides {
    pub data: Option<PathBuf>,
    pub max_features: Option<usize>,
    pub ngram_range: Option<(usize, usize)>,
    pub test_fraction: Option<f64>,
    pub seed: Option<u64>,
    pub keyword_scope: Option<KeywordScope>,
    pub primary_model: Option<ModelType>,
}

impl EvaluateOverrides {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let keyword_scope = matches
            .get_one::<String>("keyword_scope")
            .map(|s| KeywordScope::from_str(s).map_err(anyhow::Error::msg))
            .transpose()?;
        let primary_model = matches
            .get_one::<String>("primary_model")
            .map(|s| ModelType::from_str(s).map_err(anyhow::Error::msg))
            .transpose()?;

        Ok(Self {
            data: matches.get_one::<PathBuf>("data").cloned(),
            max_features: matches.get_one::<usize>("max_features").copied(),
            ngram_range: matches.get_one::<(usize, usize)>("ngram_range").copied(),
            test_fraction: matches.get_one::<f64>("test_fraction").copied(),
            seed: matches.get_one::<u64>("seed").copied(),
            keyword_scope,
            primary_model,
        })
    }

    pub fn apply(&self, config: &mut EvaluationConfig) {
        if let Some(data) = &self.data {
            config.data_path = data.clone();
        }
        if let Some(max_features) = self.max_features {
            config.features.max_features = max_features;
        }
        if let Some(ngram_range) = self.ngram_range {
            config.features.ngram_range = ngram_range;
        }
        if let Some(test_fraction) = self.test_fraction {
            config.test_fraction = test_fraction;
        }
        if let Some(seed) = self.seed {
            config.random_seed = seed;
        }
        if let Some(scope) = self.keyword_scope {
            config.keyword_scope = scope;
        }
        if let Some(model_type) = &self.primary_model {
            config.primary = ModelConfig::new(model_type.clone());
        }
    }
}

/// Configuration for one `evaluate` invocation: the file (or defaults) with
/// command-line overrides applied and the corpus path checked.
pub fn resolve_config(
    config_path: Option<&PathBuf>,
    overrides: &EvaluateOverrides,
) -> Result<EvaluationConfig> {
    let mut config = match config_path {
        Some(path) => load_evaluation_config(path)?,
        None => EvaluationConfig::default(),
    };
    overrides.apply(&mut config);
    validate_tsv_or_csv_file(&config.data_path)?;
    config
        .validate()
        .context("Invalid evaluation configuration")?;
    Ok(config)
}
