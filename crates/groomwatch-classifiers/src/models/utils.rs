//! Input checks and label conversions shared by the model wrappers.
use ndarray::{Array1, Array2};

use crate::corpus::GROOMING;
use crate::error::{Error, Result};

/// Reject training input with misaligned shapes or a missing class.
pub fn check_training_input(model: &str, x: &Array2<f64>, y: &[u8]) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(Error::model_fit(
            model,
            format!("feature matrix has {} rows but {} labels were given", x.nrows(), y.len()),
        ));
    }
    if x.ncols() == 0 {
        return Err(Error::model_fit(model, "feature matrix has no columns"));
    }
    let positives = y.iter().filter(|&&label| label == GROOMING).count();
    if positives == 0 || positives == y.len() {
        return Err(Error::InsufficientData(format!(
            "{} needs both classes in its training labels ({} of {} are grooming)",
            model,
            positives,
            y.len()
        )));
    }
    Ok(())
}

/// Reject prediction input whose width differs from the training features.
pub fn check_feature_width(model: &str, x: &Array2<f64>, n_features: usize) -> Result<()> {
    if x.ncols() != n_features {
        return Err(Error::FeatureMismatch {
            component: model.to_string(),
            expected: n_features,
            actual: x.ncols(),
        });
    }
    Ok(())
}

pub fn to_bool_targets(y: &[u8]) -> Array1<bool> {
    y.iter().map(|&label| label == GROOMING).collect()
}

pub fn from_bool_predictions(predictions: &Array1<bool>) -> Vec<u8> {
    predictions.iter().map(|&p| u8::from(p)).collect()
}
