use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_logistic::{FittedLogisticRegression, LogisticRegression};
use ndarray::{Array1, Array2};

use crate::error::{Error, Result};
use crate::models::classifier_trait::TextClassifier;
use crate::models::utils::{
    check_feature_width, check_training_input, from_bool_predictions, to_bool_targets,
};

/// L2-penalized logistic regression, the primary detector.
pub struct LogisticRegressionClassifier {
    name: String,
    alpha: f64,
    max_iterations: u64,
    gradient_tolerance: f64,
    model: Option<FittedLogisticRegression<f64, bool>>,
    n_features: usize,
    /// Whether linfa's positive class is the grooming label.
    grooming_is_positive: bool,
}

impl LogisticRegressionClassifier {
    pub fn new(
        name: impl Into<String>,
        alpha: f64,
        max_iterations: u64,
        gradient_tolerance: f64,
    ) -> Self {
        Self {
            name: name.into(),
            alpha,
            max_iterations,
            gradient_tolerance,
            model: None,
            n_features: 0,
            grooming_is_positive: true,
        }
    }

    fn fitted(&self) -> Result<&FittedLogisticRegression<f64, bool>> {
        self.model.as_ref().ok_or_else(|| Error::not_fitted(&self.name))
    }

    /// Probability of the grooming class per row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let model = self.fitted()?;
        check_feature_width(&self.name, x, self.n_features)?;
        let proba = model.predict_probabilities(x);
        Ok(if self.grooming_is_positive {
            proba.to_vec()
        } else {
            proba.iter().map(|p| 1.0 - p).collect()
        })
    }
}

/// linfa reports probabilities for whichever label it picked as positive.
/// Its hard predictions threshold that probability at 0.5, so the most
/// confident training row shows which label it is.
fn grooming_is_positive(model: &FittedLogisticRegression<f64, bool>, x: &Array2<f64>) -> bool {
    let proba = model.predict_probabilities(x);
    let predictions: Array1<bool> = model.predict(x);
    proba
        .iter()
        .zip(predictions.iter())
        .max_by(|a, b| (a.0 - 0.5).abs().total_cmp(&(b.0 - 0.5).abs()))
        .map(|(&p, &predicted)| (p >= 0.5) == predicted)
        .unwrap_or(true)
}

impl TextClassifier for LogisticRegressionClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        if self.model.is_some() {
            return Err(Error::already_fitted(&self.name));
        }
        check_training_input(&self.name, x, y)?;

        let dataset = Dataset::new(x.to_owned(), to_bool_targets(y));
        let model = LogisticRegression::default()
            .alpha(self.alpha)
            .max_iterations(self.max_iterations)
            .gradient_tolerance(self.gradient_tolerance)
            .fit(&dataset)
            .map_err(|e| Error::model_fit(&self.name, e))?;

        self.grooming_is_positive = grooming_is_positive(&model, x);
        log::debug!(
            "{} fitted on {} samples (grooming is linfa's positive class: {})",
            self.name,
            x.nrows(),
            self.grooming_is_positive
        );
        self.n_features = x.ncols();
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        let model = self.fitted()?;
        check_feature_width(&self.name, x, self.n_features)?;
        let predictions: Array1<bool> = model.predict(x);
        Ok(from_bool_predictions(&predictions))
    }

    fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Array2<f64>, Vec<u8>) {
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![
                1.0, 0.0, //
                0.0, 1.0, //
                0.9, 0.1, //
                0.1, 0.9, //
                1.0, 0.2, //
                0.2, 1.0,
            ],
        )
        .unwrap();
        (x, vec![1, 0, 1, 0, 1, 0])
    }

    #[test]
    fn learns_separable_data() {
        let (x, y) = separable();
        let mut model = LogisticRegressionClassifier::new("lr", 0.01, 1000, 1e-6);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
        let proba = model.predict_proba(&x).unwrap();
        assert!(proba[0] > 0.5 && proba[1] < 0.5);
    }

    #[test]
    fn grooming_probability_does_not_depend_on_label_order() {
        let (x, y) = separable();
        // Same rows, but the first training label is now normal.
        let y_flipped: Vec<u8> = y.iter().map(|&l| 1 - l).collect();
        let mut model = LogisticRegressionClassifier::new("lr", 0.01, 1000, 1e-6);
        model.fit(&x, &y_flipped).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y_flipped);
        let proba = model.predict_proba(&x).unwrap();
        for (p, label) in proba.iter().zip(&y_flipped) {
            assert_eq!(*p >= 0.5, *label == 1, "p = {} for label {}", p, label);
        }
    }

    #[test]
    fn predict_before_fit_fails() {
        let (x, _) = separable();
        let model = LogisticRegressionClassifier::new("lr", 1.0, 100, 1e-4);
        assert!(matches!(model.predict(&x), Err(Error::NotFitted { .. })));
    }

    #[test]
    fn refit_is_rejected() {
        let (x, y) = separable();
        let mut model = LogisticRegressionClassifier::new("lr", 1.0, 100, 1e-4);
        model.fit(&x, &y).unwrap();
        assert!(matches!(model.fit(&x, &y), Err(Error::AlreadyFitted { .. })));
    }
}
