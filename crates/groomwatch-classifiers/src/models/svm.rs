use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_svm::Svm;
use ndarray::{Array1, Array2};

use crate::error::{Error, Result};
use crate::models::classifier_trait::TextClassifier;
use crate::models::utils::{
    check_feature_width, check_training_input, from_bool_predictions, to_bool_targets,
};

/// Linear-kernel support vector classifier.
pub struct LinearSvmClassifier {
    name: String,
    c: (f64, f64),
    eps: f64,
    model: Option<Svm<f64, bool>>,
    n_features: usize,
}

impl LinearSvmClassifier {
    pub fn new(name: impl Into<String>, c: (f64, f64), eps: f64) -> Self {
        Self {
            name: name.into(),
            c,
            eps,
            model: None,
            n_features: 0,
        }
    }
}

impl TextClassifier for LinearSvmClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        if self.model.is_some() {
            return Err(Error::already_fitted(&self.name));
        }
        check_training_input(&self.name, x, y)?;

        let dataset = Dataset::new(x.to_owned(), to_bool_targets(y));
        let (c_pos, c_neg) = self.c;
        let model = Svm::<f64, bool>::params()
            .eps(self.eps)
            .pos_neg_weights(c_pos, c_neg)
            .linear_kernel()
            .fit(&dataset)
            .map_err(|e| Error::model_fit(&self.name, e))?;

        log::debug!("{} fitted: {}", self.name, model);
        self.n_features = x.ncols();
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        let model = self.model.as_ref().ok_or_else(|| Error::not_fitted(&self.name))?;
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

    #[test]
    fn separates_two_clusters() {
        let x = Array2::from_shape_vec(
            (8, 2),
            vec![
                2.0, 2.1, 1.8, 2.2, 2.2, 1.9, 2.1, 2.0, //
                -2.0, -1.9, -1.8, -2.2, -2.1, -2.0, -2.2, -1.8,
            ],
        )
        .unwrap();
        let y = vec![1, 1, 1, 1, 0, 0, 0, 0];
        let mut model = LinearSvmClassifier::new("svm", (1.0, 1.0), 1e-3);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap(), y);
        assert_eq!(model.score(&x, &y).unwrap(), 1.0);
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = LinearSvmClassifier::new("svm", (1.0, 1.0), 1e-3);
        let x = Array2::<f64>::zeros((2, 2));
        assert!(matches!(model.predict(&x), Err(Error::NotFitted { .. })));
    }
}
