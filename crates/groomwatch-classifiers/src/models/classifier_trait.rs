use ndarray::Array2;

use crate::error::Result;
use crate::metrics;

/// Contract shared by every trainable detector.
///
/// Lifecycle is construct, `fit` once, then `predict`/`score` any number of
/// times. A second `fit` fails with `AlreadyFitted`; build a fresh instance
/// to retrain. Rows of `x` are TF-IDF feature vectors, `y` holds 0/1 labels.
pub trait TextClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()>;

    /// Predicted 0/1 label per row.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>>;

    /// Accuracy of `predict(x)` against `y`.
    fn score(&self, x: &Array2<f64>, y: &[u8]) -> Result<f64> {
        let predictions = self.predict(x)?;
        metrics::accuracy(y, &predictions)
    }

    fn is_fitted(&self) -> bool;

    /// Human readable name used in reports.
    fn name(&self) -> &str {
        "classifier"
    }
}
