//! Single hidden layer perceptron trained with Adam on binary cross-entropy.
use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::models::classifier_trait::TextClassifier;
use crate::models::utils::{check_feature_width, check_training_input};

const BETA_1: f64 = 0.9;
const BETA_2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;
/// Keeps `ln` finite when the sigmoid saturates.
const PROBA_CLIP: f64 = 1e-12;

/// Training hyper-parameters for [`MlpClassifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct MlpParams {
    pub hidden_units: usize,
    pub learning_rate: f64,
    /// L2 penalty on the weights (not the biases).
    pub alpha: f64,
    pub batch_size: usize,
    pub max_epochs: usize,
    /// Minimum loss improvement that resets the patience counter.
    pub tol: f64,
    pub n_iter_no_change: usize,
    pub seed: u64,
}

impl Default for MlpParams {
    fn default() -> Self {
        Self {
            hidden_units: 100,
            learning_rate: 1e-3,
            alpha: 1e-4,
            batch_size: 200,
            max_epochs: 1000,
            tol: 1e-4,
            n_iter_no_change: 10,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
struct Layers {
    w1: Array2<f64>,
    b1: Array1<f64>,
    w2: Array2<f64>,
    b2: Array1<f64>,
}

impl Layers {
    fn init(n_features: usize, hidden: usize, rng: &mut StdRng) -> Self {
        // Glorot uniform; the sigmoid output uses the smaller logistic bound.
        let hidden_bound = (6.0 / (n_features + hidden) as f64).sqrt();
        let output_bound = (2.0 / (hidden + 1) as f64).sqrt();
        Self {
            w1: uniform_matrix(n_features, hidden, hidden_bound, rng),
            b1: uniform_matrix(1, hidden, hidden_bound, rng).row(0).to_owned(),
            w2: uniform_matrix(hidden, 1, output_bound, rng),
            b2: uniform_matrix(1, 1, output_bound, rng).row(0).to_owned(),
        }
    }

    fn zeros_like(other: &Layers) -> Self {
        Self {
            w1: Array2::zeros(other.w1.raw_dim()),
            b1: Array1::zeros(other.b1.raw_dim()),
            w2: Array2::zeros(other.w2.raw_dim()),
            b2: Array1::zeros(other.b2.raw_dim()),
        }
    }

    /// Hidden activations and output probabilities.
    fn forward(&self, x: &ArrayView2<f64>) -> (Array2<f64>, Array1<f64>) {
        let hidden = (x.dot(&self.w1) + &self.b1).mapv(|v| v.max(0.0));
        let logits = hidden.dot(&self.w2).column(0).to_owned() + self.b2[0];
        (hidden, logits.mapv(sigmoid))
    }

    fn weight_norm(&self) -> f64 {
        self.w1.iter().chain(self.w2.iter()).map(|w| w * w).sum()
    }
}

fn uniform_matrix(rows: usize, cols: usize, bound: f64, rng: &mut StdRng) -> Array2<f64> {
    let dist = Uniform::new_inclusive(-bound, bound);
    Array2::from_shape_simple_fn((rows, cols), || dist.sample(&mut *rng))
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

/// First and second moment estimates for Adam.
#[derive(Debug)]
struct Adam {
    m: Layers,
    v: Layers,
    step: i32,
    learning_rate: f64,
}

impl Adam {
    fn new(like: &Layers, learning_rate: f64) -> Self {
        Self {
            m: Layers::zeros_like(like),
            v: Layers::zeros_like(like),
            step: 0,
            learning_rate,
        }
    }

    fn update(&mut self, params: &mut Layers, grads: &Layers) {
        self.step += 1;
        let lr = self.learning_rate * (1.0 - BETA_2.powi(self.step)).sqrt()
            / (1.0 - BETA_1.powi(self.step));

        adam_step(&mut params.w1, &grads.w1, &mut self.m.w1, &mut self.v.w1, lr);
        adam_step(&mut params.w2, &grads.w2, &mut self.m.w2, &mut self.v.w2, lr);
        adam_step_1d(&mut params.b1, &grads.b1, &mut self.m.b1, &mut self.v.b1, lr);
        adam_step_1d(&mut params.b2, &grads.b2, &mut self.m.b2, &mut self.v.b2, lr);
    }
}

fn adam_step(
    param: &mut Array2<f64>,
    grad: &Array2<f64>,
    m: &mut Array2<f64>,
    v: &mut Array2<f64>,
    lr: f64,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| adam_cell(p, g, m, v, lr));
}

fn adam_step_1d(
    param: &mut Array1<f64>,
    grad: &Array1<f64>,
    m: &mut Array1<f64>,
    v: &mut Array1<f64>,
    lr: f64,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| adam_cell(p, g, m, v, lr));
}

fn adam_cell(p: &mut f64, g: f64, m: &mut f64, v: &mut f64, lr: f64) {
    *m = BETA_1 * *m + (1.0 - BETA_1) * g;
    *v = BETA_2 * *v + (1.0 - BETA_2) * g * g;
    *p -= lr * *m / (v.sqrt() + ADAM_EPSILON);
}

/// Feed-forward network: ReLU hidden layer, sigmoid output.
///
/// Training is fully determined by [`MlpParams::seed`]: weight initialisation
/// and per-epoch batch shuffling both draw from one seeded generator.
pub struct MlpClassifier {
    name: String,
    params: MlpParams,
    layers: Option<Layers>,
    loss_curve: Vec<f64>,
}

impl MlpClassifier {
    pub fn new(name: impl Into<String>, params: MlpParams) -> Self {
        Self {
            name: name.into(),
            params,
            layers: None,
            loss_curve: Vec::new(),
        }
    }

    pub fn params(&self) -> &MlpParams {
        &self.params
    }

    /// Mean training loss per completed epoch.
    pub fn loss_curve(&self) -> &[f64] {
        &self.loss_curve
    }

    fn fitted(&self) -> Result<&Layers> {
        self.layers.as_ref().ok_or_else(|| Error::not_fitted(&self.name))
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let layers = self.fitted()?;
        check_feature_width(&self.name, x, layers.w1.nrows())?;
        let (_, proba) = layers.forward(&x.view());
        Ok(proba.to_vec())
    }

    /// Gradients and penalized loss for one mini-batch.
    fn backward(&self, layers: &Layers, x: &ArrayView2<f64>, y: &Array1<f64>) -> (Layers, f64) {
        let n = x.nrows() as f64;
        let (hidden, proba) = layers.forward(x);

        let bce: f64 = proba
            .iter()
            .zip(y.iter())
            .map(|(&p, &t)| {
                let p = p.clamp(PROBA_CLIP, 1.0 - PROBA_CLIP);
                -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
            })
            .sum::<f64>()
            / n;
        let loss = bce + self.params.alpha / (2.0 * n) * layers.weight_norm();

        // dL/dlogit for sigmoid + BCE, averaged over the batch.
        let delta_out = ((&proba - y) / n).insert_axis(Axis(1));
        let w2 = hidden.t().dot(&delta_out) + &layers.w2 * (self.params.alpha / n);
        let b2 = delta_out.sum_axis(Axis(0));

        let mut delta_hidden = delta_out.dot(&layers.w2.t());
        Zip::from(&mut delta_hidden)
            .and(&hidden)
            .for_each(|d, &h| {
                if h <= 0.0 {
                    *d = 0.0;
                }
            });
        let w1 = x.t().dot(&delta_hidden) + &layers.w1 * (self.params.alpha / n);
        let b1 = delta_hidden.sum_axis(Axis(0));

        (Layers { w1, b1, w2, b2 }, loss)
    }
}

impl TextClassifier for MlpClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        if self.layers.is_some() {
            return Err(Error::already_fitted(&self.name));
        }
        check_training_input(&self.name, x, y)?;
        if self.params.hidden_units == 0 || self.params.batch_size == 0 {
            return Err(Error::InvalidConfig(format!(
                "{} needs hidden_units and batch_size > 0",
                self.name
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut layers = Layers::init(x.ncols(), self.params.hidden_units, &mut rng);
        let mut adam = Adam::new(&layers, self.params.learning_rate);
        let targets: Array1<f64> = y.iter().map(|&label| f64::from(label)).collect();

        let n_samples = x.nrows();
        let batch_size = self.params.batch_size.min(n_samples);
        let mut order: Vec<usize> = (0..n_samples).collect();
        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0usize;
        let mut loss_curve = Vec::new();

        for epoch in 0..self.params.max_epochs {
            order.shuffle(&mut rng);
            let mut accumulated = 0.0;

            for batch in order.chunks(batch_size) {
                let xb = x.select(Axis(0), batch);
                let yb = targets.select(Axis(0), batch);
                let (grads, loss) = self.backward(&layers, &xb.view(), &yb);
                if !loss.is_finite() {
                    return Err(Error::model_fit(
                        &self.name,
                        format!("loss diverged at epoch {}", epoch + 1),
                    ));
                }
                accumulated += loss * batch.len() as f64;
                adam.update(&mut layers, &grads);
            }

            let epoch_loss = accumulated / n_samples as f64;
            loss_curve.push(epoch_loss);

            if epoch_loss > best_loss - self.params.tol {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            best_loss = best_loss.min(epoch_loss);

            if no_improvement > self.params.n_iter_no_change {
                log::debug!(
                    "{} stopped after {} epochs, loss {:.6}",
                    self.name,
                    epoch + 1,
                    epoch_loss
                );
                break;
            }
        }

        if loss_curve.len() == self.params.max_epochs {
            log::warn!(
                "{} reached max_epochs ({}) before converging",
                self.name,
                self.params.max_epochs
            );
        }

        self.loss_curve = loss_curve;
        self.layers = Some(layers);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p >= 0.5))
            .collect())
    }

    fn is_fitted(&self) -> bool {
        self.layers.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
