use crate::config::{ModelConfig, ModelType};
use crate::models::classifier_trait::TextClassifier;
use crate::models::logistic::LogisticRegressionClassifier;
use crate::models::mlp::{MlpClassifier, MlpParams};
use crate::models::svm::LinearSvmClassifier;

/// Build an unfitted classifier from its configuration.
///
/// `seed` only affects models with stochastic training (the MLP).
pub fn build_model(config: &ModelConfig, seed: u64) -> Box<dyn TextClassifier> {
    let name = config.display_name();
    match &config.model_type {
        ModelType::LogisticRegression {
            alpha,
            max_iterations,
            gradient_tolerance,
        } => Box::new(LogisticRegressionClassifier::new(
            name,
            *alpha,
            *max_iterations,
            *gradient_tolerance,
        )),
        ModelType::LinearSvm { c, eps } => Box::new(LinearSvmClassifier::new(name, *c, *eps)),
        ModelType::Mlp {
            hidden_units,
            learning_rate,
            alpha,
            batch_size,
            max_epochs,
            tol,
            n_iter_no_change,
        } => Box::new(MlpClassifier::new(
            name,
            MlpParams {
                hidden_units: *hidden_units,
                learning_rate: *learning_rate,
                alpha: *alpha,
                batch_size: *batch_size,
                max_epochs: *max_epochs,
                tol: *tol,
                n_iter_no_change: *n_iter_no_change,
                seed,
            },
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_unfitted_models_with_configured_names() {
        let configs = [
            ModelConfig::named("primary", ModelType::logistic_regression()),
            ModelConfig::new(ModelType::linear_svm()),
            ModelConfig::new(ModelType::mlp()),
        ];
        let names: Vec<String> = configs
            .iter()
            .map(|c| {
                let model = build_model(c, 42);
                assert!(!model.is_fitted());
                model.name().to_string()
            })
            .collect();
        assert_eq!(names, vec!["primary", "svm", "mlp"]);
    }
}
