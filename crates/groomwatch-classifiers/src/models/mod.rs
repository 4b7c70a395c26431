pub mod classifier_trait;
pub mod factory;
pub mod logistic;
pub mod mlp;
pub mod svm;
pub mod utils;

pub use classifier_trait::TextClassifier;
