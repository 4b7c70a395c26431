//! Grooming-detection text classifiers and a reproducible benchmark harness.
//!
//! A labeled chat corpus is split with a seeded stratified partition, turned
//! into TF-IDF features fitted on the train side only, and used to train a
//! logistic-regression detector plus linear SVM and MLP baselines. A keyword
//! filter in the style of parental-control tools is scored alongside them and
//! [`evaluation::run_evaluation`] returns a [`evaluation::ComparisonReport`].
pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod keyword;
pub mod metrics;
pub mod models;
pub mod split;

pub use error::{Error, PipelineError, Result, Stage};
