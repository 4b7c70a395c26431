//! Binary classification metrics with label 1 (grooming) as the positive class.
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::corpus::GROOMING;
use crate::error::{Error, Result};

/// Counts of predicted vs. true labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn compute(y_true: &[u8], y_pred: &[u8]) -> Result<Self> {
        check_lengths(y_true, y_pred)?;
        let mut cm = ConfusionMatrix::default();
        for (&truth, &pred) in y_true.iter().zip(y_pred) {
            match (truth == GROOMING, pred == GROOMING) {
                (true, true) => cm.true_positive += 1,
                (false, true) => cm.false_positive += 1,
                (false, false) => cm.true_negative += 1,
                (true, false) => cm.false_negative += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    /// Zero when nothing was predicted positive.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    /// Zero when the positive class is absent.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// Harmonic mean of precision and recall; zero when both are zero.
    pub fn f1(&self) -> f64 {
        ratio(
            2 * self.true_positive,
            2 * self.true_positive + self.false_positive + self.false_negative,
        )
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn check_lengths(y_true: &[u8], y_pred: &[u8]) -> Result<()> {
    if y_true.len() != y_pred.len() || y_true.is_empty() {
        return Err(Error::MetricComputation {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }
    Ok(())
}

/// Fraction of predictions equal to the true label.
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> Result<f64> {
    Ok(ConfusionMatrix::compute(y_true, y_pred)?.accuracy())
}

/// F1 score of the grooming class.
pub fn f1_score(y_true: &[u8], y_pred: &[u8]) -> Result<f64> {
    Ok(ConfusionMatrix::compute(y_true, y_pred)?.f1())
}

/// Scores for one detector against one label sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    pub accuracy: f64,
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
    /// Number of scored samples.
    pub support: usize,
    pub confusion: ConfusionMatrix,
}

impl MetricReport {
    pub fn compute(y_true: &[u8], y_pred: &[u8]) -> Result<Self> {
        let confusion = ConfusionMatrix::compute(y_true, y_pred)?;
        Ok(Self {
            accuracy: confusion.accuracy(),
            f1: confusion.f1(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            support: confusion.total(),
            confusion,
        })
    }
}

/// McNemar's paired test between two detectors scored on the same samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct McNemarResult {
    /// Samples only the first detector got right.
    pub only_first_correct: usize,
    /// Samples only the second detector got right.
    pub only_second_correct: usize,
    pub statistic: f64,
    pub p_value: f64,
}

/// Continuity-corrected McNemar test. With no disagreements the p-value is 1.
pub fn mcnemar(y_true: &[u8], first: &[u8], second: &[u8]) -> Result<McNemarResult> {
    check_lengths(y_true, first)?;
    check_lengths(y_true, second)?;

    let mut b = 0usize;
    let mut c = 0usize;
    for ((&truth, &p1), &p2) in y_true.iter().zip(first).zip(second) {
        match (p1 == truth, p2 == truth) {
            (true, false) => b += 1,
            (false, true) => c += 1,
            _ => {}
        }
    }

    if b + c == 0 {
        return Ok(McNemarResult {
            only_first_correct: b,
            only_second_correct: c,
            statistic: 0.0,
            p_value: 1.0,
        });
    }

    let diff = (b as f64 - c as f64).abs() - 1.0;
    let statistic = diff.max(0.0).powi(2) / (b + c) as f64;
    let chi2 = ChiSquared::new(1.0).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let p_value = 1.0 - chi2.cdf(statistic);

    Ok(McNemarResult {
        only_first_correct: b,
        only_second_correct: c,
        statistic,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confusion_counts_and_scores() {
        let y_true = [1, 1, 0, 0, 1, 0];
        let y_pred = [1, 0, 0, 1, 1, 0];
        let report = MetricReport::compute(&y_true, &y_pred).unwrap();
        assert_eq!(report.confusion.true_positive, 2);
        assert_eq!(report.confusion.false_negative, 1);
        assert_eq!(report.confusion.false_positive, 1);
        assert_eq!(report.confusion.true_negative, 2);
        assert!((report.accuracy - 4.0 / 6.0).abs() < 1e-12);
        assert!((report.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.f1 - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(report.support, 6);
    }

    #[test]
    fn no_positive_predictions_gives_zero_f1() {
        let report = MetricReport::compute(&[1, 0, 0], &[0, 0, 0]).unwrap();
        assert_eq!(report.f1, 0.0);
        assert_eq!(report.precision, 0.0);
        assert!((report.accuracy - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn length_mismatch_is_reported() {
        let err = accuracy(&[1, 0, 1], &[1, 0]).unwrap_err();
        match err {
            Error::MetricComputation { expected, actual } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(f1_score(&[], &[]).is_err());
    }

    #[test]
    fn mcnemar_identical_predictions() {
        let y = [1, 0, 1, 0];
        let result = mcnemar(&y, &[1, 1, 1, 0], &[1, 1, 1, 0]).unwrap();
        assert_eq!(result.p_value, 1.0);
        assert_eq!(result.statistic, 0.0);
    }

    #[test]
    fn mcnemar_lopsided_disagreement_is_significant() {
        let y = vec![1u8; 30];
        let first = vec![1u8; 30];
        let mut second = vec![0u8; 30];
        second[0] = 1;
        let result = mcnemar(&y, &first, &second).unwrap();
        assert_eq!(result.only_first_correct, 29);
        assert_eq!(result.only_second_correct, 0);
        assert!(result.p_value < 0.001);
    }
}
