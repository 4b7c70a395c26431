//! Seeded, label-stratified train/test partitioning.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::corpus::{GROOMING, NORMAL};
use crate::error::{Error, Result};

/// Disjoint train/test index sets over a corpus. Both keep corpus order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl Split {
    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition `labels` into train/test so each class keeps its proportion.
///
/// Each class contributes `round(class_count * test_fraction)` samples to the
/// test side, clamped so both sides keep at least one. Fails with
/// `InsufficientData` when a class has fewer than two samples.
pub fn stratified_split(labels: &[u8], test_fraction: f64, seed: u64) -> Result<Split> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::InvalidConfig(format!(
            "test_fraction must lie strictly between 0 and 1, got {}",
            test_fraction
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for class in [NORMAL, GROOMING] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter_map(|(i, &label)| if label == class { Some(i) } else { None })
            .collect();

        if members.len() < 2 {
            return Err(Error::InsufficientData(format!(
                "class {} has {} samples; at least 2 are needed to place it in both train and test",
                class,
                members.len()
            )));
        }
        let n_test = ((members.len() as f64 * test_fraction).round() as usize)
            .clamp(1, members.len() - 1);

        members.shuffle(&mut rng);
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();

    log::debug!(
        "Stratified split: {} train / {} test samples (seed {})",
        train.len(),
        test.len(),
        seed
    );

    Ok(Split { train, test })
}
