// SPDX-FileCopyrightText: 2024 Joshua Jewell
// SPDX-License-Identifier: MIT

//! Train/validation partitioning.
//!
//! The sample list is shuffled once with a `ChaCha8Rng` seeded from a
//! `u64`, then cut at `floor(ratio * N)`. There is no stratification by
//! building or language. The same seed always yields the same partition.

use crate::error::{PipelineError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub const DEFAULT_TRAIN_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Split {
    Train, // Fine-tuning targets
    Val,   // Held out for evaluation
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Val];

    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

/// Index of the first validation item.
pub fn split_index(total: usize, ratio: f64) -> usize {
    ((total as f64) * ratio).floor() as usize
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<T> {
    pub train: Vec<T>,
    pub val: Vec<T>,
}

impl<T> Partition<T> {
    pub fn get(&self, split: Split) -> &[T] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.val.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty() && self.val.is_empty()
    }
}

pub fn validate_ratio(ratio: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(PipelineError::InvalidRatio(ratio))
    }
}

/// ASSIGNMENT LOGIC: one uniform permutation, then a single cut.
pub fn partition<T>(mut items: Vec<T>, ratio: f64, seed: u64) -> Result<Partition<T>> {
    let ratio = validate_ratio(ratio)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let cut = split_index(items.len(), ratio);
    let val = items.split_off(cut);
    Ok(Partition { train: items, val })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_split_index() {
        assert_eq!(split_index(0, 0.9), 0);
        assert_eq!(split_index(1, 0.9), 0);
        assert_eq!(split_index(10, 0.9), 9);
        assert_eq!(split_index(34, 0.9), 30);
        assert_eq!(split_index(7, 1.0), 7);
        assert_eq!(split_index(7, 0.0), 0);
    }

    #[test]
    fn test_same_seed_same_partition() {
        let items: Vec<u32> = (0..100).collect();
        let a = partition(items.clone(), 0.9, 42).unwrap();
        let b = partition(items, 0.9, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_reorders() {
        let items: Vec<u32> = (0..100).collect();
        let a = partition(items.clone(), 0.9, 1).unwrap();
        let b = partition(items, 0.9, 2).unwrap();
        assert_ne!(a.train, b.train);
    }

    #[test]
    fn test_empty_input() {
        let p = partition(Vec::<u32>::new(), 0.9, 7).unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn test_rejects_bad_ratio() {
        assert!(matches!(
            partition(vec![1, 2, 3], 1.5, 0),
            Err(PipelineError::InvalidRatio(_))
        ));
        assert!(matches!(
            partition(vec![1, 2, 3], f64::NAN, 0),
            Err(PipelineError::InvalidRatio(_))
        ));
        assert!(matches!(
            partition(vec![1, 2, 3], -0.1, 0),
            Err(PipelineError::InvalidRatio(_))
        ));
    }

    #[test]
    fn test_split_labels() {
        assert_eq!(
            Split::ALL.iter().map(Split::as_str).collect::<Vec<_>>(),
            vec!["train", "val"]
        );
    }

    proptest! {
        #[test]
        fn prop_partition_sizes_and_membership(total in 0usize..2000, seed in any::<u64>()) {
            let items: Vec<usize> = (0..total).collect();
            let p = partition(items, DEFAULT_TRAIN_RATIO, seed).unwrap();

            prop_assert_eq!(p.len(), total);
            prop_assert_eq!(p.train.len(), split_index(total, DEFAULT_TRAIN_RATIO));

            let seen: HashSet<usize> = p.train.iter().chain(p.val.iter()).copied().collect();
            prop_assert_eq!(seen.len(), total);
        }
    }
}
