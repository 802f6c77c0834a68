//! Cross-validation splitters

use crate::error::{ForecastError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Cross-validation strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CVStrategy {
    /// K-Fold cross-validation
    KFold { n_splits: usize, shuffle: bool },
    /// Expanding-window split; every test fold lies after its training rows
    TimeSeriesSplit {
        n_splits: usize,
        max_train_size: Option<usize>,
    },
}

impl Default for CVStrategy {
    fn default() -> Self {
        CVStrategy::KFold { n_splits: 5, shuffle: false }
    }
}

impl CVStrategy {
    pub fn n_splits(&self) -> usize {
        match self {
            CVStrategy::KFold { n_splits, .. } | CVStrategy::TimeSeriesSplit { n_splits, .. } => {
                *n_splits
            }
        }
    }
}

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Cross-validation splitter
#[derive(Debug, Clone)]
pub struct CrossValidator {
    strategy: CVStrategy,
    random_state: Option<u64>,
}

impl CrossValidator {
    /// Create a new cross-validator
    pub fn new(strategy: CVStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Generate train/test splits
    pub fn split(&self, n_samples: usize) -> Result<Vec<CVSplit>> {
        match &self.strategy {
            CVStrategy::KFold { n_splits, shuffle } => self.k_fold_split(n_samples, *n_splits, *shuffle),
            CVStrategy::TimeSeriesSplit { n_splits, max_train_size } => {
                self.time_series_split(n_samples, *n_splits, *max_train_size)
            }
        }
    }

    fn k_fold_split(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Result<Vec<CVSplit>> {
        if n_splits < 2 {
            return Err(ForecastError::ValidationError(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < n_splits {
            return Err(ForecastError::ValidationError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                n_samples, n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();

        if shuffle {
            let mut rng = match self.random_state {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed),
                None => ChaCha8Rng::from_entropy(),
            };
            indices.shuffle(&mut rng);
        }

        let base = n_samples / n_splits;
        let remainder = n_samples % n_splits;

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;

        for fold_idx in 0..n_splits {
            let fold_size = if fold_idx < remainder { base + 1 } else { base };
            let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            });

            current += fold_size;
        }

        Ok(splits)
    }

    /// Folds of `n_samples / (n_splits + 1)` rows taken from the end; the
    /// first fold absorbs the remainder into its training window
    fn time_series_split(
        &self,
        n_samples: usize,
        n_splits: usize,
        max_train_size: Option<usize>,
    ) -> Result<Vec<CVSplit>> {
        if n_splits < 2 {
            return Err(ForecastError::ValidationError(
                "n_splits must be at least 2".to_string(),
            ));
        }

        let test_size = n_samples / (n_splits + 1);
        if test_size == 0 {
            return Err(ForecastError::ValidationError(format!(
                "n_samples ({}) too small for {} time series splits",
                n_samples, n_splits
            )));
        }

        let first_test_start = n_samples - n_splits * test_size;
        let mut splits = Vec::with_capacity(n_splits);

        for fold_idx in 0..n_splits {
            let test_start = first_test_start + fold_idx * test_size;
            let test_end = test_start + test_size;

            let train_start = match max_train_size {
                Some(max) => test_start.saturating_sub(max),
                None => 0,
            };

            splits.push(CVSplit {
                train_indices: (train_start..test_start).collect(),
                test_indices: (test_start..test_end).collect(),
                fold_idx,
            });
        }

        Ok(splits)
    }
}

/// Cross-validation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CVResults {
    /// Scores for each fold
    pub scores: Vec<f64>,
    /// Mean score across folds
    pub mean_score: f64,
    /// Standard deviation of scores
    pub std_score: f64,
    /// Number of folds
    pub n_folds: usize,
}

impl CVResults {
    /// Create CV results from fold scores
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n_folds = scores.len();
        if n_folds == 0 {
            return Self {
                scores,
                mean_score: f64::NAN,
                std_score: f64::NAN,
                n_folds,
            };
        }

        let mean_score = scores.iter().sum::<f64>() / n_folds as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n_folds as f64;

        Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
            n_folds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k_fold() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 5, shuffle: false });
        let splits = cv.split(100).unwrap();

        assert_eq!(splits.len(), 5);

        for split in &splits {
            assert_eq!(split.test_indices.len(), 20);
            assert_eq!(split.train_indices.len(), 80);
        }

        // Test folds partition the indices
        let mut all_test: Vec<usize> = splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort();
        assert_eq!(all_test, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_k_fold_uneven() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 3, shuffle: false });
        let sizes: Vec<usize> = cv.split(10).unwrap().iter().map(|s| s.test_indices.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);
    }

    #[test]
    fn test_shuffled_k_fold_is_seeded() {
        let strategy = CVStrategy::KFold { n_splits: 4, shuffle: true };
        let a = CrossValidator::new(strategy.clone()).with_random_state(1).split(40).unwrap();
        let b = CrossValidator::new(strategy).with_random_state(1).split(40).unwrap();

        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
        }
        assert_ne!(a[0].test_indices, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_k_fold_too_few_samples() {
        let cv = CrossValidator::new(CVStrategy::KFold { n_splits: 5, shuffle: false });
        assert!(cv.split(3).is_err());
    }

    #[test]
    fn test_time_series_split() {
        let cv = CrossValidator::new(CVStrategy::TimeSeriesSplit { n_splits: 3, max_train_size: None });
        let splits = cv.split(100).unwrap();

        assert_eq!(splits.len(), 3);
        assert_eq!(splits[0].train_indices.len(), 25);
        assert_eq!(splits[2].test_indices.last(), Some(&99));

        for i in 1..splits.len() {
            assert!(splits[i].train_indices.len() > splits[i - 1].train_indices.len());
        }

        // Never test on rows earlier than the training window
        for split in &splits {
            let last_train = *split.train_indices.last().unwrap();
            assert!(split.test_indices.iter().all(|&t| t > last_train));
        }
    }

    #[test]
    fn test_time_series_max_train_size() {
        let cv = CrossValidator::new(CVStrategy::TimeSeriesSplit { n_splits: 3, max_train_size: Some(10) });
        let splits = cv.split(100).unwrap();
        assert!(splits.iter().all(|s| s.train_indices.len() == 10));
    }

    #[test]
    fn test_cv_results() {
        let results = CVResults::from_scores(vec![0.5, 0.7, 0.9]);
        assert!((results.mean_score - 0.7).abs() < 1e-12);
        assert_eq!(results.n_folds, 3);
        assert!(results.std_score > 0.0);
    }
}
