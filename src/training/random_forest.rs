//! Random forest regression

use super::decision_tree::{normalize, DecisionTree};
use super::models::{check_xy, Regressor};
use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Strategy for the number of features tried at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fraction of n_features
    Fraction(f64),
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl Default for MaxFeatures {
    fn default() -> Self {
        MaxFeatures::All
    }
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::Fraction(f) => (n_features as f64 * f).ceil() as usize,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }
}

/// Bagged ensemble of regression trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features tried per split
    pub max_features: MaxFeatures,
    /// Bootstrap sampling
    pub bootstrap: bool,
    /// Random state
    pub random_state: Option<u64>,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
    /// Number of features
    n_features: usize,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForestRegressor {
    /// Create a new forest
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators: n_estimators.max(1),
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
            random_state: None,
            feature_importances: None,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set max features strategy
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Enable/disable bootstrap sampling
    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn fit_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        seed: u64,
        max_features: usize,
    ) -> Result<DecisionTree> {
        let n_samples = x.nrows();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut tree = DecisionTree::new()
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(max_features)
            .with_random_state(rng.next_u64());
        if let Some(d) = self.max_depth {
            tree = tree.with_max_depth(d);
        }

        if self.bootstrap {
            let sample_indices: Vec<usize> =
                (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            let x_boot = x.select(Axis(0), &sample_indices);
            let y_boot = y.select(Axis(0), &sample_indices);
            tree.fit(&x_boot, &y_boot)?;
        } else {
            tree.fit(x, y)?;
        }

        Ok(tree)
    }

    fn compute_feature_importances(&mut self) {
        let mut total: Array1<f64> = Array1::zeros(self.n_features);
        for tree in &self.trees {
            if let Some(imp) = tree.feature_importances() {
                total += &imp;
            }
        }
        total /= self.trees.len().max(1) as f64;
        self.feature_importances = Some(normalize(&total));
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_xy(x, y)?;

        self.n_features = x.ncols();
        let max_features = self.max_features.resolve(self.n_features);
        let base_seed = self.random_state.unwrap_or(42);

        let trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| self.fit_tree(x, y, base_seed.wrapping_add(tree_idx as u64), max_features))
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.compute_feature_importances();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(ForecastError::ModelNotFitted);
        }

        let all_predictions = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let mut mean: Array1<f64> = Array1::zeros(x.nrows());
        for preds in &all_predictions {
            mean += preds;
        }
        Ok(mean / all_predictions.len() as f64)
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.feature_importances.clone()
    }
}
