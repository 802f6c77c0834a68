//! Regression tree (CART with squared-error criterion)

use super::models::{check_xy, Regressor};
use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf {
        value: f64,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Candidate split found while scanning one feature
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    /// Reduction of the summed squared error
    gain: f64,
}

/// Regression tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features considered at each split (None = all)
    pub max_features: Option<usize>,
    /// Seed for feature subsampling
    pub random_state: Option<u64>,
    /// Number of features
    n_features: usize,
    /// Feature importances
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    /// Create a new regression tree
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set number of features considered per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let (sum, sq_sum) = indices
            .iter()
            .fold((0.0, 0.0), |(s, sq), &i| (s + y[i], sq + y[i] * y[i]));
        let mean = sum / n_samples as f64;
        let sse = (sq_sum - sum * sum / n_samples as f64).max(0.0);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || sse <= 1e-12 * n_samples as f64;

        if should_stop {
            return TreeNode::Leaf { value: mean, n_samples };
        }

        let features = self.candidate_features(x.ncols(), rng);
        let best = features
            .par_iter()
            .filter_map(|&f| self.best_split_for_feature(x, y, indices, f, sum, sse))
            .max_by(|a, b| {
                a.gain
                    .partial_cmp(&b.gain)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.feature_idx.cmp(&a.feature_idx))
            });

        let Some(split) = best else {
            return TreeNode::Leaf { value: mean, n_samples };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);

        if left_indices.is_empty() || right_indices.is_empty() {
            return TreeNode::Leaf { value: mean, n_samples };
        }

        importances[split.feature_idx] += split.gain;

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng, importances));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng, importances));

        TreeNode::Split {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left,
            right,
            n_samples,
            impurity: sse / n_samples as f64,
        }
    }

    fn candidate_features(&self, n_features: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < n_features => {
                let mut picked = sample(rng, n_features, k).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..n_features).collect(),
        }
    }

    /// Scan one feature in sorted order, keeping running sums so every
    /// threshold is scored in O(1)
    fn best_split_for_feature(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        feature_idx: usize,
        total_sum: f64,
        parent_sse: f64,
    ) -> Option<SplitCandidate> {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_by(|&a, &b| {
            x[[a, feature_idx]]
                .partial_cmp(&x[[b, feature_idx]])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let n = sorted.len();
        let total_sq: f64 = sorted.iter().map(|&i| y[i] * y[i]).sum();

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for pos in 0..n - 1 {
            let idx = sorted[pos];
            left_sum += y[idx];
            left_sq += y[idx] * y[idx];

            let current = x[[idx, feature_idx]];
            let next = x[[sorted[pos + 1], feature_idx]];
            if next - current <= 1e-12 {
                continue;
            }

            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let left_sse = left_sq - left_sum * left_sum / n_left as f64;
            let right_sse = right_sq - right_sum * right_sum / n_right as f64;
            let gain = parent_sse - (left_sse + right_sse);

            if gain > 1e-12 && best.map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature_idx,
                    threshold: (current + next) / 2.0,
                    gain,
                });
            }
        }

        best
    }

    fn predict_sample(node: &TreeNode, sample: &[f64]) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        fn count_leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => count_leaves(left) + count_leaves(right),
            }
        }
        self.root.as_ref().map_or(0, count_leaves)
    }
}

impl Regressor for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_xy(x, y)?;

        let n_features = x.ncols();
        self.n_features = n_features;

        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut rng, &mut importances));
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(ForecastError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(ForecastError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let sample = row.to_vec();
                Self::predict_sample(root, &sample)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    /// Impurity decrease per feature, normalised to sum to 1
    fn feature_importances(&self) -> Option<Array1<f64>> {
        let raw = self.feature_importances.as_ref()?;
        Some(normalize(raw))
    }
}

pub(crate) fn normalize(values: &Array1<f64>) -> Array1<f64> {
    let total: f64 = values.sum();
    if total > 0.0 {
        values / total
    } else {
        values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor_simple() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        for (p, a) in predictions.iter().zip(y.iter()) {
            assert!((p - a).abs() < 1e-9);
        }
        assert_eq!(tree.get_n_leaves(), 5);
    }

    #[test]
    fn test_step_function() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![5.0, 5.0, 5.0, 20.0, 20.0, 20.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.get_depth(), 2);
        let pred = tree.predict(&array![[6.0], [7.0]]).unwrap();
        assert_eq!(pred[0], 5.0);
        assert_eq!(pred[1], 20.0);
    }

    #[test]
    fn test_max_depth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![1.0, 4.0, 2.0, 8.0, 3.0, 9.0, 5.0, 7.0];

        let mut tree = DecisionTree::new().with_max_depth(2);
        tree.fit(&x, &y).unwrap();

        // depth counts leaf levels, so two splits give three levels
        assert!(tree.get_depth() <= 3);
        assert!(tree.get_n_leaves() <= 4);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

        let mut tree = DecisionTree::new().with_min_samples_leaf(3);
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.get_n_leaves(), 2);
    }

    #[test]
    fn test_feature_importances() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];

        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let importances = tree.feature_importances().unwrap();
        assert!((importances[0] - 1.0).abs() < 1e-12);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_predict_before_fit() {
        let tree = DecisionTree::new();
        assert!(matches!(tree.predict(&array![[1.0]]), Err(ForecastError::ModelNotFitted)));
    }
}
