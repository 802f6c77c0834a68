//! XGBoost-style gradient boosting with second-order approximation
//!
//! - Uses both gradient and hessian of the squared-error loss
//! - Regularized leaf weights: w* = -G / (H + lambda)
//! - Gain-based split scoring: Gain = 0.5 * [GL²/(HL+λ) + GR²/(HR+λ) - (GL+GR)²/(HL+HR+λ)] - γ
//! - Built-in L1 (alpha) and L2 (lambda) regularization
//! - Minimum child weight constraint

use super::models::{check_xy, Regressor};
use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// XGBoost configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct XGBoostConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// L1 regularization on leaf weights
    pub reg_alpha: f64,
    /// Minimum loss reduction to make a split (gamma)
    pub gamma: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub random_state: Option<u64>,
}

impl Default for XGBoostConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            gamma: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            random_state: Some(42),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum XGBNode {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        gain: f64,
        left: Box<XGBNode>,
        right: Box<XGBNode>,
    },
}

impl XGBNode {
    fn predict(&self, sample: &[f64]) -> f64 {
        match self {
            XGBNode::Leaf { weight } => *weight,
            XGBNode::Split { feature, threshold, left, right, .. } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }

    fn accumulate_gain(&self, totals: &mut [f64]) {
        if let XGBNode::Split { feature, gain, left, right, .. } = self {
            totals[*feature] += gain;
            left.accumulate_gain(totals);
            right.accumulate_gain(totals);
        }
    }
}

struct GradientStats<'a> {
    grad: &'a Array1<f64>,
    hess: &'a Array1<f64>,
}

/// Build one tree using exact greedy split finding
fn build_xgb_tree(
    x: &Array2<f64>,
    stats: &GradientStats<'_>,
    indices: &[usize],
    feature_indices: &[usize],
    depth: usize,
    config: &XGBoostConfig,
) -> XGBNode {
    let n = indices.len();

    let g_sum: f64 = indices.iter().map(|&i| stats.grad[i]).sum();
    let h_sum: f64 = indices.iter().map(|&i| stats.hess[i]).sum();

    let leaf_weight = compute_leaf_weight(g_sum, h_sum, config.reg_lambda, config.reg_alpha);

    if depth >= config.max_depth || n < 2 || h_sum < config.min_child_weight {
        return XGBNode::Leaf { weight: leaf_weight };
    }

    let best_split = feature_indices
        .par_iter()
        .filter_map(|&f| find_best_split_for_feature(x, stats, indices, f, g_sum, h_sum, config))
        .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

    match best_split {
        Some((feature, threshold, gain)) if gain > config.gamma => {
            let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
                indices.iter().partition(|&&i| x[[i, feature]] <= threshold);

            if left_idx.is_empty() || right_idx.is_empty() {
                return XGBNode::Leaf { weight: leaf_weight };
            }

            let left = build_xgb_tree(x, stats, &left_idx, feature_indices, depth + 1, config);
            let right = build_xgb_tree(x, stats, &right_idx, feature_indices, depth + 1, config);

            XGBNode::Split {
                feature,
                threshold,
                gain,
                left: Box::new(left),
                right: Box::new(right),
            }
        }
        _ => XGBNode::Leaf { weight: leaf_weight },
    }
}

/// Optimal leaf weight with L1 (alpha) and L2 (lambda) regularization
fn compute_leaf_weight(g_sum: f64, h_sum: f64, lambda: f64, alpha: f64) -> f64 {
    let g_adj = if g_sum > alpha {
        g_sum - alpha
    } else if g_sum < -alpha {
        g_sum + alpha
    } else {
        return 0.0;
    };
    -g_adj / (h_sum + lambda)
}

/// Best (feature, threshold, gain) for one feature
fn find_best_split_for_feature(
    x: &Array2<f64>,
    stats: &GradientStats<'_>,
    indices: &[usize],
    feature: usize,
    g_total: f64,
    h_total: f64,
    config: &XGBoostConfig,
) -> Option<(usize, f64, f64)> {
    let mut sorted_indices: Vec<usize> = indices.to_vec();
    sorted_indices.sort_by(|&a, &b| {
        x[[a, feature]]
            .partial_cmp(&x[[b, feature]])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let lambda = config.reg_lambda;
    let parent_score = g_total * g_total / (h_total + lambda);

    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best: Option<(usize, f64, f64)> = None;

    for pos in 0..sorted_indices.len() - 1 {
        let idx = sorted_indices[pos];
        g_left += stats.grad[idx];
        h_left += stats.hess[idx];

        let current = x[[idx, feature]];
        let next = x[[sorted_indices[pos + 1], feature]];
        if next - current < 1e-12 {
            continue;
        }

        let g_right = g_total - g_left;
        let h_right = h_total - h_left;
        if h_left < config.min_child_weight || h_right < config.min_child_weight {
            continue;
        }

        let gain = 0.5
            * ((g_left * g_left) / (h_left + lambda) + (g_right * g_right) / (h_right + lambda)
                - parent_score);

        if best.map_or(true, |(_, _, g)| gain > g) {
            best = Some((feature, (current + next) / 2.0, gain));
        }
    }

    best
}

fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let k = ((n as f64) * ratio).ceil().max(1.0) as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k);
    indices.sort_unstable();
    indices
}

/// Gradient boosted trees (squared error loss)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XGBoostRegressor {
    config: XGBoostConfig,
    trees: Vec<XGBNode>,
    base_score: f64,
    n_features: usize,
}

impl Default for XGBoostRegressor {
    fn default() -> Self {
        Self::new(XGBoostConfig::default())
    }
}

impl XGBoostRegressor {
    pub fn new(config: XGBoostConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_score: 0.0,
            n_features: 0,
        }
    }

    pub fn config(&self) -> &XGBoostConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn predict_row(&self, sample: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |acc, tree| acc + self.config.learning_rate * tree.predict(sample))
    }
}

impl Regressor for XGBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_xy(x, y)?;
        if self.config.learning_rate <= 0.0 {
            return Err(ForecastError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: self.config.learning_rate.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let n_samples = x.nrows();
        let n_features = x.ncols();
        self.n_features = n_features;

        self.base_score = y.mean().unwrap_or(0.0);
        let mut preds = Array1::from_elem(n_samples, self.base_score);
        let rows: Vec<Vec<f64>> = x.rows().into_iter().map(|r| r.to_vec()).collect();

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        self.trees.clear();
        let hess = Array1::from_elem(n_samples, 1.0);

        for _ in 0..self.config.n_estimators {
            // Squared error: grad = pred - y, hess = 1
            let grad: Array1<f64> = &preds - y;
            let stats = GradientStats { grad: &grad, hess: &hess };

            let row_indices = subsample(&mut rng, n_samples, self.config.subsample);
            let col_indices = subsample(&mut rng, n_features, self.config.colsample_bytree);

            let tree = build_xgb_tree(x, &stats, &row_indices, &col_indices, 0, &self.config);

            for (i, row) in rows.iter().enumerate() {
                preds[i] += self.config.learning_rate * tree.predict(row);
            }

            self.trees.push(tree);
        }

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.n_features == 0 {
            return Err(ForecastError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ForecastError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| self.predict_row(&row.to_vec()))
            .collect())
    }

    /// Total split gain per feature, normalised to sum to 1
    fn feature_importances(&self) -> Option<Array1<f64>> {
        if self.n_features == 0 {
            return None;
        }
        let mut totals = vec![0.0; self.n_features];
        for tree in &self.trees {
            tree.accumulate_gain(&mut totals);
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|t| *t /= sum);
        }
        Some(Array1::from_vec(totals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::models::r2_score;

    fn regression_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((50, 2), (0..100).map(|i| i as f64 * 0.1).collect()).unwrap();
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|r| r[0] * 2.0 + r[1] * 0.5 + 1.0)
            .collect();
        (x, y)
    }

    #[test]
    fn test_xgboost_regressor() {
        let (x, y) = regression_data();
        let mut model = XGBoostRegressor::new(XGBoostConfig {
            n_estimators: 50,
            max_depth: 4,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        let r2 = r2_score(&y, &model.predict(&x).unwrap()).unwrap();
        assert!(r2 > 0.9, "XGBoost regressor R² = {}", r2);
        assert_eq!(model.n_trees(), 50);
    }

    #[test]
    fn test_xgboost_regularization() {
        let (x, y) = regression_data();
        let mut model = XGBoostRegressor::new(XGBoostConfig {
            n_estimators: 30,
            reg_lambda: 10.0,
            reg_alpha: 1.0,
            gamma: 1.0,
            subsample: 0.8,
            colsample_bytree: 0.5,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        assert_eq!(preds.len(), 50);
        assert!(preds.iter().all(|p| p.is_finite()));
    }

    fn n_splits(node: &XGBNode) -> usize {
        match node {
            XGBNode::Leaf { .. } => 0,
            XGBNode::Split { left, right, .. } => 1 + n_splits(left) + n_splits(right),
        }
    }

    #[test]
    fn test_large_gamma_prunes_every_split() {
        let (x, y) = regression_data();
        let mut model = XGBoostRegressor::new(XGBoostConfig {
            n_estimators: 10,
            gamma: 1e12,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();

        assert!(model.trees.iter().all(|tree| n_splits(tree) == 0));
        assert!(model.feature_importances().unwrap().iter().all(|&v| v == 0.0));

        // Leaf-only trees give every row the same prediction
        let preds = model.predict(&x).unwrap();
        assert!(preds.iter().all(|p| (p - preds[0]).abs() < 1e-9));
    }

    #[test]
    fn test_min_child_weight_blocks_splits() {
        let (x, y) = regression_data();

        // Unit hessians: a child weighs its row count, and no split of 50 rows
        // leaves 26 on both sides
        let mut blocked = XGBoostRegressor::new(XGBoostConfig {
            n_estimators: 5,
            min_child_weight: 26.0,
            ..Default::default()
        });
        blocked.fit(&x, &y).unwrap();
        assert!(blocked.trees.iter().all(|tree| n_splits(tree) == 0));

        let mut allowed = XGBoostRegressor::new(XGBoostConfig {
            n_estimators: 5,
            min_child_weight: 25.0,
            ..Default::default()
        });
        allowed.fit(&x, &y).unwrap();
        assert!(n_splits(&allowed.trees[0]) >= 1);
    }

    #[test]
    fn test_gain_importances() {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 } else { 1.0 });
        let y: Array1<f64> = (0..40).map(|i| if i < 20 { 0.0 } else { 10.0 }).collect();

        let mut model = XGBoostRegressor::new(XGBoostConfig {
            n_estimators: 10,
            ..Default::default()
        });
        model.fit(&x, &y).unwrap();

        let importances = model.feature_importances().unwrap();
        assert!((importances.sum() - 1.0).abs() < 1e-9);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_leaf_weight_soft_threshold() {
        assert_eq!(compute_leaf_weight(0.5, 10.0, 1.0, 1.0), 0.0);
        assert!((compute_leaf_weight(-4.0, 9.0, 1.0, 0.0) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = XGBoostRegressor::default();
        let x = Array2::zeros((1, 2));
        assert!(matches!(model.predict(&x), Err(ForecastError::ModelNotFitted)));
    }
}
