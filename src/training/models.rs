//! Regressor trait and evaluation metrics

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metrics computed on the held-out evaluation set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// R-squared
    pub r2: f64,
    /// Explained variance score
    pub explained_variance: f64,
    /// Largest absolute residual
    pub max_error: f64,
}

impl RegressionMetrics {
    /// Metric names in output order
    pub const NAMES: [&'static str; 6] = ["mae", "mse", "rmse", "r2", "explained_variance", "max_error"];

    /// Compute regression metrics
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(ForecastError::ValidationError(
                "cannot evaluate on an empty target".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae: f64 = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        let max_error = errors.iter().fold(0.0f64, |acc, e| acc.max(e.abs()));

        let y_mean: f64 = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();
        let r2 = score_ratio(ss_res, ss_tot);

        let err_mean = errors.iter().sum::<f64>() / n;
        let ss_err: f64 = errors.iter().map(|e| (e - err_mean).powi(2)).sum();
        let explained_variance = score_ratio(ss_err, ss_tot);

        Ok(Self {
            mae,
            mse,
            rmse: mse.sqrt(),
            r2,
            explained_variance,
            max_error,
        })
    }

    /// Metrics as a name -> value mapping
    pub fn as_map(&self) -> BTreeMap<String, f64> {
        let values = [self.mae, self.mse, self.rmse, self.r2, self.explained_variance, self.max_error];
        Self::NAMES
            .iter()
            .zip(values)
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }
}

// 1 - num/den, with a constant target scoring 1.0 only on a perfect fit
fn score_ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        1.0 - num / den
    } else if num == 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Evaluate predictions against the test target
pub fn evaluate(predictions: &Array1<f64>, test_target: &Array1<f64>) -> Result<RegressionMetrics> {
    RegressionMetrics::compute(test_target, predictions)
}

/// R-squared of predictions, used as the cross-validation score
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    Ok(RegressionMetrics::compute(y_true, y_pred)?.r2)
}

/// Trait for regression models
pub trait Regressor: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Get feature importances (if available)
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }
}

/// Check that `x` and `y` describe the same number of samples
pub(crate) fn check_xy(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(ForecastError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(ForecastError::ValidationError("no training samples".to_string()));
    }
    Ok(())
}
