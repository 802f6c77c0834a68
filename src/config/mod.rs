//! Run configuration
//!
//! Holds the enums selected on the command line, the feature and path tables,
//! and [`ForecastConfig`], which carries everything tunable about a run. The
//! config can be read from a JSON file; any field left out falls back to its
//! default.

mod features;
mod paths;

pub use features::{features_for, FEATURES_DAILY, FEATURES_HOURLY, TARGET};
pub use paths::{create_path, dataset_path, result_paths, ResultPaths};

use crate::error::{ForecastError, Result};
use crate::training::{CVStrategy, MLPConfig, ParameterGrid, ParameterValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Time bucketing of the usage dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingFrequency {
    Daily,
    Hourly,
}

impl SamplingFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingFrequency::Daily => "daily",
            SamplingFrequency::Hourly => "hourly",
        }
    }
}

impl fmt::Display for SamplingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingFrequency {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(SamplingFrequency::Daily),
            "hourly" => Ok(SamplingFrequency::Hourly),
            other => Err(ForecastError::InvalidParameter {
                name: "sampling-frequency".to_string(),
                value: other.to_string(),
                reason: "expected one of: daily, hourly".to_string(),
            }),
        }
    }
}

/// Forecasting model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelType {
    /// Ordinary least squares
    LinearRegression,
    /// Bagged regression trees
    RandomForest,
    /// Second-order gradient boosted trees
    #[serde(rename = "xgboost")]
    XGBoost,
    /// Multi-layer perceptron
    DeepLearning,
}

impl ModelType {
    pub const ALL: [ModelType; 4] = [
        ModelType::LinearRegression,
        ModelType::RandomForest,
        ModelType::XGBoost,
        ModelType::DeepLearning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::LinearRegression => "linear-regression",
            ModelType::RandomForest => "random-forest",
            ModelType::XGBoost => "xgboost",
            ModelType::DeepLearning => "deep-learning",
        }
    }

    /// Whether the fitted model exposes per-feature importances
    pub fn has_feature_importances(&self) -> bool {
        matches!(self, ModelType::RandomForest | ModelType::XGBoost)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear-regression" | "linear_regression" => Ok(ModelType::LinearRegression),
            "random-forest" | "random_forest" => Ok(ModelType::RandomForest),
            "xgboost" => Ok(ModelType::XGBoost),
            "deep-learning" | "deep_learning" => Ok(ModelType::DeepLearning),
            other => Err(ForecastError::InvalidParameter {
                name: "model-type".to_string(),
                value: other.to_string(),
                reason: "expected one of: linear-regression, random-forest, xgboost, deep-learning"
                    .to_string(),
            }),
        }
    }
}

/// Hyperparameter grids searched for each model family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HyperparameterGrids {
    pub linear_regression: ParameterGrid,
    pub random_forest: ParameterGrid,
    pub xgboost: ParameterGrid,
    pub deep_learning: ParameterGrid,
}

impl Default for HyperparameterGrids {
    fn default() -> Self {
        Self {
            linear_regression: ParameterGrid::new()
                .add("fit_intercept", vec![ParameterValue::Bool(true), ParameterValue::Bool(false)]),
            random_forest: ParameterGrid::new()
                .add("n_estimators", vec![ParameterValue::Int(50), ParameterValue::Int(100)])
                .add(
                    "max_depth",
                    vec![ParameterValue::Null, ParameterValue::Int(10), ParameterValue::Int(20)],
                )
                .add("min_samples_leaf", vec![ParameterValue::Int(1), ParameterValue::Int(3)]),
            xgboost: ParameterGrid::new()
                .add("n_estimators", vec![ParameterValue::Int(100), ParameterValue::Int(200)])
                .add("learning_rate", vec![ParameterValue::Float(0.05), ParameterValue::Float(0.1)])
                .add("max_depth", vec![ParameterValue::Int(3), ParameterValue::Int(6)]),
            deep_learning: ParameterGrid::new()
                .add(
                    "hidden_layers",
                    vec![ParameterValue::Str("64".to_string()), ParameterValue::Str("64,32".to_string())],
                )
                .add("learning_rate", vec![ParameterValue::Float(0.001), ParameterValue::Float(0.01)]),
        }
    }
}

impl HyperparameterGrids {
    /// Grid for a model family
    pub fn for_model(&self, model_type: ModelType) -> &ParameterGrid {
        match model_type {
            ModelType::LinearRegression => &self.linear_regression,
            ModelType::RandomForest => &self.random_forest,
            ModelType::XGBoost => &self.xgboost,
            ModelType::DeepLearning => &self.deep_learning,
        }
    }
}

/// Configuration of one forecasting run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Target column name
    pub target_column: String,

    /// Feature column names (None = table for the sampling frequency)
    pub feature_columns: Option<Vec<String>>,

    /// Fraction of rows held out for evaluation
    pub test_size: f64,

    /// Shuffle rows before the train/test split (false keeps the most
    /// recent rows as the test set)
    pub shuffle_split: bool,

    /// Cross-validation used by the grid search
    pub cv_strategy: CVStrategy,

    /// Random seed for reproducibility
    pub random_seed: Option<u64>,

    /// Report feature importances for tree ensembles
    pub feature_importance: bool,

    /// Hyperparameter grids per model family
    pub grids: HyperparameterGrids,

    /// Base settings of the neural network; grid values override them
    pub mlp: MLPConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            target_column: TARGET.to_string(),
            feature_columns: None,
            test_size: 0.2,
            shuffle_split: false,
            cv_strategy: CVStrategy::KFold { n_splits: 5, shuffle: false },
            random_seed: Some(42),
            feature_importance: true,
            grids: HyperparameterGrids::default(),
            mlp: MLPConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a configuration from a JSON file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ForecastError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Builder method to set feature columns
    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.feature_columns = Some(features);
        self
    }

    /// Builder method to set the target column
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_column = target.into();
        self
    }

    /// Builder method to set the held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Builder method to set the cross-validation strategy
    pub fn with_cv(mut self, strategy: CVStrategy) -> Self {
        self.cv_strategy = strategy;
        self
    }

    /// Builder method to set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Builder method to toggle feature importance reporting
    pub fn with_feature_importance(mut self, enabled: bool) -> Self {
        self.feature_importance = enabled;
        self
    }

    /// Builder method to replace the hyperparameter grids
    pub fn with_grids(mut self, grids: HyperparameterGrids) -> Self {
        self.grids = grids;
        self
    }

    /// Builder method to set the base neural network settings
    pub fn with_mlp(mut self, mlp: MLPConfig) -> Self {
        self.mlp = mlp;
        self
    }

    /// Feature columns for a sampling frequency
    pub fn features(&self, frequency: SamplingFrequency) -> Vec<String> {
        self.feature_columns
            .clone()
            .unwrap_or_else(|| features_for(frequency))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ForecastError::InvalidParameter {
                name: "test_size".to_string(),
                value: self.test_size.to_string(),
                reason: "must be in (0, 1)".to_string(),
            });
        }

        if self.cv_strategy.n_splits() < 2 {
            return Err(ForecastError::InvalidParameter {
                name: "cv_strategy.n_splits".to_string(),
                value: self.cv_strategy.n_splits().to_string(),
                reason: "must be at least 2".to_string(),
            });
        }

        if let Some(features) = &self.feature_columns {
            if features.is_empty() {
                return Err(ForecastError::ConfigError("feature_columns is empty".to_string()));
            }
            if features.contains(&self.target_column) {
                return Err(ForecastError::ConfigError(format!(
                    "target column '{}' is also listed as a feature",
                    self.target_column
                )));
            }
        }

        self.mlp.validate()
    }

    /// [`validate`](Self::validate) plus the checks that depend on the
    /// model family being trained
    pub fn validate_for(&self, model_type: ModelType) -> Result<()> {
        self.validate()?;
        if self.grids.for_model(model_type).is_empty() {
            return Err(ForecastError::ConfigError(format!(
                "hyperparameter grid for {} is empty",
                model_type
            )));
        }
        Ok(())
    }
}
