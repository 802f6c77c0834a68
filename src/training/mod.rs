//! Model training module
//!
//! Regressors for the forecasting pipeline:
//! - Linear regression (normal equations)
//! - Regression trees and random forests
//! - XGBoost-style gradient boosting
//! - Neural networks (MLP)
//!
//! plus cross-validation, grid search and the [`ForecastEngine`] that ties
//! them together.

mod engine;
mod models;
pub mod cross_validation;
pub mod decision_tree;
pub mod grid_search;
pub mod linear_models;
pub mod neural_network;
pub mod random_forest;
pub mod xgboost;

pub use cross_validation::{CVResults, CVSplit, CVStrategy, CrossValidator};
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{sorted_importances, ForecastEngine, ForecastOutcome, TrainedModel};
pub use grid_search::{
    format_params, CandidateResult, GridSearchCv, GridSearchResult, ParameterGrid, ParameterValue, Params,
};
pub use linear_models::LinearRegression;
pub use models::{evaluate, r2_score, RegressionMetrics, Regressor};
pub use neural_network::{Activation, MLPConfig, MLPRegressor};
pub use random_forest::{MaxFeatures, RandomForestRegressor};
pub use xgboost::{XGBoostConfig, XGBoostRegressor};
