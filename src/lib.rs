//! BiciMAD forecast - bicycle-sharing demand forecasting
//!
//! Trains one of four regression model families on the processed BiciMAD
//! usage dataset (daily or hourly), selects hyperparameters by grid-search
//! cross-validation and writes evaluation metrics as JSON.
//!
//! # Modules
//!
//! - [`config`] - Run configuration, feature tables and artifact paths
//! - [`utils`] - CSV loading and train/test preparation
//! - [`preprocessing`] - Feature and target standardisation
//! - [`training`] - Regressors, cross-validation, grid search and the engine
//! - [`export`] - Metrics reports and model persistence
//! - [`cli`] - Command-line interface

pub mod error;

pub mod config;
pub mod utils;
pub mod preprocessing;
pub mod training;
pub mod export;

pub mod cli;

pub use error::{ForecastError, Result};

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::{ForecastConfig, ModelType, SamplingFrequency};
    pub use crate::error::{ForecastError, Result};
    pub use crate::export::{load_model, save_model, MetricsReport, ResultWriter};
    pub use crate::training::{
        evaluate, CVStrategy, ForecastEngine, ForecastOutcome, GridSearchCv, ParameterGrid,
        ParameterValue, RegressionMetrics, Regressor, TrainedModel,
    };
    pub use crate::utils::{load_dataframe_from_csv, prepare_data, Dataset};
}
