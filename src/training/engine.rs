//! Forecasting engine: split, grid search, refit, evaluate

use super::cross_validation::CrossValidator;
use super::grid_search::{format_params, GridSearchCv, ParameterValue, Params};
use super::linear_models::LinearRegression;
use super::models::{evaluate, RegressionMetrics, Regressor};
use super::neural_network::{Activation, MLPRegressor};
use super::random_forest::{MaxFeatures, RandomForestRegressor};
use super::xgboost::{XGBoostConfig, XGBoostRegressor};
use crate::config::{ForecastConfig, ModelType};
use crate::error::{ForecastError, Result};
use crate::utils::data_loader::{prepare_data, Dataset};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Enum to hold trained model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    LinearRegression(LinearRegression),
    RandomForest(RandomForestRegressor),
    XGBoost(XGBoostRegressor),
    DeepLearning(MLPRegressor),
}

impl TrainedModel {
    pub fn model_type(&self) -> ModelType {
        match self {
            TrainedModel::LinearRegression(_) => ModelType::LinearRegression,
            TrainedModel::RandomForest(_) => ModelType::RandomForest,
            TrainedModel::XGBoost(_) => ModelType::XGBoost,
            TrainedModel::DeepLearning(_) => ModelType::DeepLearning,
        }
    }

    fn inner(&self) -> &dyn Regressor {
        match self {
            TrainedModel::LinearRegression(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::XGBoost(m) => m,
            TrainedModel::DeepLearning(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            TrainedModel::LinearRegression(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::XGBoost(m) => m,
            TrainedModel::DeepLearning(m) => m,
        }
    }
}

impl Regressor for TrainedModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict(x)
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.inner().feature_importances()
    }
}

/// Result of one forecasting run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastOutcome {
    pub model_type: ModelType,
    pub best_params: Params,
    /// Mean cross-validated R^2 of the chosen parameters
    pub cv_best_score: f64,
    pub metrics: RegressionMetrics,
    /// (feature, importance) sorted ascending by importance
    pub feature_importances: Option<Vec<(String, f64)>>,
    pub model: TrainedModel,
    pub n_train: usize,
    pub n_test: usize,
    pub training_time_secs: f64,
}

/// Runs grid-searched training and evaluation for one model family
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    config: ForecastConfig,
}

impl ForecastEngine {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Split `dataset`, pick hyperparameters by cross-validation on the
    /// training part, refit on all of it and evaluate on the held-out rows
    pub fn run(&self, model_type: ModelType, dataset: &Dataset) -> Result<ForecastOutcome> {
        self.config.validate_for(model_type)?;
        let start = Instant::now();

        let (train, test) = prepare_data(
            dataset,
            self.config.test_size,
            self.config.shuffle_split,
            self.config.random_seed,
        )?;
        info!(
            model = %model_type,
            n_train = train.n_samples(),
            n_test = test.n_samples(),
            n_features = train.n_features(),
            "split dataset"
        );

        let mut cv = CrossValidator::new(self.config.cv_strategy.clone());
        if let Some(seed) = self.config.random_seed {
            cv = cv.with_random_state(seed);
        }
        let grid = self.config.grids.for_model(model_type);
        let search = GridSearchCv::new(cv).fit(
            |params| Ok(Box::new(self.build(model_type, params)?) as Box<dyn Regressor>),
            grid,
            &train.x,
            &train.y,
        )?;
        info!(
            model = %model_type,
            candidates = search.candidates.len(),
            best_params = %format_params(&search.best_params),
            cv_r2 = search.best_score,
            "grid search finished"
        );

        let mut model = self.build(model_type, &search.best_params)?;
        model.fit(&train.x, &train.y)?;
        let predictions = model.predict(&test.x)?;
        let metrics = evaluate(&predictions, &test.y)?;
        info!(
            model = %model_type,
            mae = metrics.mae,
            rmse = metrics.rmse,
            r2 = metrics.r2,
            "evaluated on held-out rows"
        );

        let feature_importances = if self.config.feature_importance && model_type.has_feature_importances() {
            model
                .feature_importances()
                .map(|imp| sorted_importances(&train.feature_names, &imp))
        } else {
            None
        };

        Ok(ForecastOutcome {
            model_type,
            best_params: search.best_params,
            cv_best_score: search.best_score,
            metrics,
            feature_importances,
            model,
            n_train: train.n_samples(),
            n_test: test.n_samples(),
            training_time_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Unfitted model of `model_type` with `params` applied over the defaults
    pub fn build(&self, model_type: ModelType, params: &Params) -> Result<TrainedModel> {
        let reader = ParamReader { params, model_type };
        let seed = self.config.random_seed;

        let model = match model_type {
            ModelType::LinearRegression => {
                reader.check_known(&["fit_intercept", "alpha"])?;
                let mut model = LinearRegression::new();
                if let Some(v) = reader.bool("fit_intercept")? {
                    model = model.with_fit_intercept(v);
                }
                if let Some(v) = reader.non_negative("alpha")? {
                    model = model.with_alpha(v);
                }
                TrainedModel::LinearRegression(model)
            }
            ModelType::RandomForest => {
                reader.check_known(&[
                    "n_estimators",
                    "max_depth",
                    "min_samples_split",
                    "min_samples_leaf",
                    "max_features",
                    "bootstrap",
                ])?;
                let mut model = RandomForestRegressor::new(reader.positive_usize("n_estimators")?.unwrap_or(100));
                if let Some(depth) = reader.optional_usize("max_depth")? {
                    model = model.with_max_depth(depth);
                }
                if let Some(v) = reader.positive_usize("min_samples_split")? {
                    model = model.with_min_samples_split(v);
                }
                if let Some(v) = reader.positive_usize("min_samples_leaf")? {
                    model = model.with_min_samples_leaf(v);
                }
                if let Some(v) = reader.max_features("max_features")? {
                    model = model.with_max_features(v);
                }
                if let Some(v) = reader.bool("bootstrap")? {
                    model = model.with_bootstrap(v);
                }
                if let Some(seed) = seed {
                    model = model.with_random_state(seed);
                }
                TrainedModel::RandomForest(model)
            }
            ModelType::XGBoost => {
                reader.check_known(&[
                    "n_estimators",
                    "learning_rate",
                    "max_depth",
                    "min_child_weight",
                    "reg_lambda",
                    "reg_alpha",
                    "gamma",
                    "subsample",
                    "colsample_bytree",
                ])?;
                let defaults = XGBoostConfig::default();
                let config = XGBoostConfig {
                    n_estimators: reader.positive_usize("n_estimators")?.unwrap_or(defaults.n_estimators),
                    learning_rate: reader.positive("learning_rate")?.unwrap_or(defaults.learning_rate),
                    max_depth: reader.positive_usize("max_depth")?.unwrap_or(defaults.max_depth),
                    min_child_weight: reader
                        .non_negative("min_child_weight")?
                        .unwrap_or(defaults.min_child_weight),
                    reg_lambda: reader.non_negative("reg_lambda")?.unwrap_or(defaults.reg_lambda),
                    reg_alpha: reader.non_negative("reg_alpha")?.unwrap_or(defaults.reg_alpha),
                    gamma: reader.non_negative("gamma")?.unwrap_or(defaults.gamma),
                    subsample: reader.fraction("subsample")?.unwrap_or(defaults.subsample),
                    colsample_bytree: reader
                        .fraction("colsample_bytree")?
                        .unwrap_or(defaults.colsample_bytree),
                    random_state: seed.or(defaults.random_state),
                };
                TrainedModel::XGBoost(XGBoostRegressor::new(config))
            }
            ModelType::DeepLearning => {
                reader.check_known(&[
                    "hidden_layers",
                    "activation",
                    "learning_rate",
                    "max_epochs",
                    "batch_size",
                    "alpha",
                    "momentum",
                    "early_stopping_patience",
                    "validation_split",
                ])?;
                let mut config = self.config.mlp.clone();
                if let Some(v) = reader.hidden_layers("hidden_layers")? {
                    config.hidden_layers = v;
                }
                if let Some(v) = reader.activation("activation")? {
                    config.activation = v;
                }
                if let Some(v) = reader.positive("learning_rate")? {
                    config.learning_rate = v;
                }
                if let Some(v) = reader.positive_usize("max_epochs")? {
                    config.max_epochs = v;
                }
                if let Some(v) = reader.positive_usize("batch_size")? {
                    config.batch_size = v;
                }
                if let Some(v) = reader.non_negative("alpha")? {
                    config.alpha = v;
                }
                if let Some(v) = reader.non_negative("momentum")? {
                    config.momentum = v;
                }
                if let Some(v) = reader.positive_usize("early_stopping_patience")? {
                    config.early_stopping_patience = v;
                }
                if let Some(v) = reader.non_negative("validation_split")? {
                    config.validation_split = v;
                }
                if seed.is_some() {
                    config.random_state = seed;
                }
                config.validate()?;
                TrainedModel::DeepLearning(MLPRegressor::new(config))
            }
        };

        debug!(model = %model_type, params = %format_params(params), "built model");
        Ok(model)
    }
}

/// Pair importances with feature names, sorted ascending; equal scores keep
/// column order
pub fn sorted_importances(feature_names: &[String], importances: &Array1<f64>) -> Vec<(String, f64)> {
    let mut pairs: Vec<(String, f64)> = feature_names
        .iter()
        .cloned()
        .zip(importances.iter().copied())
        .collect();
    pairs.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    pairs
}

/// Typed access to a parameter assignment
struct ParamReader<'a> {
    params: &'a Params,
    model_type: ModelType,
}

impl ParamReader<'_> {
    fn invalid(&self, name: &str, value: &ParameterValue, reason: &str) -> ForecastError {
        ForecastError::InvalidParameter {
            name: format!("{}.{}", self.model_type, name),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn check_known(&self, known: &[&str]) -> Result<()> {
        match self.params.iter().find(|(k, _)| !known.contains(&k.as_str())) {
            Some((name, value)) => Err(self.invalid(name, value, "unknown hyperparameter")),
            None => Ok(()),
        }
    }

    fn bool(&self, name: &str) -> Result<Option<bool>> {
        self.params
            .get(name)
            .map(|v| v.as_bool().ok_or_else(|| self.invalid(name, v, "expected a boolean")))
            .transpose()
    }

    fn float(&self, name: &str, accept: impl Fn(f64) -> bool, reason: &str) -> Result<Option<f64>> {
        self.params
            .get(name)
            .map(|v| match v.as_float() {
                Some(f) if accept(f) => Ok(f),
                _ => Err(self.invalid(name, v, reason)),
            })
            .transpose()
    }

    fn positive(&self, name: &str) -> Result<Option<f64>> {
        self.float(name, |f| f > 0.0, "expected a positive number")
    }

    fn non_negative(&self, name: &str) -> Result<Option<f64>> {
        self.float(name, |f| f >= 0.0, "expected a non-negative number")
    }

    fn fraction(&self, name: &str) -> Result<Option<f64>> {
        self.float(name, |f| f > 0.0 && f <= 1.0, "expected a number in (0, 1]")
    }

    fn positive_usize(&self, name: &str) -> Result<Option<usize>> {
        self.params
            .get(name)
            .map(|v| match v.as_int() {
                Some(i) if i > 0 => Ok(i as usize),
                _ => Err(self.invalid(name, v, "expected a positive integer")),
            })
            .transpose()
    }

    /// Absent -> None, null -> Some(None)
    fn optional_usize(&self, name: &str) -> Result<Option<Option<usize>>> {
        match self.params.get(name) {
            Some(ParameterValue::Null) => Ok(Some(None)),
            Some(_) => Ok(self.positive_usize(name)?.map(Some)),
            None => Ok(None),
        }
    }

    fn max_features(&self, name: &str) -> Result<Option<MaxFeatures>> {
        let Some(value) = self.params.get(name) else {
            return Ok(None);
        };
        let parsed = match value {
            ParameterValue::Null => Some(MaxFeatures::All),
            ParameterValue::Int(n) if *n > 0 => Some(MaxFeatures::Fixed(*n as usize)),
            ParameterValue::Float(f) if *f > 0.0 && *f <= 1.0 => Some(MaxFeatures::Fraction(*f)),
            ParameterValue::Str(s) => match s.to_ascii_lowercase().as_str() {
                "sqrt" => Some(MaxFeatures::Sqrt),
                "log2" => Some(MaxFeatures::Log2),
                "all" => Some(MaxFeatures::All),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| self.invalid(name, value, "expected null, a count, a fraction, \"sqrt\" or \"log2\""))
    }

    /// `"64,32"` or a single integer width
    fn hidden_layers(&self, name: &str) -> Result<Option<Vec<usize>>> {
        let Some(value) = self.params.get(name) else {
            return Ok(None);
        };
        let parsed = match value {
            ParameterValue::Int(n) if *n > 0 => Some(vec![*n as usize]),
            ParameterValue::Str(s) => s
                .split(',')
                .map(|part| part.trim().parse::<usize>().ok().filter(|&n| n > 0))
                .collect::<Option<Vec<usize>>>(),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| self.invalid(name, value, "expected comma-separated positive layer sizes"))
    }

    fn activation(&self, name: &str) -> Result<Option<Activation>> {
        let Some(value) = self.params.get(name) else {
            return Ok(None);
        };
        match value.as_str().map(str::to_ascii_lowercase).as_deref() {
            Some("relu") => Ok(Some(Activation::ReLU)),
            Some("tanh") => Ok(Some(Activation::Tanh)),
            Some("sigmoid") | Some("logistic") => Ok(Some(Activation::Sigmoid)),
            _ => Err(self.invalid(name, value, "expected relu, tanh or sigmoid")),
        }
    }
}
