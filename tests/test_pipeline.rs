//! Integration test: CLI runner from CSV on disk to JSON artifacts

mod common;

use bicimad_forecast::cli::{runner, Cli};
use bicimad_forecast::config::{ModelType, SamplingFrequency};
use bicimad_forecast::export::{load_model, ResultWriter};
use bicimad_forecast::training::{MLPRegressor, Regressor};
use clap::Parser;
use common::{daily_df, hourly_df, write_csv};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_config(home: &Path) -> String {
    let config = json!({
        "cv_strategy": { "KFold": { "n_splits": 3, "shuffle": false } },
        "random_seed": 7,
        "grids": {
            "linear_regression": { "fit_intercept": [true] },
            "random_forest": { "n_estimators": [8], "max_depth": [null, 5] },
            "xgboost": { "n_estimators": [20], "learning_rate": [0.1], "max_depth": [3] },
            "deep_learning": { "hidden_layers": ["8"], "max_epochs": [20] }
        }
    });
    let path = home.join("config.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path.display().to_string()
}

fn cli_for(home: &Path, frequency: &str, model: &str) -> Cli {
    let config = write_config(home);
    Cli::parse_from([
        "bicimad-forecast",
        "--home-path",
        home.to_str().unwrap(),
        "--sampling-frequency",
        frequency,
        "--model-type",
        model,
        "--config",
        &config,
    ])
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_linear_regression_writes_metrics() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "data/processed/bicimad_daily.csv", &mut daily_df(100));

    let summary = runner(&cli_for(dir.path(), "daily", "linear-regression")).unwrap();

    assert!(summary.metrics_path.ends_with("results/daily/linear-regression/metrics.json"));
    assert!(summary.model_path.is_none());

    let value = read_json(&summary.metrics_path);
    assert_eq!(value["model_type"], "linear-regression");
    assert_eq!(value["sampling_frequency"], "daily");
    for name in ["mae", "mse", "rmse", "r2", "explained_variance", "max_error"] {
        assert!(value["metrics"][name].is_number(), "{} is not a number", name);
    }
    assert!(value.get("feature_importances").is_none());
    assert!(value["trained_at"].is_string());
}

#[test]
fn test_random_forest_writes_importances_in_ascending_order() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "data/processed/bicimad_daily.csv", &mut daily_df(100));

    let summary = runner(&cli_for(dir.path(), "daily", "random-forest")).unwrap();
    let report = ResultWriter::read_metrics(&summary.metrics_path).unwrap();

    assert_eq!(report.model_type, ModelType::RandomForest);
    let importances = report.feature_importances.unwrap();
    assert_eq!(importances.len(), 11);
    assert!(importances.windows(2).all(|w| w[0].1 <= w[1].1));

    let value = read_json(&summary.metrics_path);
    let keys: Vec<&String> = value["feature_importances"].as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 11);
}

#[test]
fn test_xgboost_on_hourly_data() {
    let dir = tempdir().unwrap();
    write_csv(dir.path(), "data/processed/bicimad_hourly.csv", &mut hourly_df(240));

    let summary = runner(&cli_for(dir.path(), "hourly", "xgboost")).unwrap();

    assert_eq!(summary.report.sampling_frequency, SamplingFrequency::Hourly);
    assert!(summary.metrics_path.ends_with("results/hourly/xgboost/metrics.json"));
    let importances = summary.report.feature_importances.unwrap();
    assert!(importances.iter().any(|(name, _)| name == "hour"));
}

#[test]
fn test_deep_learning_saves_model() {
    let dir = tempdir().unwrap();
    let mut df = daily_df(100);
    write_csv(dir.path(), "data/processed/bicimad_daily.csv", &mut df);

    let summary = runner(&cli_for(dir.path(), "daily", "deep-learning")).unwrap();

    let model_path = summary.model_path.expect("deep-learning persists its model");
    assert!(model_path.ends_with("results/daily/deep-learning/model.json"));
    assert!(summary.metrics_path.exists());

    let model: MLPRegressor = load_model(&model_path).unwrap();
    let x = ndarray::Array2::from_elem((3, 11), 1.0);
    assert_eq!(model.predict(&x).unwrap().len(), 3);
}

#[test]
fn test_missing_dataset_is_an_error() {
    let dir = tempdir().unwrap();
    let result = runner(&cli_for(dir.path(), "daily", "linear-regression"));

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("bicimad_daily.csv"), "{}", message);
}

#[test]
fn test_missing_feature_column_is_an_error() {
    let dir = tempdir().unwrap();
    let mut df = daily_df(50).drop("precipitation").unwrap();
    write_csv(dir.path(), "data/processed/bicimad_daily.csv", &mut df);

    assert!(runner(&cli_for(dir.path(), "daily", "random-forest")).is_err());
}
