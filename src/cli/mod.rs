//! Command-line interface
//!
//! One invocation trains and evaluates one model family on one dataset.

use anyhow::Context;
use clap::Parser;
use colored::*;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use crate::config::{create_path, dataset_path, result_paths, ForecastConfig, ModelType, SamplingFrequency};
use crate::export::{MetricsReport, ResultWriter};
use crate::training::{format_params, ForecastEngine, TrainedModel};
use crate::utils::{load_dataframe_from_csv, Dataset};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString    { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
    let _ = std::io::stdout().flush();
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn row(key: &str, val: &str) {
    println!("  {:<22} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug, Clone)]
#[command(name = "bicimad-forecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and evaluate BiciMAD demand forecasting models")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory holding data/ and results/
    #[arg(long, default_value = ".")]
    pub home_path: PathBuf,

    /// Dataset aggregation (daily, hourly)
    #[arg(long, default_value = "daily")]
    pub sampling_frequency: SamplingFrequency,

    /// Model family (linear-regression, random-forest, xgboost, deep-learning)
    #[arg(long, default_value = "deep-learning")]
    pub model_type: ModelType,

    /// JSON file overriding the default run configuration
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Random seed, overrides the configuration file
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip feature importances for tree ensembles
    #[arg(long)]
    pub no_feature_importance: bool,
}

/// What a run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: MetricsReport,
    pub metrics_path: PathBuf,
    /// Written only for models that are persisted
    pub model_path: Option<PathBuf>,
    pub training_time_secs: f64,
}

/// Resolve the run configuration from the config file and flag overrides
pub fn resolve_config(cli: &Cli) -> anyhow::Result<ForecastConfig> {
    let mut config = match &cli.config {
        Some(path) => ForecastConfig::from_json_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ForecastConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_random_state(seed);
    }
    if cli.no_feature_importance {
        config = config.with_feature_importance(false);
    }
    config.validate()?;
    Ok(config)
}

/// Load the dataset, train one model family, write its artifacts and print a
/// summary
pub fn runner(cli: &Cli) -> anyhow::Result<RunSummary> {
    let frequency = cli.sampling_frequency;
    let model_type = cli.model_type;
    let config = resolve_config(cli)?;

    section(&format!("BiciMAD forecast · {} · {}", frequency, model_type));

    let data_path = create_path(&cli.home_path, &dataset_path(frequency));
    step_run("Loading data");
    let start = Instant::now();
    let df = load_dataframe_from_csv(&data_path)
        .with_context(|| format!("loading dataset {}", data_path.display()))?;
    let features = config.features(frequency);
    let dataset = Dataset::from_frame(&df, &features, &config.target_column)
        .with_context(|| format!("extracting features from {}", data_path.display()))?;
    step_done(&format!(
        "{} rows × {} features in {:.2?}",
        dataset.n_samples(),
        dataset.n_features(),
        start.elapsed()
    ));
    info!(path = %data_path.display(), rows = dataset.n_samples(), "dataset ready");

    step_run(&format!("Training {}", model_type.as_str().cyan()));
    let engine = ForecastEngine::new(config);
    let outcome = engine
        .run(model_type, &dataset)
        .with_context(|| format!("training {}", model_type))?;
    step_done(&format!("{:.2}s", outcome.training_time_secs));

    let paths = result_paths(frequency, model_type);
    let metrics_path = create_path(&cli.home_path, &paths.metrics);
    let report = MetricsReport::from_outcome(&outcome, frequency);

    let mut writer = ResultWriter::new();
    writer
        .write_metrics(&metrics_path, &report)
        .with_context(|| format!("writing metrics to {}", metrics_path.display()))?;

    let model_path = match &outcome.model {
        TrainedModel::DeepLearning(mlp) => {
            let path = create_path(&cli.home_path, &paths.model);
            writer
                .save_model(&path, mlp)
                .with_context(|| format!("writing model to {}", path.display()))?;
            Some(path)
        }
        TrainedModel::LinearRegression(_) | TrainedModel::RandomForest(_) | TrainedModel::XGBoost(_) => None,
    };

    let summary = RunSummary {
        report,
        metrics_path,
        model_path,
        training_time_secs: outcome.training_time_secs,
    };
    print_summary(&summary);
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    let report = &summary.report;

    section("Best parameters");
    row("params", &format_params(&report.best_params));
    row("cv R²", &format!("{:.4}", report.cv_best_score));

    section("Held-out metrics");
    for (name, value) in report.metrics.as_map() {
        row(&name, &format!("{:.4}", value));
    }
    row("train / test rows", &format!("{} / {}", report.n_train, report.n_test));

    if let Some(importances) = &report.feature_importances {
        section("Feature importances");
        for (name, value) in importances.iter().rev() {
            row(name, &format!("{:.4}", value));
        }
    }

    println!();
    step_ok(&format!("metrics → {}", summary.metrics_path.display()));
    if let Some(path) = &summary.model_path {
        step_ok(&format!("model   → {}", path.display()));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["bicimad-forecast"]);
        assert_eq!(cli.home_path, PathBuf::from("."));
        assert_eq!(cli.sampling_frequency, SamplingFrequency::Daily);
        assert_eq!(cli.model_type, ModelType::DeepLearning);
        assert!(cli.config.is_none());
        assert!(!cli.no_feature_importance);
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from([
            "bicimad-forecast",
            "--home-path",
            "/data/bicimad",
            "--sampling-frequency",
            "hourly",
            "--model-type",
            "xgboost",
            "--seed",
            "7",
            "--no-feature-importance",
        ]);
        assert_eq!(cli.sampling_frequency, SamplingFrequency::Hourly);
        assert_eq!(cli.model_type, ModelType::XGBoost);
        assert_eq!(cli.seed, Some(7));

        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.random_seed, Some(7));
        assert!(!config.feature_importance);
    }

    #[test]
    fn test_unknown_model_type_rejected() {
        let result = Cli::try_parse_from(["bicimad-forecast", "--model-type", "prophet"]);
        assert!(result.is_err());
    }
}
