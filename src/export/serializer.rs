//! JSON persistence for models and metrics reports

use super::report::MetricsReport;
use crate::error::{ForecastError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path)
        .map_err(|e| ForecastError::IoError(std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e))))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| ForecastError::SerializationError(e.to_string()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    debug!(path = %path.display(), "wrote json");
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| {
        ForecastError::DataError(format!("Failed to open {}: {}", path.display(), e))
    })?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| ForecastError::SerializationError(format!("{}: {}", path.display(), e)))
}

/// Save any serialisable model as pretty JSON, creating parent directories
pub fn save_model<M: Serialize>(path: impl AsRef<Path>, model: &M) -> Result<()> {
    write_json(path.as_ref(), model)
}

/// Load a model previously written by [`save_model`]
pub fn load_model<M: DeserializeOwned>(path: impl AsRef<Path>) -> Result<M> {
    read_json(path.as_ref())
}

/// Writes run artifacts under their configured paths
#[derive(Debug, Clone, Default)]
pub struct ResultWriter {
    written: Vec<PathBuf>,
}

impl ResultWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_metrics(&mut self, path: impl AsRef<Path>, report: &MetricsReport) -> Result<()> {
        let path = path.as_ref();
        write_json(path, report)?;
        self.written.push(path.to_path_buf());
        Ok(())
    }

    pub fn save_model<M: Serialize>(&mut self, path: impl AsRef<Path>, model: &M) -> Result<()> {
        let path = path.as_ref();
        save_model(path, model)?;
        self.written.push(path.to_path_buf());
        Ok(())
    }

    pub fn load_model<M: DeserializeOwned>(path: impl AsRef<Path>) -> Result<M> {
        load_model(path)
    }

    pub fn read_metrics(path: impl AsRef<Path>) -> Result<MetricsReport> {
        read_json(path.as_ref())
    }

    /// Files written so far, in order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelType, SamplingFrequency};
    use crate::training::{LinearRegression, Regressor, RegressionMetrics};
    use chrono::Utc;
    use ndarray::{array, Array2};
    use tempfile::tempdir;

    #[test]
    fn test_write_metrics_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results").join("daily").join("metrics_linear.json");

        let report = MetricsReport {
            model_type: ModelType::LinearRegression,
            sampling_frequency: SamplingFrequency::Daily,
            metrics: RegressionMetrics {
                mae: 1.0,
                mse: 2.0,
                rmse: 2f64.sqrt(),
                r2: 0.5,
                explained_variance: 0.5,
                max_error: 3.0,
            },
            feature_importances: None,
            best_params: Default::default(),
            cv_best_score: 0.4,
            n_train: 10,
            n_test: 3,
            trained_at: Utc::now(),
        };

        let mut writer = ResultWriter::new();
        writer.write_metrics(&path, &report).unwrap();
        assert!(path.exists());
        assert_eq!(writer.written(), &[path.clone()]);

        let loaded = ResultWriter::read_metrics(&path).unwrap();
        assert_eq!(loaded, report);
    }

    #[test]
    fn test_saved_model_predicts_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");

        let x = Array2::from_shape_fn((20, 2), |(i, j)| (i * (j + 1)) as f64);
        let y = x.column(0).mapv(|v| 2.0 * v + 1.0) + &x.column(1);
        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        save_model(&path, &model).unwrap();
        let restored: LinearRegression = load_model(&path).unwrap();

        let probe = array![[3.0, 6.0], [10.0, 20.0]];
        assert_eq!(model.predict(&probe).unwrap(), restored.predict(&probe).unwrap());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempdir().unwrap();
        let result: Result<LinearRegression> = load_model(dir.path().join("absent.json"));
        assert!(matches!(result, Err(ForecastError::DataError(_))));
    }
}
