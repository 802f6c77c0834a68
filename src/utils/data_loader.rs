//! Dataset loading and train/test preparation

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Load a CSV file with a header row
pub fn load_dataframe_from_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        ForecastError::IoError(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| ForecastError::DataError(format!("{}: {}", path.display(), e)))?;

    debug!(path = %path.display(), rows = df.height(), cols = df.width(), "loaded csv");
    Ok(df)
}

/// Numeric feature matrix and target vector extracted from a frame
#[derive(Debug, Clone)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub x: Array2<f64>,
    pub y: Array1<f64>,
}

impl Dataset {
    /// Build a dataset from arrays
    pub fn new(feature_names: Vec<String>, x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        if x.nrows() != y.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.ncols() != feature_names.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} feature names", x.ncols()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }
        Ok(Self { feature_names, x, y })
    }

    /// Extract the named feature columns and target column as `f64`.
    /// Rows with a null in any selected column are dropped.
    pub fn from_frame(df: &DataFrame, features: &[String], target: &str) -> Result<Self> {
        let feature_values = features
            .iter()
            .map(|name| column_values(df, name))
            .collect::<Result<Vec<_>>>()?;
        let target_values = column_values(df, target)?;

        let keep: Vec<usize> = (0..df.height())
            .filter(|&r| {
                target_values[r].is_some() && feature_values.iter().all(|col| col[r].is_some())
            })
            .collect();

        let dropped = df.height() - keep.len();
        if dropped > 0 {
            warn!(dropped, total = df.height(), "dropping rows with missing values");
        }
        if keep.is_empty() {
            return Err(ForecastError::DataError(
                "no complete rows left after dropping missing values".to_string(),
            ));
        }

        let x = Array2::from_shape_fn((keep.len(), features.len()), |(r, c)| {
            feature_values[c][keep[r]].unwrap_or_default()
        });
        let y: Array1<f64> = keep
            .iter()
            .map(|&r| target_values[r].unwrap_or_default())
            .collect();

        Self::new(features.to_vec(), x, y)
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Rows at the given indices, in order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
        }
    }
}

fn column_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| ForecastError::FeatureNotFound(name.to_string()))?;
    let series = column.as_materialized_series();
    let cast = series
        .cast(&DataType::Float64)
        .map_err(|e| ForecastError::DataError(format!("column '{}': {}", name, e)))?;

    // A non-strict cast turns unparsable values into nulls
    if cast.null_count() > series.null_count() {
        return Err(ForecastError::DataError(format!(
            "column '{}' contains non-numeric values",
            name
        )));
    }

    Ok(cast
        .f64()
        .map_err(|e| ForecastError::DataError(e.to_string()))?
        .into_iter()
        .collect())
}

/// Split a dataset into (train, test).
///
/// Without shuffling the last `test_size` fraction of rows is held out, so the
/// test set lies after the training set in time.
pub fn prepare_data(
    dataset: &Dataset,
    test_size: f64,
    shuffle: bool,
    random_state: Option<u64>,
) -> Result<(Dataset, Dataset)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ForecastError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }

    let n = dataset.n_samples();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ForecastError::ValidationError(format!(
            "cannot split {} rows with test_size {}",
            n, test_size
        )));
    }
    let n_train = n - n_test;

    let mut indices: Vec<usize> = (0..n).collect();
    if shuffle {
        let mut rng = match random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        indices.shuffle(&mut rng);
    }

    let train = dataset.select(&indices[..n_train]);
    let test = dataset.select(&indices[n_train..]);
    Ok((train, test))
}
