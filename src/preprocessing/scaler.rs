//! Feature scaling

use crate::error::{ForecastError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Center and scale of one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub center: f64,
    pub scale: f64,
}

impl ScalerParams {
    fn from_values<'a>(values: impl Iterator<Item = &'a f64> + Clone) -> Self {
        let n = values.clone().count().max(1) as f64;
        let mean = values.clone().sum::<f64>() / n;
        let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        Self {
            center: mean,
            scale: if std == 0.0 { 1.0 } else { std },
        }
    }
}

/// Z-score scaler: `(x - mean) / std`, with population std and constant
/// columns left at scale 1
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ScalerParams>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        !self.params.is_empty()
    }

    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    /// Fit per-column statistics of a matrix
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(ForecastError::DataError("cannot fit scaler on zero rows".to_string()));
        }
        self.params = x
            .axis_iter(Axis(1))
            .map(|col| ScalerParams::from_values(col.iter()))
            .collect();
        Ok(self)
    }

    /// Fit on a single column
    pub fn fit_vector(&mut self, y: &Array1<f64>) -> Result<&mut Self> {
        if y.is_empty() {
            return Err(ForecastError::DataError("cannot fit scaler on zero rows".to_string()));
        }
        self.params = vec![ScalerParams::from_values(y.iter())];
        Ok(self)
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        let mut out = x.to_owned();
        for (mut col, p) in out.axis_iter_mut(Axis(1)).zip(&self.params) {
            col.mapv_inplace(|v| (v - p.center) / p.scale);
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    pub fn inverse_transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(x.ncols())?;
        let mut out = x.to_owned();
        for (mut col, p) in out.axis_iter_mut(Axis(1)).zip(&self.params) {
            col.mapv_inplace(|v| v * p.scale + p.center);
        }
        Ok(out)
    }

    pub fn transform_vector(&self, y: &Array1<f64>) -> Result<Array1<f64>> {
        let p = self.single()?;
        Ok(y.mapv(|v| (v - p.center) / p.scale))
    }

    pub fn inverse_transform_vector(&self, y: &Array1<f64>) -> Result<Array1<f64>> {
        let p = self.single()?;
        Ok(y.mapv(|v| v * p.scale + p.center))
    }

    fn single(&self) -> Result<ScalerParams> {
        match self.params.as_slice() {
            [p] => Ok(*p),
            [] => Err(ForecastError::ModelNotFitted),
            _ => Err(ForecastError::ShapeError {
                expected: "1 column".to_string(),
                actual: format!("{} columns", self.params.len()),
            }),
        }
    }

    fn check_width(&self, n_cols: usize) -> Result<()> {
        if !self.is_fitted() {
            return Err(ForecastError::ModelNotFitted);
        }
        if n_cols != self.params.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("{} columns", self.params.len()),
                actual: format!("{} columns", n_cols),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 10.0], [2.0, 10.0], [3.0, 10.0], [4.0, 10.0], [5.0, 10.0]];

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();

        let mean = scaled.column(0).sum() / 5.0;
        assert!(mean.abs() < 1e-10);
        assert!((scaled[[4, 0]] - 2.0f64.sqrt()).abs() < 1e-10);
        // Constant column is centred but not divided by zero
        assert!(scaled.column(1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_inverse_transform() {
        let x = array![[1.0, -3.0], [2.0, 0.5], [7.0, 4.0]];

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).unwrap();
        let restored = scaler.inverse_transform(&scaled).unwrap();

        for (o, r) in x.iter().zip(restored.iter()) {
            assert!((o - r).abs() < 1e-10);
        }
    }

    #[test]
    fn test_vector_scaling() {
        let y = array![100.0, 200.0, 300.0];
        let mut scaler = StandardScaler::new();
        scaler.fit_vector(&y).unwrap();

        let z = scaler.transform_vector(&y).unwrap();
        assert!((z[1]).abs() < 1e-12);
        assert_eq!(scaler.inverse_transform_vector(&z).unwrap()[2], 300.0);
    }

    #[test]
    fn test_unfitted_and_width_errors() {
        let scaler = StandardScaler::new();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(ForecastError::ModelNotFitted)
        ));

        let mut scaler = StandardScaler::new();
        scaler.fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&array![[1.0]]),
            Err(ForecastError::ShapeError { .. })
        ));
    }
}
