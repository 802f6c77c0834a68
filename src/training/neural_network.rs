//! Neural Network (Multi-Layer Perceptron) regression
//!
//! A feedforward network trained with mini-batch SGD and momentum. Inputs
//! and target are standardised internally, so callers pass raw values.

use super::models::{check_xy, Regressor};
use crate::error::{ForecastError, Result};
use crate::preprocessing::StandardScaler;
use ndarray::{s, Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Activation function of the hidden layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Rectified Linear Unit
    ReLU,
    Sigmoid,
    Tanh,
}

impl Default for Activation {
    fn default() -> Self {
        Self::ReLU
    }
}

impl Activation {
    fn apply(self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::ReLU => z.mapv(|v| v.max(0.0)),
            Activation::Sigmoid => z.mapv(sigmoid),
            Activation::Tanh => z.mapv(f64::tanh),
        }
    }

    fn derivative(self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::ReLU => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Sigmoid => z.mapv(|v| {
                let s = sigmoid(v);
                s * (1.0 - s)
            }),
            Activation::Tanh => z.mapv(|v| 1.0 - v.tanh().powi(2)),
        }
    }
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

/// Neural Network configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MLPConfig {
    /// Hidden layer sizes
    pub hidden_layers: Vec<usize>,
    /// Activation function for hidden layers
    pub activation: Activation,
    pub learning_rate: f64,
    /// Number of epochs
    pub max_epochs: usize,
    pub batch_size: usize,
    /// L2 regularization
    pub alpha: f64,
    pub random_state: Option<u64>,
    /// Epochs without validation improvement before stopping
    pub early_stopping_patience: usize,
    /// Trailing fraction of the training rows used for early stopping
    pub validation_split: f64,
    pub momentum: f64,
}

impl Default for MLPConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![64],
            activation: Activation::ReLU,
            learning_rate: 0.001,
            max_epochs: 200,
            batch_size: 32,
            alpha: 0.0001,
            random_state: Some(42),
            early_stopping_patience: 10,
            validation_split: 0.1,
            momentum: 0.9,
        }
    }
}

impl MLPConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |name: &str, value: String, reason: &str| ForecastError::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.to_string(),
        };

        if self.hidden_layers.iter().any(|&n| n == 0) {
            return Err(invalid(
                "hidden_layers",
                format!("{:?}", self.hidden_layers),
                "layer sizes must be positive",
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(invalid("learning_rate", self.learning_rate.to_string(), "must be positive"));
        }
        if self.max_epochs == 0 {
            return Err(invalid("max_epochs", "0".to_string(), "must be positive"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "0".to_string(), "must be positive"));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(invalid(
                "validation_split",
                self.validation_split.to_string(),
                "must be in [0, 1)",
            ));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(invalid("momentum", self.momentum.to_string(), "must be in [0, 1)"));
        }
        Ok(())
    }
}

/// Multi-Layer Perceptron Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MLPRegressor {
    config: MLPConfig,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    x_scaler: StandardScaler,
    y_scaler: StandardScaler,
    n_features: usize,
    /// Epochs actually run by the last fit
    n_epochs: usize,
    is_fitted: bool,
}

impl MLPRegressor {
    pub fn new(config: MLPConfig) -> Self {
        Self {
            config,
            weights: Vec::new(),
            biases: Vec::new(),
            x_scaler: StandardScaler::new(),
            y_scaler: StandardScaler::new(),
            n_features: 0,
            n_epochs: 0,
            is_fitted: false,
        }
    }

    pub fn config(&self) -> &MLPConfig {
        &self.config
    }

    pub fn n_epochs(&self) -> usize {
        self.n_epochs
    }

    /// Write the fitted network as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        crate::export::save_model(path, self)
    }

    /// Read a network written by [`MLPRegressor::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        crate::export::load_model(path)
    }

    fn initialize_weights(&mut self, rng: &mut Xoshiro256PlusPlus) -> Result<()> {
        self.weights.clear();
        self.biases.clear();

        let mut layer_sizes = vec![self.n_features];
        layer_sizes.extend(&self.config.hidden_layers);
        layer_sizes.push(1);

        for pair in layer_sizes.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);

            // Xavier/Glorot initialization
            let scale = (2.0 / (n_in + n_out) as f64).sqrt();
            let weights: Vec<f64> = (0..n_in * n_out)
                .map(|_| rng.gen::<f64>() * 2.0 * scale - scale)
                .collect();

            self.weights.push(Array2::from_shape_vec((n_in, n_out), weights)?);
            self.biases.push(Array1::zeros(n_out));
        }
        Ok(())
    }

    /// Pre-activations and activations of every layer; `activations[0]` is the input
    fn forward(&self, x: &Array2<f64>) -> (Vec<Array2<f64>>, Vec<Array2<f64>>) {
        let n_layers = self.weights.len();
        let mut activations = Vec::with_capacity(n_layers + 1);
        let mut z_values = Vec::with_capacity(n_layers);
        let mut current = x.to_owned();

        for (i, (w, b)) in self.weights.iter().zip(self.biases.iter()).enumerate() {
            let z = current.dot(w) + b;
            let next = if i + 1 < n_layers {
                self.config.activation.apply(&z)
            } else {
                // Linear output for regression
                z.clone()
            };
            activations.push(current);
            z_values.push(z);
            current = next;
        }
        activations.push(current);

        (activations, z_values)
    }

    fn output(&self, x: &Array2<f64>) -> Array1<f64> {
        let (mut activations, _) = self.forward(x);
        activations
            .pop()
            .map(|a| a.column(0).to_owned())
            .unwrap_or_else(|| Array1::zeros(x.nrows()))
    }

    fn backward(
        &self,
        y: &Array1<f64>,
        activations: &[Array2<f64>],
        z_values: &[Array2<f64>],
    ) -> Vec<(Array2<f64>, Array1<f64>)> {
        let n = y.len() as f64;
        let n_layers = self.weights.len();
        let mut gradients = Vec::with_capacity(n_layers);

        // Output layer error (MSE gradient)
        let y_2d = y.clone().insert_axis(Axis(1));
        let mut delta = (&activations[n_layers] - &y_2d) / n;

        for i in (0..n_layers).rev() {
            let grad_w = activations[i].t().dot(&delta);
            let grad_b = delta.sum_axis(Axis(0));
            gradients.push((grad_w, grad_b));

            if i > 0 {
                delta = delta.dot(&self.weights[i].t()) * self.config.activation.derivative(&z_values[i - 1]);
            }
        }

        gradients.reverse();
        gradients
    }

    fn mse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let diff = y_true - y_pred;
        diff.dot(&diff) / y_true.len().max(1) as f64
    }
}

impl Regressor for MLPRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_xy(x, y)?;
        self.config.validate()?;

        let n_samples = x.nrows();
        self.n_features = x.ncols();

        let x_scaled = self.x_scaler.fit_transform(x)?;
        self.y_scaler.fit_vector(y)?;
        let y_scaled = self.y_scaler.transform_vector(y)?;

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        self.initialize_weights(&mut rng)?;

        // Hold out the trailing rows, keeping at least one for training
        let val_size = ((n_samples as f64 * self.config.validation_split) as usize).min(n_samples - 1);
        let train_size = n_samples - val_size;

        let x_train = x_scaled.slice(s![..train_size, ..]).to_owned();
        let y_train = y_scaled.slice(s![..train_size]).to_owned();
        let x_val = x_scaled.slice(s![train_size.., ..]).to_owned();
        let y_val = y_scaled.slice(s![train_size..]).to_owned();

        let mut velocities_w: Vec<Array2<f64>> =
            self.weights.iter().map(|w| Array2::zeros(w.raw_dim())).collect();
        let mut velocities_b: Vec<Array1<f64>> =
            self.biases.iter().map(|b| Array1::zeros(b.len())).collect();

        let mut best_val_loss = f64::INFINITY;
        let mut best_state: Option<(Vec<Array2<f64>>, Vec<Array1<f64>>)> = None;
        let mut patience_counter = 0;
        let mut indices: Vec<usize> = (0..train_size).collect();
        self.n_epochs = 0;

        for epoch in 0..self.config.max_epochs {
            self.n_epochs = epoch + 1;
            indices.shuffle(&mut rng);

            for batch_indices in indices.chunks(self.config.batch_size) {
                let x_batch = x_train.select(Axis(0), batch_indices);
                let y_batch = y_train.select(Axis(0), batch_indices);

                let (activations, z_values) = self.forward(&x_batch);
                let gradients = self.backward(&y_batch, &activations, &z_values);

                // Update weights with momentum
                for (i, (grad_w, grad_b)) in gradients.into_iter().enumerate() {
                    velocities_w[i] = &velocities_w[i] * self.config.momentum
                        - &grad_w * self.config.learning_rate;
                    velocities_b[i] = &velocities_b[i] * self.config.momentum
                        - &grad_b * self.config.learning_rate;

                    self.weights[i] = &self.weights[i] + &velocities_w[i];
                    self.biases[i] = &self.biases[i] + &velocities_b[i];

                    // L2 regularization
                    self.weights[i] *= 1.0 - self.config.alpha * self.config.learning_rate;
                }
            }

            let train_loss = Self::mse(&y_train, &self.output(&x_train));
            if !train_loss.is_finite() {
                return Err(ForecastError::TrainingError(format!(
                    "training diverged at epoch {} (learning_rate {})",
                    epoch + 1,
                    self.config.learning_rate
                )));
            }

            if val_size > 0 {
                let val_loss = Self::mse(&y_val, &self.output(&x_val));
                if val_loss < best_val_loss {
                    best_val_loss = val_loss;
                    best_state = Some((self.weights.clone(), self.biases.clone()));
                    patience_counter = 0;
                } else {
                    patience_counter += 1;
                    if patience_counter >= self.config.early_stopping_patience {
                        debug!(epoch = epoch + 1, best_val_loss, "early stopping");
                        break;
                    }
                }
            }
        }

        if let Some((weights, biases)) = best_state {
            self.weights = weights;
            self.biases = biases;
        }

        self.is_fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(ForecastError::ModelNotFitted);
        }
        let x_scaled = self.x_scaler.transform(x)?;
        self.y_scaler.inverse_transform_vector(&self.output(&x_scaled))
    }
}
