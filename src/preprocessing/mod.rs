//! Data preprocessing
//!
//! Standardisation of features and targets before network training.

mod scaler;

pub use scaler::{ScalerParams, StandardScaler};
