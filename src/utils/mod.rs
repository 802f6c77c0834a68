//! Data loading utilities

pub mod data_loader;

pub use data_loader::{load_dataframe_from_csv, prepare_data, Dataset};
