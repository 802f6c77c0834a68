//! Result export
//!
//! Metrics reports and trained models are written as JSON documents.

mod report;
mod serializer;

pub use report::MetricsReport;
pub use serializer::{load_model, save_model, ResultWriter};
