//! Convention-based dataset and artifact locations, relative to the home path

use super::{ModelType, SamplingFrequency};
use std::path::{Path, PathBuf};

/// Relative location of the processed dataset for a sampling frequency
pub fn dataset_path(frequency: SamplingFrequency) -> String {
    format!("data/processed/bicimad_{}.csv", frequency.as_str())
}

/// Relative locations of the artifacts produced for one (frequency, model) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPaths {
    /// Metrics JSON document
    pub metrics: String,
    /// Serialized fitted model
    pub model: String,
}

/// Look up artifact paths keyed by frequency and model type
pub fn result_paths(frequency: SamplingFrequency, model_type: ModelType) -> ResultPaths {
    let dir = format!("results/{}/{}", frequency.as_str(), model_type.as_str());
    ResultPaths {
        metrics: format!("{}/metrics.json", dir),
        model: format!("{}/model.json", dir),
    }
}

/// Resolve a relative artifact path against the home path
pub fn create_path(home_path: impl AsRef<Path>, relative_path: &str) -> PathBuf {
    home_path.as_ref().join(relative_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_path_by_frequency() {
        assert_eq!(dataset_path(SamplingFrequency::Daily), "data/processed/bicimad_daily.csv");
        assert_eq!(dataset_path(SamplingFrequency::Hourly), "data/processed/bicimad_hourly.csv");
    }

    #[test]
    fn test_result_paths_are_distinct_per_model() {
        let rf = result_paths(SamplingFrequency::Daily, ModelType::RandomForest);
        let xgb = result_paths(SamplingFrequency::Daily, ModelType::XGBoost);

        assert_eq!(rf.metrics, "results/daily/random-forest/metrics.json");
        assert_eq!(rf.model, "results/daily/random-forest/model.json");
        assert_ne!(rf.metrics, xgb.metrics);
    }

    #[test]
    fn test_create_path_joins_home() {
        let path = create_path("/srv/bicimad", "results/hourly/xgboost/metrics.json");
        assert_eq!(path, PathBuf::from("/srv/bicimad/results/hourly/xgboost/metrics.json"));
    }
}
