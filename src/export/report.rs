//! Metrics report written after each run

use crate::config::{ModelType, SamplingFrequency};
use crate::training::{ForecastOutcome, Params, RegressionMetrics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything recorded about one trained model, serialised as a single JSON
/// document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub model_type: ModelType,
    pub sampling_frequency: SamplingFrequency,
    pub metrics: RegressionMetrics,
    /// Ascending by importance; written as a JSON object in that order
    #[serde(default, skip_serializing_if = "Option::is_none", with = "ordered_pairs")]
    pub feature_importances: Option<Vec<(String, f64)>>,
    pub best_params: Params,
    pub cv_best_score: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub trained_at: DateTime<Utc>,
}

impl MetricsReport {
    pub fn from_outcome(outcome: &ForecastOutcome, sampling_frequency: SamplingFrequency) -> Self {
        Self {
            model_type: outcome.model_type,
            sampling_frequency,
            metrics: outcome.metrics,
            feature_importances: outcome.feature_importances.clone(),
            best_params: outcome.best_params.clone(),
            cv_best_score: outcome.cv_best_score,
            n_train: outcome.n_train,
            n_test: outcome.n_test,
            trained_at: Utc::now(),
        }
    }
}

/// `[(name, value)]` <-> `{"name": value, ...}` keeping entry order
mod ordered_pairs {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    type Pairs = Vec<(String, f64)>;

    pub fn serialize<S: Serializer>(value: &Option<Pairs>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (name, score) in pairs {
                    map.serialize_entry(name, score)?;
                }
                map.end()
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Pairs>, D::Error> {
        deserializer.deserialize_option(OptionVisitor)
    }

    struct OptionVisitor;

    impl<'de> Visitor<'de> for OptionVisitor {
        type Value = Option<Pairs>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("null or a map of feature importances")
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            deserializer.deserialize_map(PairsVisitor).map(Some)
        }
    }

    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Pairs;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of feature importances")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((name, score)) = access.next_entry::<String, f64>()? {
                pairs.push((name, score));
            }
            Ok(pairs)
        }
    }
}
