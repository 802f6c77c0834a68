//! Feature and target column tables

use super::SamplingFrequency;

/// Column holding the number of trips in each time bucket
pub const TARGET: &str = "trips";

/// Feature columns of the daily aggregation
pub const FEATURES_DAILY: &[&str] = &[
    "year",
    "month",
    "day",
    "day_of_week",
    "is_weekend",
    "is_holiday",
    "temperature_mean",
    "temperature_max",
    "temperature_min",
    "precipitation",
    "wind_speed",
];

/// Feature columns of the hourly aggregation
pub const FEATURES_HOURLY: &[&str] = &[
    "year",
    "month",
    "day",
    "hour",
    "day_of_week",
    "is_weekend",
    "is_holiday",
    "temperature_mean",
    "temperature_max",
    "temperature_min",
    "precipitation",
    "wind_speed",
];

/// Default feature columns for a sampling frequency
pub fn features_for(frequency: SamplingFrequency) -> Vec<String> {
    let table = match frequency {
        SamplingFrequency::Daily => FEATURES_DAILY,
        SamplingFrequency::Hourly => FEATURES_HOURLY,
    };
    table.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hourly_extends_daily() {
        let daily = features_for(SamplingFrequency::Daily);
        let hourly = features_for(SamplingFrequency::Hourly);

        assert_eq!(hourly.len(), daily.len() + 1);
        assert!(hourly.contains(&"hour".to_string()));
        assert!(daily.iter().all(|f| hourly.contains(f)));
    }

    #[test]
    fn test_target_is_not_a_feature() {
        assert!(!FEATURES_DAILY.contains(&TARGET));
        assert!(!FEATURES_HOURLY.contains(&TARGET));
    }
}
