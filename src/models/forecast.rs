//! Observed series data and model forecasts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::timestamp;

/// One observed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    #[serde(with = "timestamp")]
    pub ts: DateTime<Utc>,
    pub value: f64,
}

/// Observed values for a series over a time window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesData {
    #[serde(default)]
    pub data: Vec<TimeSeriesPoint>,
}

/// One forecast value, optionally with confidence bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(with = "timestamp")]
    pub ts: DateTime<Utc>,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci: Option<BTreeMap<String, f64>>,
}

/// A single model's forecast for a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastData {
    #[serde(default)]
    pub label: String,

    /// Preliminary MASE while the challenge is still running
    #[serde(default)]
    pub current_mase: Option<f64>,

    #[serde(default)]
    pub data: Vec<ForecastPoint>,
}

/// Forecasts for one series, keyed by readable model id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastsResponse {
    #[serde(default)]
    pub forecasts: BTreeMap<String, ForecastData>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_data_deserialization() {
        let data: SeriesData = serde_json::from_str(
            r#"{"data": [{"ts": "2025-10-01T00:00:00", "value": 1.5},
                         {"ts": "2025-10-01T01:00:00Z", "value": 2.0}]}"#,
        )
        .unwrap();
        assert_eq!(data.data.len(), 2);
        assert_eq!(data.data[1].value, 2.0);
    }

    #[test]
    fn test_series_data_missing_data() {
        let data: SeriesData = serde_json::from_str("{}").unwrap();
        assert!(data.data.is_empty());
    }

    #[test]
    fn test_forecasts_deserialization() {
        let response: ForecastsResponse = serde_json::from_str(
            r#"{"forecasts": {
                "chronos-bolt": {
                    "label": "Chronos Bolt",
                    "current_mase": 0.91,
                    "data": [{"ts": "2025-10-08T00:00:00Z", "y": 3.0,
                              "ci": {"0.025": 2.0, "0.975": 4.0}}]
                },
                "naive": {"data": []}
            }}"#,
        )
        .unwrap();

        let chronos = &response.forecasts["chronos-bolt"];
        assert_eq!(chronos.label, "Chronos Bolt");
        assert_eq!(chronos.current_mase, Some(0.91));
        assert_eq!(chronos.data[0].ci.as_ref().unwrap()["0.975"], 4.0);
        assert!(response.forecasts["naive"].current_mase.is_none());
    }

    #[test]
    fn test_invalid_timestamp_rejected() {
        let result = serde_json::from_str::<TimeSeriesPoint>(r#"{"ts": "soon", "value": 1}"#);
        assert!(result.is_err());
    }
}
