//! Aggregated connection samples and their classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latency below this (ms) is required for a `Good` rating
pub const GOOD_LATENCY_MS: f64 = 200.0;
/// Speed above this (MB/s) is required for a `Good` rating
pub const GOOD_SPEED_MBPS: f64 = 1.0;
/// Latency below this (ms) is required for a `Fair` rating
pub const FAIR_LATENCY_MS: f64 = 500.0;
/// Speed above this (MB/s) is required for a `Fair` rating
pub const FAIR_SPEED_MBPS: f64 = 0.5;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionMetrics {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Best latency of the cycle in milliseconds, absent when nothing answered
    pub latency: Option<f64>,
    /// Mean download speed in MB/s, absent when nothing answered
    pub download_speed: Option<f64>,
    pub status: ConnectionStatus,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Good,
    Fair,
    Poor,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Good => write!(f, "GOOD"),
            ConnectionStatus::Fair => write!(f, "FAIR"),
            ConnectionStatus::Poor => write!(f, "POOR"),
        }
    }
}

impl ConnectionStatus {
    /// Classify a latency/speed pair. The first matching band wins.
    pub fn classify(latency_ms: Option<f64>, speed_mbps: Option<f64>) -> Self {
        let (Some(latency), Some(speed)) = (latency_ms, speed_mbps) else {
            return ConnectionStatus::Poor;
        };

        if latency < GOOD_LATENCY_MS && speed > GOOD_SPEED_MBPS {
            ConnectionStatus::Good
        } else if latency < FAIR_LATENCY_MS && speed > FAIR_SPEED_MBPS {
            ConnectionStatus::Fair
        } else {
            ConnectionStatus::Poor
        }
    }
}

impl ConnectionMetrics {
    pub fn new(latency: Option<f64>, download_speed: Option<f64>) -> Self {
        Self {
            timestamp: Utc::now(),
            latency,
            download_speed,
            status: ConnectionStatus::classify(latency, download_speed),
        }
    }
}

/// Render a latency for display, `---` when there is no measurement
pub fn format_latency(latency_ms: Option<f64>) -> String {
    match latency_ms {
        Some(ms) => format!("{:.0}ms", ms),
        None => "---".to_string(),
    }
}

/// Render a speed for display, `---` when there is no measurement
pub fn format_speed(speed_mbps: Option<f64>) -> String {
    match speed_mbps {
        Some(mbps) => format!("{:.2} MB/s", mbps),
        None => "---".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_measurement_is_poor() {
        assert_eq!(ConnectionStatus::classify(None, Some(10.0)), ConnectionStatus::Poor);
        assert_eq!(ConnectionStatus::classify(Some(10.0), None), ConnectionStatus::Poor);
        assert_eq!(ConnectionStatus::classify(None, None), ConnectionStatus::Poor);
    }

    #[test]
    fn test_classification_bands() {
        assert_eq!(ConnectionStatus::classify(Some(50.0), Some(5.0)), ConnectionStatus::Good);
        assert_eq!(ConnectionStatus::classify(Some(150.0), Some(0.6)), ConnectionStatus::Fair);
        assert_eq!(ConnectionStatus::classify(Some(300.0), Some(5.0)), ConnectionStatus::Fair);
        assert_eq!(ConnectionStatus::classify(Some(450.0), Some(0.5)), ConnectionStatus::Poor);
        assert_eq!(ConnectionStatus::classify(Some(600.0), Some(50.0)), ConnectionStatus::Poor);
    }

    #[test]
    fn test_band_edges_are_exclusive() {
        assert_eq!(ConnectionStatus::classify(Some(200.0), Some(2.0)), ConnectionStatus::Fair);
        assert_eq!(ConnectionStatus::classify(Some(100.0), Some(1.0)), ConnectionStatus::Fair);
        assert_eq!(ConnectionStatus::classify(Some(500.0), Some(2.0)), ConnectionStatus::Poor);
    }

    #[test]
    fn test_wire_format() {
        let sample = ConnectionMetrics::new(Some(120.0), None);
        let json = serde_json::to_value(&sample).unwrap();

        assert_eq!(json["latency"], 120.0);
        assert!(json["downloadSpeed"].is_null());
        assert_eq!(json["status"], "poor");
        assert!(json["timestamp"].is_i64());
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_latency(Some(119.6)), "120ms");
        assert_eq!(format_latency(None), "---");
        assert_eq!(format_speed(Some(0.5)), "0.50 MB/s");
        assert_eq!(format_speed(None), "---");
    }
}
