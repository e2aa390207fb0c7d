//! Configuration management for the connection monitor

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the relay serving `/api/proxy`
    pub relay_url: String,

    /// Initial routing choice for probes
    pub use_proxy: bool,

    /// How often the runner triggers an aggregation cycle
    pub update_interval: Duration,

    /// Maximum number of samples kept in history
    pub max_data_points: usize,

    /// Minimum spacing between two full speed-test rounds
    pub speed_test_interval: Duration,

    /// Extra attempts after the first failed probe
    pub retry_attempts: u32,

    /// Fixed pause between probe attempts
    pub retry_delay_ms: u64,

    /// Per-request deadline for latency probes
    pub latency_timeout: Duration,

    /// Per-request deadline for speed probes
    pub speed_timeout: Duration,

    /// Latency above this marks the endpoint with a warning
    pub high_latency_ms: f64,

    /// Speed below this (MB/s) marks the endpoint with a warning
    pub low_speed_floor_mbps: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_url: "http://127.0.0.1:8080".to_string(),
            use_proxy: true,
            update_interval: Duration::from_secs(5),
            max_data_points: 50,
            speed_test_interval: Duration::from_secs(10),
            retry_attempts: 2,
            retry_delay_ms: 1000,
            latency_timeout: Duration::from_millis(5000),
            speed_timeout: Duration::from_millis(10000),
            high_latency_ms: 1000.0,
            low_speed_floor_mbps: 0.01,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(relay_url) = env::var("RELAY_URL") {
            config.relay_url = relay_url.trim_end_matches('/').to_string();
        }

        if let Ok(use_proxy) = env::var("USE_PROXY") {
            config.use_proxy = use_proxy.to_lowercase() == "true";
        }

        if let Ok(interval) = env::var("UPDATE_INTERVAL_SECONDS") {
            if let Ok(seconds) = interval.parse::<u64>() {
                config.update_interval = Duration::from_secs(seconds);
            }
        }

        if let Ok(points) = env::var("MAX_DATA_POINTS") {
            if let Ok(points) = points.parse() {
                config.max_data_points = points;
            }
        }

        if let Ok(interval) = env::var("SPEED_TEST_INTERVAL_SECONDS") {
            if let Ok(seconds) = interval.parse::<u64>() {
                config.speed_test_interval = Duration::from_secs(seconds);
            }
        }

        if let Ok(attempts) = env::var("RETRY_ATTEMPTS") {
            if let Ok(attempts) = attempts.parse() {
                config.retry_attempts = attempts;
            }
        }

        if let Ok(delay) = env::var("RETRY_DELAY_MS") {
            if let Ok(ms) = delay.parse() {
                config.retry_delay_ms = ms;
            }
        }

        if let Ok(timeout) = env::var("LATENCY_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                config.latency_timeout = Duration::from_millis(ms);
            }
        }

        if let Ok(timeout) = env::var("SPEED_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                config.speed_timeout = Duration::from_millis(ms);
            }
        }

        if let Ok(threshold) = env::var("HIGH_LATENCY_MS") {
            if let Ok(ms) = threshold.parse() {
                config.high_latency_ms = ms;
            }
        }

        if let Ok(floor) = env::var("LOW_SPEED_FLOOR_MBPS") {
            if let Ok(mbps) = floor.parse() {
                config.low_speed_floor_mbps = mbps;
            }
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.relay_url.is_empty() {
            return Err("relay_url cannot be empty".to_string());
        }

        if reqwest::Url::parse(&self.relay_url).is_err() {
            return Err(format!("relay_url is not a valid URL: {}", self.relay_url));
        }

        if self.max_data_points == 0 {
            return Err("max_data_points must be greater than 0".to_string());
        }

        if self.update_interval.is_zero() {
            return Err("update_interval must be greater than 0".to_string());
        }

        if self.latency_timeout.is_zero() || self.speed_timeout.is_zero() {
            return Err("probe timeouts must be greater than 0".to_string());
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, Duration::from_millis(self.retry_delay_ms))
    }
}

/// Runtime settings an operator can flip while the monitor is running
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfig {
    pub use_proxy: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { use_proxy: true }
    }
}

/// Partial update for [`MonitorConfig`]; absent fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorConfigUpdate {
    #[serde(default)]
    pub use_proxy: Option<bool>,
}

impl MonitorConfig {
    pub fn merge(self, update: MonitorConfigUpdate) -> Self {
        Self {
            use_proxy: update.use_proxy.unwrap_or(self.use_proxy),
        }
    }
}
