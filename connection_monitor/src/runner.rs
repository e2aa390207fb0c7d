//! Headless runner driving periodic aggregation cycles

use crate::config::Config;
use crate::errors::{MonitorError, Result};
use crate::metrics::{format_latency, format_speed};
use crate::monitor::ConnectionMonitor;
use crate::transport::HttpFetcher;

use std::sync::Arc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info, instrument, warn};

/// Owns a monitor and the timers that feed it
pub struct MonitorRunner {
    config: Config,
    fetcher: Arc<HttpFetcher>,
    monitor: Arc<ConnectionMonitor>,
}

impl MonitorRunner {
    pub fn new(config: Config) -> Result<Self> {
        config.validate().map_err(MonitorError::Config)?;

        let fetcher = Arc::new(HttpFetcher::new(&config.relay_url)?);
        let monitor = Arc::new(ConnectionMonitor::new(&config, fetcher.clone()));

        Ok(Self {
            config,
            fetcher,
            monitor,
        })
    }

    /// Shared handle to the monitor, for callers that read results
    pub fn monitor(&self) -> Arc<ConnectionMonitor> {
        Arc::clone(&self.monitor)
    }

    /// Run until interrupted
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        info!(
            "Starting connection monitor, update interval {}s, relay {}",
            self.config.update_interval.as_secs(),
            self.fetcher.relay_url()
        );

        if self.monitor.get_config().await.use_proxy && !self.fetcher.test_connectivity().await {
            warn!("Relay connectivity test failed, relayed probes will fail until it is reachable");
        }

        let updater = tokio::spawn(periodic_update(
            self.monitor(),
            self.config.update_interval,
        ));
        let reporter = tokio::spawn(report_endpoints(self.monitor(), Duration::from_secs(60)));

        tokio::signal::ctrl_c().await.map_err(|e| {
            MonitorError::Other(format!("Failed to wait for shutdown signal: {}", e))
        })?;

        info!("Shutting down connection monitor");
        updater.abort();
        reporter.abort();
        self.shutdown().await;
        Ok(())
    }

    async fn shutdown(&self) {
        let stats = self.stats().await;
        info!(
            "Final stats - {} samples, {} endpoints ({} enabled, {} failing)",
            stats.samples, stats.endpoints, stats.enabled_endpoints, stats.failing_endpoints
        );
    }

    pub async fn stats(&self) -> MonitorStats {
        let endpoints = self.monitor.get_endpoints().await;
        let latest = self.monitor.latest_metrics().await;

        MonitorStats {
            samples: self.monitor.get_metrics().await.len(),
            history_capacity: self.monitor.history_capacity(),
            endpoints: endpoints.len(),
            enabled_endpoints: endpoints.iter().filter(|e| e.enabled).count(),
            failing_endpoints: endpoints
                .iter()
                .filter(|e| e.status == Some(crate::endpoint::EndpointStatus::Error))
                .count(),
            latest_status: latest.map(|sample| sample.status.to_string()),
        }
    }
}

/// Trigger an aggregation cycle on every tick.
///
/// Cycles run as their own tasks, so a slow round can overlap the next one.
pub async fn periodic_update(monitor: Arc<ConnectionMonitor>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let monitor = Arc::clone(&monitor);
        tokio::spawn(async move {
            monitor.update_metrics().await;
        });
    }
}

/// Log per-endpoint status periodically
async fn report_endpoints(monitor: Arc<ConnectionMonitor>, every: Duration) {
    let mut ticker = interval(every);

    loop {
        ticker.tick().await;

        for endpoint in monitor.get_endpoints().await.iter().filter(|e| e.enabled) {
            match (&endpoint.status, &endpoint.last_error) {
                (Some(status), Some(message)) => {
                    info!("{} [{}] {}: {}", endpoint.name, endpoint.kind, status, message)
                }
                (Some(status), None) => info!("{} [{}] {}", endpoint.name, endpoint.kind, status),
                (None, _) => debug!("{} [{}] pending", endpoint.name, endpoint.kind),
            }
        }

        if let Some(sample) = monitor.latest_metrics().await {
            info!(
                "Connection {} - latency {}, download {}",
                sample.status,
                format_latency(sample.latency),
                format_speed(sample.download_speed)
            );
        }
    }
}

/// Runner statistics
#[derive(Debug, Clone)]
pub struct MonitorStats {
    pub samples: usize,
    pub history_capacity: usize,
    pub endpoints: usize,
    pub enabled_endpoints: usize,
    pub failing_endpoints: usize,
    pub latest_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_rejects_invalid_config() {
        let config = Config {
            relay_url: String::new(),
            ..Config::default()
        };

        assert!(matches!(MonitorRunner::new(config), Err(MonitorError::Config(_))));
    }

    #[tokio::test]
    async fn test_initial_stats() {
        let runner = MonitorRunner::new(Config::default()).unwrap();
        let stats = runner.stats().await;

        assert_eq!(stats.samples, 0);
        assert_eq!(stats.history_capacity, 50);
        assert_eq!(stats.endpoints, 6);
        assert_eq!(stats.enabled_endpoints, 6);
        assert_eq!(stats.failing_endpoints, 0);
        assert!(stats.latest_status.is_none());
    }

    #[tokio::test]
    async fn test_monitor_handle_is_shared() {
        let runner = MonitorRunner::new(Config::default()).unwrap();
        let handle = runner.monitor();

        handle.reset_endpoints().await;
        handle
            .update_endpoint("google", crate::endpoint::EndpointUpdate::enabled(false))
            .await;

        assert_eq!(runner.stats().await.enabled_endpoints, 5);
    }
}
