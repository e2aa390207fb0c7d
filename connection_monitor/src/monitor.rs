//! Endpoint probing and metrics aggregation

use crate::config::{Config, MonitorConfig, MonitorConfigUpdate};
use crate::endpoint::{
    EndpointConfig, EndpointKind, EndpointStatus, EndpointUpdate, default_endpoints,
};
use crate::errors::{MonitorError, Result};
use crate::history::MetricsHistory;
use crate::metrics::{ConnectionMetrics, ConnectionStatus, format_latency, format_speed};
use crate::retry::RetryPolicy;
use crate::transport::{
    Fetcher, HttpFetcher, LATENCY_ACCEPT, ProbeRequest, Route, SPEED_ACCEPT,
};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Probe tunables, fixed for the lifetime of a monitor
#[derive(Debug, Clone)]
struct ProbeSettings {
    retry: RetryPolicy,
    latency_timeout: Duration,
    speed_timeout: Duration,
    speed_test_interval: Duration,
    high_latency_ms: f64,
    low_speed_floor_mbps: f64,
}

/// Result of probing a single endpoint on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointProbe {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EndpointKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_speed: Option<f64>,
    pub endpoint: EndpointConfig,
}

#[derive(Debug, Clone, Copy)]
struct SpeedRound {
    at: Instant,
    speed: Option<f64>,
}

/// Owns the endpoint registry, runtime config and sample history.
///
/// Build one per session and share it behind an `Arc`.
pub struct ConnectionMonitor {
    settings: ProbeSettings,
    fetcher: Arc<dyn Fetcher>,
    config: RwLock<MonitorConfig>,
    endpoints: RwLock<Vec<EndpointConfig>>,
    history: MetricsHistory,
    last_speed_round: RwLock<Option<SpeedRound>>,
}

impl ConnectionMonitor {
    pub fn new(config: &Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            settings: ProbeSettings {
                retry: config.retry_policy(),
                latency_timeout: config.latency_timeout,
                speed_timeout: config.speed_timeout,
                speed_test_interval: config.speed_test_interval,
                high_latency_ms: config.high_latency_ms,
                low_speed_floor_mbps: config.low_speed_floor_mbps,
            },
            fetcher,
            config: RwLock::new(MonitorConfig {
                use_proxy: config.use_proxy,
            }),
            endpoints: RwLock::new(default_endpoints()),
            history: MetricsHistory::new(config.max_data_points),
            last_speed_round: RwLock::new(None),
        }
    }

    /// Create a monitor backed by the HTTP fetcher
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate().map_err(MonitorError::Config)?;
        let fetcher = HttpFetcher::new(&config.relay_url)?;
        Ok(Self::new(config, Arc::new(fetcher)))
    }

    pub async fn get_config(&self) -> MonitorConfig {
        *self.config.read().await
    }

    pub async fn update_config(&self, update: MonitorConfigUpdate) {
        let mut config = self.config.write().await;
        *config = config.merge(update);
        debug!("Monitor config updated: use_proxy={}", config.use_proxy);
    }

    pub async fn get_endpoints(&self) -> Vec<EndpointConfig> {
        self.endpoints.read().await.clone()
    }

    pub async fn get_endpoint(&self, id: &str) -> Option<EndpointConfig> {
        self.endpoints.read().await.iter().find(|e| e.id == id).cloned()
    }

    /// Merge `update` into the endpoint with `id`. Unknown ids are ignored.
    pub async fn update_endpoint(&self, id: &str, update: EndpointUpdate) {
        let mut endpoints = self.endpoints.write().await;
        if let Some(endpoint) = endpoints.iter_mut().find(|e| e.id == id) {
            endpoint.apply(update);
        }
    }

    /// Register an endpoint. Returns false, leaving the registry as it was,
    /// when the id is already taken.
    pub async fn add_endpoint(&self, endpoint: EndpointConfig) -> bool {
        let mut endpoints = self.endpoints.write().await;
        if endpoints.iter().any(|e| e.id == endpoint.id) {
            warn!("Endpoint id {} already registered, ignoring", endpoint.id);
            return false;
        }

        info!("Adding {} endpoint {} ({})", endpoint.kind, endpoint.name, endpoint.url);
        endpoints.push(endpoint);
        true
    }

    pub async fn reset_endpoints(&self) {
        info!("Restoring default endpoints");
        *self.endpoints.write().await = default_endpoints();
    }

    async fn enabled_endpoints(&self, kind: EndpointKind) -> Vec<EndpointConfig> {
        self.endpoints
            .read()
            .await
            .iter()
            .filter(|e| e.is_probe_target(kind))
            .cloned()
            .collect()
    }

    /// Measure round-trip latency of one endpoint in milliseconds.
    ///
    /// Never fails: exhausted retries mark the endpoint as errored and
    /// return `None`.
    #[instrument(skip(self, endpoint), fields(endpoint = %endpoint.id))]
    pub async fn measure_endpoint_latency(&self, endpoint: &EndpointConfig) -> Option<f64> {
        self.update_endpoint(&endpoint.id, EndpointUpdate::in_flight()).await;

        let label = format!("Latency probe for {}", endpoint.name);
        let outcome = self
            .settings
            .retry
            .run(&label, |_| self.latency_attempt(endpoint))
            .await;

        match outcome {
            Ok(latency) => {
                let high = latency > self.settings.high_latency_ms;
                self.update_endpoint(
                    &endpoint.id,
                    if high {
                        EndpointUpdate::outcome(
                            EndpointStatus::Warning,
                            Some("High latency detected".to_string()),
                        )
                    } else {
                        EndpointUpdate::outcome(EndpointStatus::Ok, None)
                    },
                )
                .await;

                debug!("{} latency {:.1}ms", endpoint.name, latency);
                Some(latency)
            }
            Err(e) => {
                error!("Request failed for {}: {}", endpoint.name, e);
                self.mark_failed(&endpoint.id, &e).await;
                None
            }
        }
    }

    async fn latency_attempt(&self, endpoint: &EndpointConfig) -> Result<f64> {
        let started = Instant::now();
        let use_proxy = self.config.read().await.use_proxy;
        let direct = ProbeRequest::new(
            &endpoint.url,
            Route::Direct,
            self.settings.latency_timeout,
            LATENCY_ACCEPT,
        );

        match self.fetcher.get(&direct).await {
            Ok(_) => {}
            Err(e) if use_proxy && e.is_cross_origin_or_network() => {
                debug!("Direct probe of {} blocked ({}), using relay", endpoint.url, e);
                let relayed = ProbeRequest {
                    route: Route::Relay,
                    ..direct.clone()
                };
                self.fetcher.get(&relayed).await?;
            }
            Err(e) => return Err(e),
        }

        Ok(elapsed_ms(started))
    }

    /// Best latency across enabled latency endpoints
    pub async fn measure_latency(&self) -> Option<f64> {
        let endpoints = self.enabled_endpoints(EndpointKind::Latency).await;
        if endpoints.is_empty() {
            return None;
        }

        let results = join_all(
            endpoints
                .iter()
                .map(|endpoint| self.measure_endpoint_latency(endpoint)),
        )
        .await;

        results.into_iter().flatten().reduce(f64::min)
    }

    /// Estimate download speed of one endpoint in MB/s.
    ///
    /// Never fails: exhausted retries mark the endpoint as errored and
    /// return `None`.
    #[instrument(skip(self, endpoint), fields(endpoint = %endpoint.id))]
    pub async fn measure_file_download_speed(&self, endpoint: &EndpointConfig) -> Option<f64> {
        self.update_endpoint(&endpoint.id, EndpointUpdate::in_flight()).await;

        let label = format!("Speed probe for {}", endpoint.name);
        let outcome = self
            .settings
            .retry
            .run(&label, |_| self.speed_attempt(endpoint))
            .await;

        match outcome {
            Ok(speed) => {
                let slow = speed < self.settings.low_speed_floor_mbps;
                self.update_endpoint(
                    &endpoint.id,
                    if slow {
                        EndpointUpdate::outcome(
                            EndpointStatus::Warning,
                            Some("Low download speed detected".to_string()),
                        )
                    } else {
                        EndpointUpdate::outcome(EndpointStatus::Ok, None)
                    },
                )
                .await;

                debug!("{} download speed {:.3} MB/s", endpoint.name, speed);
                Some(speed)
            }
            Err(e) => {
                error!("Speed measurement failed for {}: {}", endpoint.name, e);
                self.mark_failed(&endpoint.id, &e).await;
                None
            }
        }
    }

    async fn speed_attempt(&self, endpoint: &EndpointConfig) -> Result<f64> {
        let started = Instant::now();
        let route = if self.config.read().await.use_proxy {
            Route::Relay
        } else {
            Route::Direct
        };
        let request = ProbeRequest::new(&endpoint.url, route, self.settings.speed_timeout, SPEED_ACCEPT);

        let response = self.fetcher.get(&request).await?;
        if let Some(message) = response.error_field() {
            return Err(MonitorError::Relay(message));
        }

        let seconds = started.elapsed().as_secs_f64().max(f64::EPSILON);
        let size_mb = response.body.len() as f64 / BYTES_PER_MB;

        Ok(size_mb / seconds)
    }

    /// Mean download speed across enabled speed endpoints.
    ///
    /// Rounds are spaced by the speed-test interval; a call inside the
    /// interval returns the latest known speed without probing.
    pub async fn measure_download_speed(&self) -> Option<f64> {
        let now = Instant::now();

        let last_round = *self.last_speed_round.read().await;
        if let Some(round) = last_round {
            if now.duration_since(round.at) < self.settings.speed_test_interval {
                let speed = match self.history.latest().await {
                    Some(sample) => sample.download_speed,
                    None => round.speed,
                };
                debug!("Speed test skipped, reusing {}", format_speed(speed));
                return speed;
            }
        }

        let endpoints = self.enabled_endpoints(EndpointKind::Speed).await;
        let results = join_all(
            endpoints
                .iter()
                .map(|endpoint| self.measure_file_download_speed(endpoint)),
        )
        .await;

        let valid: Vec<f64> = results.into_iter().flatten().collect();
        let speed = if valid.is_empty() {
            None
        } else {
            Some(valid.iter().sum::<f64>() / valid.len() as f64)
        };

        *self.last_speed_round.write().await = Some(SpeedRound { at: now, speed });
        speed
    }

    pub fn get_status(&self, latency: Option<f64>, speed: Option<f64>) -> ConnectionStatus {
        ConnectionStatus::classify(latency, speed)
    }

    /// Run one aggregation cycle and append its sample to history
    pub async fn update_metrics(&self) {
        let (latency, speed) = tokio::join!(self.measure_latency(), self.measure_download_speed());

        let sample = ConnectionMetrics::new(latency, speed);
        info!(
            "Cycle complete: latency {}, speed {}, status {}",
            format_latency(sample.latency),
            format_speed(sample.download_speed),
            sample.status
        );

        self.history.push(sample).await;
    }

    pub async fn get_metrics(&self) -> Vec<ConnectionMetrics> {
        self.history.snapshot().await
    }

    pub async fn latest_metrics(&self) -> Option<ConnectionMetrics> {
        self.history.latest().await
    }

    /// Probe one registered endpoint with the probe matching its kind
    pub async fn probe_endpoint(&self, id: &str) -> Option<EndpointProbe> {
        let endpoint = self.get_endpoint(id).await?;

        let (latency, download_speed) = match endpoint.kind {
            EndpointKind::Latency => (self.measure_endpoint_latency(&endpoint).await, None),
            EndpointKind::Speed => (None, self.measure_file_download_speed(&endpoint).await),
        };

        let endpoint = self.get_endpoint(id).await.unwrap_or(endpoint);
        Some(EndpointProbe {
            id: endpoint.id.clone(),
            kind: endpoint.kind,
            latency,
            download_speed,
            endpoint,
        })
    }

    pub fn history_capacity(&self) -> usize {
        self.history.capacity()
    }

    async fn mark_failed(&self, id: &str, err: &MonitorError) {
        let message = err.to_string();
        let message = if message.is_empty() {
            "Connection failed".to_string()
        } else {
            message
        };

        self.update_endpoint(id, EndpointUpdate::outcome(EndpointStatus::Error, Some(message)))
            .await;
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
