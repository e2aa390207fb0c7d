//! HTTP transport used by probes, direct or through the relay

use crate::errors::{MonitorError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const LATENCY_ACCEPT: &str = "application/json,text/plain,*/*";
pub const SPEED_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// How a probe reaches its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Direct,
    Relay,
}

#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub url: String,
    pub route: Route,
    pub timeout: Duration,
    pub accept: &'static str,
}

impl ProbeRequest {
    pub fn new(url: &str, route: Route, timeout: Duration, accept: &'static str) -> Self {
        Self {
            url: url.to_string(),
            route,
            timeout,
            accept,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ProbeResponse {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// The `error` field of a JSON object payload, if there is one
    pub fn error_field(&self) -> Option<String> {
        let value: Value = serde_json::from_slice(&self.body).ok()?;
        match value.get("error")? {
            Value::Null | Value::Bool(false) => None,
            Value::String(message) if message.is_empty() => None,
            Value::String(message) => Some(message.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Issues a single GET for a probe
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, request: &ProbeRequest) -> Result<ProbeResponse>;
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    relay_url: String,
}

impl HttpFetcher {
    pub fn new(relay_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("connection_monitor/{}", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(MonitorError::from)?;

        Ok(Self {
            client,
            relay_url: relay_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn relay_url(&self) -> &str {
        &self.relay_url
    }

    /// URL of the relay's proxy endpoint carrying `target` as a query parameter
    pub fn relay_endpoint(&self, target: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/api/proxy", self.relay_url))
            .map_err(|e| MonitorError::Config(format!("Invalid relay URL: {}", e)))?;
        url.query_pairs_mut().append_pair("url", target);
        Ok(url)
    }

    fn resolve(&self, request: &ProbeRequest) -> Result<Url> {
        match request.route {
            Route::Direct => Url::parse(&request.url)
                .map_err(|e| MonitorError::Other(format!("Invalid URL {}: {}", request.url, e))),
            Route::Relay => self.relay_endpoint(&request.url),
        }
    }

    /// Health check the relay
    pub async fn relay_health(&self) -> Result<RelayHealth> {
        let url = format!("{}/health", self.relay_url);

        debug!("Performing health check against {}", url);

        let response = timeout(Duration::from_secs(5), self.client.get(&url).send())
            .await
            .map_err(|_| MonitorError::Timeout("Health check timeout".to_string()))??;

        if !response.status().is_success() {
            return Err(MonitorError::Http {
                status: response.status().as_u16(),
                message: format!("Health check failed with status: {}", response.status()),
            });
        }

        let health_data: Value = response.json().await?;

        Ok(RelayHealth {
            status: health_data["status"].as_str().unwrap_or("unknown").to_string(),
            service: health_data["service"].as_str().unwrap_or("unknown").to_string(),
            version: health_data["version"].as_str().unwrap_or("unknown").to_string(),
        })
    }

    /// Test connectivity to the relay
    pub async fn test_connectivity(&self) -> bool {
        match self.relay_health().await {
            Ok(health) => {
                info!(
                    "Relay connectivity test successful: {} v{} - {}",
                    health.service, health.version, health.status
                );
                true
            }
            Err(e) => {
                warn!("Relay connectivity test failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, request: &ProbeRequest) -> Result<ProbeResponse> {
        let url = self.resolve(request)?;

        debug!("GET {} ({:?})", url, request.route);

        let send = self
            .client
            .get(url)
            .timeout(request.timeout)
            .header(header::ACCEPT, request.accept)
            .header(header::CACHE_CONTROL, "no-cache")
            .send();

        let response = timeout(request.timeout, send).await.map_err(|_| {
            MonitorError::Timeout(format!(
                "timeout of {}ms exceeded",
                request.timeout.as_millis()
            ))
        })??;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let body = response.bytes().await?;
        Ok(ProbeResponse::new(status.as_u16(), body.to_vec()))
    }
}

fn status_error(status: StatusCode) -> MonitorError {
    MonitorError::Http {
        status: status.as_u16(),
        message: status.canonical_reason().unwrap_or("Unknown status").to_string(),
    }
}

/// Relay health information
#[derive(Debug, Clone)]
pub struct RelayHealth {
    pub status: String,
    pub service: String,
    pub version: String,
}
