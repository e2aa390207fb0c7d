use std::collections::BTreeMap;

use connection_monitor::{ErrorKind, MonitorError, RetryPolicy};
use log::{error, info};
use reqwest::{Client as HttpClient, Url, header};

use crate::config::RelayConfig;
use crate::errors::RelayError;
use crate::models::proxy::UpstreamResponse;

const USER_AGENT: &str = "Connection-Monitor/1.0";
const ACCEPT: &str = "application/json, text/plain, */*";

// Outbound side of the proxy: validation, fetch and retry
#[derive(Debug, Clone)]
pub struct RelayClient {
    http_client: HttpClient,
    allowed_domains: Option<Vec<String>>,
    retry: RetryPolicy,
}

impl RelayClient {
    pub fn new(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http_client,
            allowed_domains: config.allowed_domains.clone(),
            retry: config.retry_policy(),
        })
    }

    // Check the requested target before any network traffic
    pub fn validate_target(&self, raw: Option<&str>) -> Result<Url, RelayError> {
        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(RelayError::MissingUrl),
        };

        let url = Url::parse(raw).map_err(|_| RelayError::InvalidUrl)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RelayError::InvalidUrl);
        }

        let host = url.host_str().ok_or(RelayError::InvalidUrl)?.to_lowercase();
        if let Some(allowed) = &self.allowed_domains {
            if !allowed.iter().any(|domain| *domain == host) {
                return Err(RelayError::DomainNotAllowed(host));
            }
        }

        Ok(url)
    }

    // GET the target, retrying transient failures
    pub async fn fetch(&self, target: &Url) -> Result<UpstreamResponse, RelayError> {
        let label = format!("Proxy request to {}", target);

        match self.retry.run(&label, |_| self.fetch_once(target)).await {
            Ok(response) => {
                info!("Proxied {} -> {}", target, response.status);
                Ok(response)
            }
            Err(e) => {
                error!("Proxy request failed: {}", e);
                Err(RelayError::Upstream {
                    message: e.to_string(),
                    code: error_code(&e).to_string(),
                })
            }
        }
    }

    async fn fetch_once(&self, target: &Url) -> Result<UpstreamResponse, MonitorError> {
        let response = self
            .http_client
            .get(target.clone())
            .header(header::ACCEPT, ACCEPT)
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await?;

        let status = response.status();
        // anything below 500 goes back to the caller as-is
        if status.is_server_error() {
            return Err(MonitorError::Http {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Server error").to_string(),
            });
        }

        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let content_type = headers.get(header::CONTENT_TYPE.as_str()).cloned();
        let body = response.bytes().await?.to_vec();

        Ok(UpstreamResponse {
            status: status.as_u16(),
            headers,
            content_type,
            body,
        })
    }
}

// Short machine-readable code for the error envelope
pub fn error_code(err: &MonitorError) -> &'static str {
    match err.kind() {
        ErrorKind::Timeout => "ECONNABORTED",
        ErrorKind::Network => "ERR_NETWORK",
        ErrorKind::Http => "ERR_BAD_RESPONSE",
        ErrorKind::Other => "ERR_UNKNOWN",
    }
}
