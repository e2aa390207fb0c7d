//! Endpoint registry data structures

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub id: String,
    pub url: String,
    pub name: String,
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: EndpointKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EndpointStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Which probe applies to an endpoint
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Latency,
    Speed,
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointKind::Latency => write!(f, "latency"),
            EndpointKind::Speed => write!(f, "speed"),
        }
    }
}

/// Outcome of the most recent probe against an endpoint
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    Ok,
    Warning,
    Error,
}

impl std::fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointStatus::Ok => write!(f, "OK"),
            EndpointStatus::Warning => write!(f, "WARNING"),
            EndpointStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Partial update applied by `ConnectionMonitor::update_endpoint`.
///
/// `status` and `last_error` are probe-owned and never read from the wire;
/// the outer `Option` says whether to touch the field, the inner one is the
/// new value.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EndpointUpdate {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default, rename = "type")]
    pub kind: Option<EndpointKind>,
    #[serde(skip)]
    pub status: Option<Option<EndpointStatus>>,
    #[serde(skip)]
    pub last_error: Option<Option<String>>,
}

impl EndpointUpdate {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled: Some(enabled),
            ..Self::default()
        }
    }

    /// Clears probe results before a new measurement
    pub fn in_flight() -> Self {
        Self {
            status: Some(None),
            last_error: Some(None),
            ..Self::default()
        }
    }

    pub fn outcome(status: EndpointStatus, last_error: Option<String>) -> Self {
        Self {
            status: Some(Some(status)),
            last_error: Some(last_error),
            ..Self::default()
        }
    }
}

/// Endpoint definition submitted by an operator, before an id is assigned
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewEndpoint {
    pub url: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: EndpointKind,
}

fn default_enabled() -> bool {
    true
}

impl NewEndpoint {
    pub fn into_config(self) -> EndpointConfig {
        EndpointConfig {
            id: generate_endpoint_id(),
            url: self.url,
            name: self.name,
            enabled: self.enabled,
            kind: self.kind,
            status: None,
            last_error: None,
        }
    }
}

impl EndpointConfig {
    pub fn new(id: &str, url: &str, name: &str, kind: EndpointKind) -> Self {
        Self {
            id: id.to_string(),
            url: url.to_string(),
            name: name.to_string(),
            enabled: true,
            kind,
            status: None,
            last_error: None,
        }
    }

    pub fn apply(&mut self, update: EndpointUpdate) {
        if let Some(url) = update.url {
            self.url = url;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(last_error) = update.last_error {
            self.last_error = last_error;
        }
    }

    pub fn is_probe_target(&self, kind: EndpointKind) -> bool {
        self.enabled && self.kind == kind
    }
}

/// Generate an id for an operator-added endpoint
pub fn generate_endpoint_id() -> String {
    format!("custom-{}", Uuid::new_v4())
}

/// Built-in endpoint set, restored by `reset_endpoints`
pub fn default_endpoints() -> Vec<EndpointConfig> {
    vec![
        EndpointConfig::new("httpbin", "https://httpbin.org/get", "HTTPBin", EndpointKind::Latency),
        EndpointConfig::new(
            "google",
            "https://www.google.com/generate_204",
            "Google",
            EndpointKind::Latency,
        ),
        EndpointConfig::new(
            "cloudflare",
            "https://www.cloudflare.com/cdn-cgi/trace",
            "Cloudflare",
            EndpointKind::Latency,
        ),
        EndpointConfig::new(
            "cloudflare-speedtest",
            "https://speed.cloudflare.com/__down",
            "Cloudflare CDN",
            EndpointKind::Speed,
        ),
        EndpointConfig::new(
            "azure-speedtest",
            "https://azureedge.net/",
            "Azure CDN",
            EndpointKind::Speed,
        ),
        EndpointConfig::new(
            "aws-speedtest",
            "https://d1.awsstatic.com/site-images/aws-logo.svg",
            "AWS CloudFront",
            EndpointKind::Speed,
        ),
    ]
}
