use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// How a successful upstream response is handed back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    // JSON envelope with decoded body, status and headers
    Json,
    // Upstream status, content type and body bytes passed through
    Raw,
}

impl FromStr for RelayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(RelayMode::Json),
            "raw" => Ok(RelayMode::Raw),
            other => Err(format!("Unknown relay mode: {}", other)),
        }
    }
}

// Target selection, from the query string or a JSON body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProxyParams {
    pub url: Option<String>,
    pub mode: Option<RelayMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyEnvelope {
    pub data: Value,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
            details: None,
            code: None,
        }
    }
}

// Response as received from the target
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl UpstreamResponse {
    // JSON body when it parses, body text otherwise
    pub fn decoded_body(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&self.body).into_owned()))
    }

    pub fn into_envelope(self) -> ProxyEnvelope {
        ProxyEnvelope {
            data: self.decoded_body(),
            status: self.status,
            headers: self.headers,
        }
    }
}
