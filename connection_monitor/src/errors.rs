//! Error types for the connection monitor

use std::fmt;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug)]
pub enum MonitorError {
    /// Connection could not be made (DNS, refused, reset, cross-origin block)
    Network(String),

    /// Request did not complete within its deadline
    Timeout(String),

    /// Server answered with a status the caller does not accept
    Http { status: u16, message: String },

    /// The relay answered with an error envelope
    Relay(String),

    /// JSON serialization/deserialization failed
    Json(serde_json::Error),

    /// Configuration error
    Config(String),

    /// Generic error with message
    Other(String),
}

/// Coarse classification of a failure, used to decide routing and retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Timeout,
    Http,
    Other,
}

impl MonitorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MonitorError::Network(_) => ErrorKind::Network,
            MonitorError::Timeout(_) => ErrorKind::Timeout,
            MonitorError::Http { .. } => ErrorKind::Http,
            _ => ErrorKind::Other,
        }
    }

    /// Whether a direct request failed in a way the relay can work around.
    ///
    /// Errors carried as plain text (for example an error envelope relayed
    /// from elsewhere) still qualify when they mention a CORS or network
    /// failure.
    pub fn is_cross_origin_or_network(&self) -> bool {
        if self.kind() == ErrorKind::Network {
            return true;
        }

        let message = self.message();
        message.contains("CORS") || message.contains("Network Error")
    }

    /// Human-readable message without the category prefix
    pub fn message(&self) -> String {
        match self {
            MonitorError::Network(msg)
            | MonitorError::Timeout(msg)
            | MonitorError::Relay(msg)
            | MonitorError::Config(msg)
            | MonitorError::Other(msg) => msg.clone(),
            MonitorError::Http { message, .. } => message.clone(),
            MonitorError::Json(err) => err.to_string(),
        }
    }
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Network(msg) => write!(f, "Network Error: {}", msg),
            MonitorError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            MonitorError::Http { status, message } => {
                write!(f, "Request failed with status code {}: {}", status, message)
            }
            MonitorError::Relay(msg) => write!(f, "Relay error: {}", msg),
            MonitorError::Json(err) => write!(f, "JSON error: {}", err),
            MonitorError::Config(msg) => write!(f, "Configuration error: {}", msg),
            MonitorError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for MonitorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MonitorError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return MonitorError::Timeout(err.to_string());
        }

        if let Some(status) = err.status() {
            return MonitorError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }

        if err.is_connect() || err.is_request() || err.is_redirect() {
            return MonitorError::Network(err.to_string());
        }

        MonitorError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::Json(err)
    }
}
