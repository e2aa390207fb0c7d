use std::env;
use std::time::Duration;

use connection_monitor::RetryPolicy;
use log::warn;

use crate::models::proxy::RelayMode;

// Relay server settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub allowed_domains: Option<Vec<String>>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub mode: RelayMode,
    pub update_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_domains: None,
            timeout: Duration::from_secs(5),
            max_retries: 2,
            retry_delay: Duration::from_millis(1000),
            mode: RelayMode::Json,
            update_interval: Duration::from_secs(5),
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        let mut config = RelayConfig::default();

        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!("Ignoring invalid PORT value: {}", port),
            }
        }

        if let Ok(domains) = env::var("ALLOWED_DOMAINS") {
            config.allowed_domains = parse_domains(&domains);
        }

        if let Ok(timeout) = env::var("RELAY_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.timeout = Duration::from_secs(seconds.clamp(5, 10));
            }
        }

        if let Ok(retries) = env::var("RELAY_MAX_RETRIES") {
            if let Ok(retries) = retries.parse() {
                config.max_retries = retries;
            }
        }

        if let Ok(delay) = env::var("RELAY_RETRY_DELAY_MS") {
            if let Ok(ms) = delay.parse::<u64>() {
                config.retry_delay = Duration::from_millis(ms);
            }
        }

        if let Ok(mode) = env::var("RELAY_MODE") {
            match mode.parse() {
                Ok(mode) => config.mode = mode,
                Err(e) => warn!("{}", e),
            }
        }

        if let Ok(interval) = env::var("UPDATE_INTERVAL_SECONDS") {
            if let Ok(seconds) = interval.parse::<u64>() {
                config.update_interval = Duration::from_secs(seconds.max(1));
            }
        }

        config
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_delay)
    }

    // Address the embedded monitor uses to reach this relay
    pub fn self_url(&self) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" | "::" | "" => "127.0.0.1",
            host => host,
        };
        format!("http://{}:{}", host, self.port)
    }
}

// Comma-separated hostnames; an empty list disables the allow-list
fn parse_domains(raw: &str) -> Option<Vec<String>> {
    let domains: Vec<String> = raw
        .split(',')
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect();

    if domains.is_empty() { None } else { Some(domains) }
}
