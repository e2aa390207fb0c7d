//! Connection Monitor Binary

use clap::Parser;
use connection_monitor::{Config, MonitorRunner, Result};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Periodically probe endpoints and log connection quality
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Base URL of the fetch relay
    #[arg(long, env = "RELAY_URL")]
    relay_url: Option<String>,

    /// Probe endpoints directly without relay fallback
    #[arg(long)]
    no_proxy: bool,

    /// Seconds between aggregation cycles
    #[arg(long, env = "UPDATE_INTERVAL_SECONDS")]
    interval: Option<u64>,

    /// Extra attempts per probe after a failure
    #[arg(long, env = "RETRY_ATTEMPTS")]
    retries: Option<u32>,
}

impl Cli {
    fn apply(self, mut config: Config) -> Config {
        if let Some(relay_url) = self.relay_url {
            config.relay_url = relay_url.trim_end_matches('/').to_string();
        }
        if self.no_proxy {
            config.use_proxy = false;
        }
        if let Some(seconds) = self.interval {
            config.update_interval = Duration::from_secs(seconds);
        }
        if let Some(retries) = self.retries {
            config.retry_attempts = retries;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing();

    info!("Starting Connection Monitor v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.apply(Config::from_env());

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    info!(
        "Monitor configuration - Relay: {}, Proxy: {}, Interval: {}s, History: {} samples",
        config.relay_url,
        config.use_proxy,
        config.update_interval.as_secs(),
        config.max_data_points
    );

    let runner = MonitorRunner::new(config)?;

    if let Err(e) = runner.start().await {
        error!("Monitor failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
