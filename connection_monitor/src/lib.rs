//! Connection Monitor Library
//!
//! Probes a configurable set of endpoints for latency and download speed,
//! optionally through a fetch relay, and keeps a bounded history of
//! aggregated connection samples.

pub mod config;
pub mod endpoint;
pub mod errors;
pub mod history;
pub mod metrics;
pub mod monitor;
pub mod retry;
pub mod runner;
pub mod transport;

pub use config::{Config, MonitorConfig, MonitorConfigUpdate};
pub use endpoint::{EndpointConfig, EndpointKind, EndpointStatus, EndpointUpdate, NewEndpoint};
pub use errors::{ErrorKind, MonitorError, Result};
pub use metrics::{ConnectionMetrics, ConnectionStatus};
pub use monitor::{ConnectionMonitor, EndpointProbe};
pub use retry::RetryPolicy;
pub use runner::MonitorRunner;
pub use transport::{Fetcher, HttpFetcher, ProbeRequest, ProbeResponse, Route};
