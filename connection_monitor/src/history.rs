//! In-memory ring buffer of aggregated samples

use crate::metrics::ConnectionMetrics;
use std::collections::VecDeque;
use tokio::sync::RwLock;
use tracing::debug;

/// Bounded, oldest-first history of connection samples
#[derive(Debug)]
pub struct MetricsHistory {
    samples: RwLock<VecDeque<ConnectionMetrics>>,
    max_size: usize,
}

impl MetricsHistory {
    pub fn new(max_size: usize) -> Self {
        Self {
            samples: RwLock::new(VecDeque::with_capacity(max_size)),
            max_size,
        }
    }

    /// Append a sample, evicting the oldest once the cap is reached
    pub async fn push(&self, sample: ConnectionMetrics) {
        let mut samples = self.samples.write().await;

        if samples.len() >= self.max_size {
            samples.pop_front();
            debug!("Metrics history full, dropping oldest sample");
        }

        samples.push_back(sample);
    }

    /// Copy of every stored sample, oldest first
    pub async fn snapshot(&self) -> Vec<ConnectionMetrics> {
        self.samples.read().await.iter().cloned().collect()
    }

    pub async fn latest(&self) -> Option<ConnectionMetrics> {
        self.samples.read().await.back().cloned()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }
}
