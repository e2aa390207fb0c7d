use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use connection_monitor::metrics::{format_latency, format_speed};
use connection_monitor::ConnectionMonitor;
use log::info;
use tokio::time::{interval, MissedTickBehavior};

use crate::state::AppState;

// Run one aggregation cycle and log its sample
pub async fn collect_once(monitor: &ConnectionMonitor) {
    monitor.update_metrics().await;

    if let Some(sample) = monitor.latest_metrics().await {
        info!(
            "Connection {}: latency {}, download {}",
            sample.status,
            format_latency(sample.latency),
            format_speed(sample.download_speed)
        );
    }
}

// Timer driving the dashboard; each tick starts a cycle without waiting
// for the previous one
pub async fn metrics_collector(data: web::Data<AppState>, every: Duration) {
    info!(
        "Starting metrics collector background task ({}s interval)",
        every.as_secs()
    );

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let monitor: Arc<ConnectionMonitor> = Arc::clone(&data.monitor);
        tokio::spawn(async move {
            collect_once(&monitor).await;
        });
    }
}
