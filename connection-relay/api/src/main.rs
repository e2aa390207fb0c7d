use std::env;
use std::sync::Arc;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use connection_monitor::{Config, ConnectionMonitor};
use dotenv::dotenv;
use log::{error, info};

mod config;
mod controllers;
mod errors;
mod models;
mod services;
mod state;

use config::RelayConfig;
use services::monitoring::metrics_collector;
use services::relay::RelayClient;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let relay_config = RelayConfig::from_env();

    // The dashboard monitor talks to this relay unless pointed elsewhere
    let mut monitor_config = Config::from_env();
    if env::var("RELAY_URL").is_err() {
        monitor_config.relay_url = relay_config.self_url();
    }
    if let Err(e) = monitor_config.validate() {
        error!("Invalid monitor configuration: {}", e);
        return Err(std::io::Error::other(e));
    }

    let monitor = ConnectionMonitor::from_config(&monitor_config).map_err(|e| {
        error!("Failed to create connection monitor: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let relay = RelayClient::new(&relay_config).map_err(|e| {
        error!("Failed to create relay client: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let data = web::Data::new(AppState {
        monitor: Arc::new(monitor),
        relay,
        default_mode: relay_config.mode,
    });

    actix_web::rt::spawn(metrics_collector(data.clone(), relay_config.update_interval));

    info!(
        "Server is live at http://{}:{}",
        relay_config.host, relay_config.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(data.clone())
            .configure(controllers::configure)
    })
    .bind((relay_config.host.clone(), relay_config.port))?
    .run()
    .await
}
