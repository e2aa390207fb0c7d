pub mod endpoints;
pub mod metrics;
pub mod proxy;
pub mod settings;

use std::fmt::Display;

use actix_web::web;

use crate::errors::RelayError;
use crate::services::health::health_check;

// Unreadable proxy input still gets the JSON envelope and CORS header
fn bad_request(err: impl Display) -> actix_web::Error {
    RelayError::BadRequest(err.to_string()).into()
}

// Route table shared by the server and the handler tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .service(
            web::resource("/api/proxy")
                .app_data(web::QueryConfig::default().error_handler(|err, _| bad_request(err)))
                .app_data(web::JsonConfig::default().error_handler(|err, _| bad_request(err)))
                .route(web::get().to(proxy::proxy_get))
                .route(web::post().to(proxy::proxy_post))
                .route(web::method(actix_web::http::Method::OPTIONS).to(proxy::proxy_options)),
        )
        .route("/api/metrics", web::get().to(metrics::get_all_metrics))
        .route("/api/metrics/latest", web::get().to(metrics::get_latest_metrics))
        .route("/api/metrics/refresh", web::post().to(metrics::refresh_metrics))
        .route("/api/endpoints", web::get().to(endpoints::list_endpoints))
        .route("/api/endpoints", web::post().to(endpoints::add_endpoint))
        // literal path before the {id} pattern
        .route("/api/endpoints/reset", web::post().to(endpoints::reset_endpoints))
        .route("/api/endpoints/{id}", web::patch().to(endpoints::update_endpoint))
        .route("/api/endpoints/{id}/probe", web::post().to(endpoints::probe_endpoint))
        .route("/api/config", web::get().to(settings::get_config))
        .route("/api/config", web::patch().to(settings::update_config));
}
