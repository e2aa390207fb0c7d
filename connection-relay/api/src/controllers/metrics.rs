use actix_web::{web, HttpResponse, Responder};
use log::info;

use crate::services::monitoring::collect_once;
use crate::state::AppState;

// Get the full sample history, oldest first
pub async fn get_all_metrics(data: web::Data<AppState>) -> impl Responder {
    let metrics = data.monitor.get_metrics().await;
    info!("Returning {} metric samples", metrics.len());

    HttpResponse::Ok().json(metrics)
}

// Get the most recent sample
pub async fn get_latest_metrics(data: web::Data<AppState>) -> impl Responder {
    match data.monitor.latest_metrics().await {
        Some(sample) => HttpResponse::Ok().json(sample),
        None => HttpResponse::NotFound().json("Metrics not yet collected"),
    }
}

// Run an aggregation cycle now and return its sample
pub async fn refresh_metrics(data: web::Data<AppState>) -> impl Responder {
    info!("Request to refresh metrics");
    collect_once(&data.monitor).await;

    match data.monitor.latest_metrics().await {
        Some(sample) => HttpResponse::Ok().json(sample),
        None => HttpResponse::InternalServerError().json("Metrics cycle produced no sample"),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use connection_monitor::EndpointUpdate;
    use serde_json::Value;

    use crate::config::RelayConfig;
    use crate::state::testing::{app_state, routes_with, test_app};

    #[actix_web::test]
    async fn empty_history_before_first_cycle() {
        let app = test::init_service(App::new().configure(test_app(RelayConfig::default()))).await;

        let req = test::TestRequest::get().uri("/api/metrics").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!([]));

        let req = test::TestRequest::get().uri("/api/metrics/latest").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn refresh_with_no_enabled_endpoints_records_poor_sample() {
        let state = app_state(RelayConfig::default());
        for endpoint in state.monitor.get_endpoints().await {
            state
                .monitor
                .update_endpoint(&endpoint.id, EndpointUpdate::enabled(false))
                .await;
        }
        let app = test::init_service(App::new().configure(routes_with(state))).await;

        let req = test::TestRequest::post().uri("/api/metrics/refresh").to_request();
        let sample: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(sample["status"], "poor");
        assert!(sample["latency"].is_null());
        assert!(sample["downloadSpeed"].is_null());

        let req = test::TestRequest::get().uri("/api/metrics").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}
