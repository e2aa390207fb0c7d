use actix_web::{web, HttpResponse, Responder};
use connection_monitor::{EndpointUpdate, NewEndpoint};
use log::info;
use serde_json::json;

use crate::state::AppState;

// List all configured endpoints with their latest probe status
pub async fn list_endpoints(data: web::Data<AppState>) -> impl Responder {
    let endpoints = data.monitor.get_endpoints().await;
    info!("Returning list of {} endpoints", endpoints.len());

    HttpResponse::Ok().json(endpoints)
}

// Register a new endpoint to probe
pub async fn add_endpoint(
    data: web::Data<AppState>,
    endpoint: web::Json<NewEndpoint>,
) -> impl Responder {
    let endpoint = endpoint.into_inner();
    info!("Request to add {} endpoint: {}", endpoint.kind, endpoint.name);

    if reqwest::Url::parse(&endpoint.url).is_err() {
        return HttpResponse::BadRequest().json(json!({ "error": "Invalid URL" }));
    }

    let config = endpoint.into_config();
    if !data.monitor.add_endpoint(config.clone()).await {
        return HttpResponse::Conflict().json(json!({
            "error": format!("Endpoint already exists: {}", config.id)
        }));
    }

    HttpResponse::Created().json(config)
}

// Partially update an endpoint; unknown ids are left alone
pub async fn update_endpoint(
    data: web::Data<AppState>,
    id: web::Path<String>,
    update: web::Json<EndpointUpdate>,
) -> impl Responder {
    let id = id.into_inner();
    info!("Request to update endpoint: {}", id);

    data.monitor.update_endpoint(&id, update.into_inner()).await;

    HttpResponse::Ok().json(data.monitor.get_endpoints().await)
}

// Discard customizations and restore the built-in endpoint set
pub async fn reset_endpoints(data: web::Data<AppState>) -> impl Responder {
    info!("Request to reset endpoints");
    data.monitor.reset_endpoints().await;

    HttpResponse::Ok().json(data.monitor.get_endpoints().await)
}

// Probe a single endpoint now
pub async fn probe_endpoint(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> impl Responder {
    let id = id.into_inner();
    info!("Request to probe endpoint: {}", id);

    match data.monitor.probe_endpoint(&id).await {
        Some(probe) => HttpResponse::Ok().json(probe),
        None => HttpResponse::NotFound().json(json!({
            "error": format!("Endpoint not found: {}", id)
        })),
    }
}
