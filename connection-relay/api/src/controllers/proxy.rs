use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, HttpResponseBuilder};
use log::info;

use crate::errors::RelayError;
use crate::models::proxy::{ProxyParams, RelayMode};
use crate::state::AppState;

// GET /api/proxy?url=<target>
pub async fn proxy_get(
    data: web::Data<AppState>,
    params: web::Query<ProxyParams>,
) -> Result<HttpResponse, RelayError> {
    relay(&data, params.into_inner()).await
}

// POST /api/proxy with {"url": "<target>"}
pub async fn proxy_post(
    data: web::Data<AppState>,
    params: web::Json<ProxyParams>,
) -> Result<HttpResponse, RelayError> {
    relay(&data, params.into_inner()).await
}

// Pre-flight for cross-origin callers
pub async fn proxy_options() -> HttpResponse {
    with_cors(HttpResponse::NoContent())
        .insert_header(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
        .insert_header(("Access-Control-Allow-Headers", "Content-Type, Cache-Control, Pragma"))
        .insert_header(("Access-Control-Max-Age", "86400"))
        .finish()
}

async fn relay(data: &AppState, params: ProxyParams) -> Result<HttpResponse, RelayError> {
    let target = data.relay.validate_target(params.url.as_deref())?;
    let mode = params.mode.unwrap_or(data.default_mode);
    info!("Proxy request for {} ({:?})", target, mode);

    let upstream = data.relay.fetch(&target).await?;

    let response = match mode {
        RelayMode::Json => with_cors(HttpResponse::Ok()).json(upstream.into_envelope()),
        RelayMode::Raw => {
            let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::OK);
            let mut builder = with_cors(HttpResponse::build(status));
            if let Some(content_type) = &upstream.content_type {
                builder.content_type(content_type.as_str());
            }
            builder.body(upstream.body)
        }
    };

    Ok(response)
}

fn with_cors(mut builder: HttpResponseBuilder) -> HttpResponseBuilder {
    builder.insert_header(("Access-Control-Allow-Origin", "*"));
    builder
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::Value;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::RelayConfig;
    use crate::state::testing::test_app;

    fn relay_config() -> RelayConfig {
        RelayConfig {
            retry_delay: Duration::from_millis(10),
            ..RelayConfig::default()
        }
    }

    #[actix_web::test]
    async fn missing_url_is_bad_request() {
        let app = test::init_service(App::new().configure(test_app(relay_config()))).await;

        let req = test::TestRequest::get().uri("/api/proxy").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "URL parameter is required");
    }

    #[actix_web::test]
    async fn malformed_url_is_bad_request() {
        let app = test::init_service(App::new().configure(test_app(relay_config()))).await;

        let req = test::TestRequest::get().uri("/api/proxy?url=not%20a%20url").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid URL");
    }

    #[actix_web::test]
    async fn unknown_mode_gets_json_error_envelope() {
        let app = test::init_service(App::new().configure(test_app(relay_config()))).await;

        let req = test::TestRequest::get()
            .uri("/api/proxy?url=https%3A%2F%2Fexample.com&mode=bogus")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
        assert!(resp
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("application/json"));

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid request");
        assert!(body["details"].as_str().unwrap().contains("bogus"));
    }

    #[actix_web::test]
    async fn malformed_post_body_gets_json_error_envelope() {
        let app = test::init_service(App::new().configure(test_app(relay_config()))).await;

        let req = test::TestRequest::post()
            .uri("/api/proxy")
            .insert_header(("content-type", "application/json"))
            .set_payload("{\"url\": ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid request");
        assert!(!body["details"].as_str().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn disallowed_domain_is_forbidden() {
        let config = RelayConfig {
            allowed_domains: Some(vec!["api.github.com".to_string()]),
            ..relay_config()
        };
        let app = test::init_service(App::new().configure(test_app(config))).await;

        let req = test::TestRequest::get()
            .uri("/api/proxy?url=https%3A%2F%2Fexample.com%2F")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Domain not allowed");
    }

    #[actix_web::test]
    async fn wraps_upstream_response_in_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"hello": "world"})))
            .mount(&server)
            .await;

        let app = test::init_service(App::new().configure(test_app(relay_config()))).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/proxy?url={}/data", server.uri()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["hello"], "world");
        assert_eq!(body["status"], 200);
        assert!(body["headers"]["content-type"].as_str().unwrap().contains("json"));
    }

    #[actix_web::test]
    async fn client_errors_are_passed_back_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .expect(1)
            .mount(&server)
            .await;

        let app = test::init_service(App::new().configure(test_app(relay_config()))).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/proxy?url={}/gone", server.uri()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 404);
        assert_eq!(body["data"], "not here");
    }

    #[actix_web::test]
    async fn raw_mode_passes_body_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/svg+xml")
                    .set_body_bytes(b"<svg/>".to_vec()),
            )
            .mount(&server)
            .await;

        let app = test::init_service(App::new().configure(test_app(relay_config()))).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/proxy?mode=raw&url={}/logo.svg", server.uri()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers().get("content-type").unwrap(), "image/svg+xml");

        let body = test::read_body(resp).await;
        assert_eq!(&body[..], b"<svg/>");
    }

    #[actix_web::test]
    async fn post_body_selects_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .mount(&server)
            .await;

        let app = test::init_service(App::new().configure(test_app(relay_config()))).await;

        let req = test::TestRequest::post()
            .uri("/api/proxy")
            .set_json(serde_json::json!({ "url": server.uri() }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"], "pong");

        let req = test::TestRequest::post()
            .uri("/api/proxy")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn exhausted_retries_return_error_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let app = test::init_service(App::new().configure(test_app(relay_config()))).await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/proxy?url={}/flaky", server.uri()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Request failed");
        assert!(body["details"].as_str().unwrap().contains("502"));
        assert_eq!(body["code"], "ERR_BAD_RESPONSE");
    }

    #[actix_web::test]
    async fn unreachable_target_reports_last_error() {
        let app = test::init_service(App::new().configure(test_app(relay_config()))).await;

        let req = test::TestRequest::get()
            .uri("/api/proxy?url=http%3A%2F%2F127.0.0.1%3A1%2F")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);

        let body: Value = test::read_body_json(resp).await;
        assert!(!body["details"].as_str().unwrap().is_empty());
        assert_eq!(body["code"], "ERR_NETWORK");
    }

    #[actix_web::test]
    async fn preflight_is_no_content_with_cors() {
        let app = test::init_service(App::new().configure(test_app(relay_config()))).await;

        let req = test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/proxy")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 204);
        assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
        assert!(resp
            .headers()
            .get("access-control-allow-methods")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("GET"));

        let body = test::read_body(resp).await;
        assert!(body.is_empty());
    }
}
