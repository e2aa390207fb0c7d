use actix_web::{web, HttpResponse, Responder};
use connection_monitor::MonitorConfigUpdate;
use log::info;

use crate::state::AppState;

pub async fn get_config(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(data.monitor.get_config().await)
}

// Merge the provided fields into the monitor's runtime config
pub async fn update_config(
    data: web::Data<AppState>,
    update: web::Json<MonitorConfigUpdate>,
) -> impl Responder {
    let update = update.into_inner();
    info!("Request to update monitor config: {:?}", update);

    data.monitor.update_config(update).await;

    HttpResponse::Ok().json(data.monitor.get_config().await)
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::{json, Value};

    use crate::config::RelayConfig;
    use crate::state::testing::test_app;

    #[actix_web::test]
    async fn reads_and_patches_config() {
        let app = test::init_service(App::new().configure(test_app(RelayConfig::default()))).await;

        let req = test::TestRequest::get().uri("/api/config").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "useProxy": true }));

        let req = test::TestRequest::patch()
            .uri("/api/config")
            .set_json(json!({ "useProxy": false }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "useProxy": false }));

        let req = test::TestRequest::patch()
            .uri("/api/config")
            .set_json(json!({}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "useProxy": false }));
    }
}
