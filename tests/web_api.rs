use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use cellguard::{
    config::{DashboardConfig, Preset},
    web::{router, AppState},
};
use serde_json::Value;
use tower::ServiceExt;

fn app(preset: Preset) -> Router {
    let state = AppState::new(DashboardConfig::preset(preset), Some(7)).expect("valid preset");
    router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[test]
fn oversized_idle_timeout_fails_to_start() {
    let mut config = DashboardConfig::preset(Preset::BlockSelector);
    config.server.session_idle_minutes = i64::MAX;
    assert!(AppState::new(config, Some(1)).is_err());
}

#[tokio::test]
async fn serves_the_page_and_assets() {
    let app = app(Preset::CommandCenter);
    for uri in ["/", "/styles.css", "/app.js"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn config_describes_the_controls() {
    let (status, body) = send(&app(Preset::BlockSelector), Method::GET, "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preset"], "block-selector");
    assert_eq!(body["years"]["max"], 10);
    assert_eq!(body["temperature"]["default"], 25);
    assert_eq!(body["blocks"].as_array().unwrap().len(), 30);
    assert_eq!(body["alerts"], true);

    let (_, body) = send(&app(Preset::CommandCenter), Method::GET, "/api/config").await;
    assert_eq!(body["years"]["max"], 9);
    assert!(body["blocks"].is_null());
}

#[tokio::test]
async fn render_uses_defaults_and_opens_a_session() {
    let (status, body) = send(&app(Preset::CommandCenter), Method::GET, "/api/render").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["session"].is_string());
    assert_eq!(body["frame"]["metrics"]["health"]["value"], "92.0%");
    assert_eq!(body["frame"]["metrics"]["risk"]["value"], "Rs1,240");
}

#[tokio::test]
async fn out_of_range_input_is_a_bad_request() {
    let app = app(Preset::CommandCenter);
    let (status, body) = send(&app, Method::GET, "/api/render?temp=55").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("temperature"));

    let (status, _) = send(&app, Method::GET, "/api/render?years=10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/render?block=Block_3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/api/render?temp=40&years=9&cost=1e308").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("risk"));
}

#[tokio::test]
async fn alerts_fire_once_per_session() {
    let app = app(Preset::BlockSelector);
    let warning = "/api/render?temp=30&years=3&cost=500";

    let (status, first) = send(&app, Method::GET, warning).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["frame"]["notification"]["status"], "WARNING");
    let session = first["session"].as_str().unwrap().to_string();

    let (_, repeat) = send(&app, Method::GET, &format!("{warning}&session={session}")).await;
    assert!(repeat["frame"]["notification"].is_null());

    let (_, other) = send(&app, Method::GET, warning).await;
    assert_eq!(other["frame"]["notification"]["status"], "WARNING");

    let (_, critical) = send(
        &app,
        Method::GET,
        &format!("/api/render?temp=40&years=3&block=Block_9&session={session}"),
    )
    .await;
    assert_eq!(critical["frame"]["notification"]["status"], "CRITICAL");
    assert_eq!(critical["frame"]["input"]["block"], "Block_9");
}

#[tokio::test]
async fn ending_a_session_forgets_its_alerts() {
    let app = app(Preset::BlockSelector);
    let (_, first) = send(&app, Method::GET, "/api/render?temp=40&years=3").await;
    let session = first["session"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::DELETE, &format!("/api/session/{session}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &format!("/api/session/{session}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, again) = send(
        &app,
        Method::GET,
        &format!("/api/render?temp=40&years=3&session={session}"),
    )
    .await;
    assert_eq!(again["frame"]["notification"]["status"], "CRITICAL");
}
