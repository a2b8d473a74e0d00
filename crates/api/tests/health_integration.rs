//! Integration tests for the health, readiness and metrics endpoints.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{get_request, parse_response_body, TestApp};

#[tokio::test]
async fn test_health_check_reports_memory_backend() {
    let app = TestApp::new();

    let response = app.send(get_request("/api/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["database"]["backend"], "memory");
    assert_eq!(body["database"]["connected"], true);
    assert_eq!(body["scheduler_running"], false);
}

#[tokio::test]
async fn test_health_reflects_running_scheduler() {
    let app = TestApp::new();
    assert!(app.state.scheduler.start());

    let body = parse_response_body(app.send(get_request("/api/health")).await).await;
    assert_eq!(body["scheduler_running"], true);

    assert!(app.state.scheduler.stop());
}

#[tokio::test]
async fn test_liveness_and_readiness() {
    let app = TestApp::new();

    let response = app.send(get_request("/api/health/live")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["status"], "alive");

    let response = app.send(get_request("/api/health/ready")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["status"], "ready");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/api/health/live")
        .header("x-request-id", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_metrics_unavailable_without_recorder() {
    let app = TestApp::new();

    let response = app.send(get_request("/metrics")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new();

    let response = app.send(get_request("/api/v1/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
