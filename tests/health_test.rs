mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};

use common::TestApp;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_when_store_is_reachable() {
    let app = TestApp::new();
    let (status, _, body) = app.send(get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["environment"], "production");
    assert_eq!(body["database"]["status"], "healthy");
    assert_eq!(body["database"]["message"], "Database connection is active");
    assert!(body["uptime"].is_number());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_when_store_is_unreachable() {
    let app = TestApp::builder().store_down().build();
    let (status, _, body) = app.send(get("/health")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["database"]["status"], "unhealthy");
    assert_eq!(body["database"]["message"], "Database connection failed");
    assert!(body["database"]["error"].is_string());
}

#[tokio::test]
async fn test_root_banner() {
    let app = TestApp::new();
    let (status, _, body) = app.send(get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "BCM Group Backend API is running!");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new();
    let (status, _, body) = app.send(get("/api/projects")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route /api/projects not found");
    let routes = body["availableRoutes"].as_array().unwrap();
    assert!(routes.iter().any(|r| r == "POST /api/enquiry/submit"));
    assert!(routes.iter().any(|r| r == "GET /health"));
}

#[tokio::test]
async fn test_cors_preflight_for_allowed_origin() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/contact/submit")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
}
