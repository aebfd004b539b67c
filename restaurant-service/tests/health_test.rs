mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "restaurant-service");
}

#[tokio::test]
async fn readiness_check_works() {
    let app = TestApp::spawn().await;

    let (status, _) = app.get("/ready").await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn metrics_endpoint_responds_after_traffic() {
    let app = TestApp::spawn().await;
    app.seed_food("F1", "2.00").await;
    app.place_order(serde_json::json!([{ "food_id": "F1", "quantity": 1 }]))
        .await;

    let response = app.get("/metrics").await;

    assert_eq!(response.0, StatusCode::OK);
}
