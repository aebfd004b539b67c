//! Shared helpers for restaurant-service integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use restaurant_service::models::Food;
use restaurant_service::services::{InMemoryStore, UpdateMode};
use restaurant_service::startup::{router, AppState, Stores};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const TEST_TABLE_ID: &str = "table-7";

pub struct TestApp {
    pub store: Arc<InMemoryStore>,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(Duration::from_secs(100), UpdateMode::Upsert).await
    }

    pub async fn spawn_with(request_timeout: Duration, update_mode: UpdateMode) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(
            Stores::in_memory(store.clone()),
            request_timeout,
            update_mode,
        );
        Self { store, state }
    }

    pub async fn seed_food(&self, id: &str, price: &str) {
        self.store
            .seed_food(Food::new(id, price.parse().expect("valid price")))
            .await
            .expect("Failed to seed food");
    }

    /// Send one request through the router and decode the JSON body, if any.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");

        let request = match body {
            Some(json) => request.body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = router(self.state.clone())
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Place a batch and return the created order items.
    pub async fn place_order(&self, lines: Value) -> Vec<Value> {
        let (status, body) = self
            .post(
                "/orderItems",
                serde_json::json!({ "table_id": TEST_TABLE_ID, "order_items": lines }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
        body.as_array().expect("array of order items").clone()
    }
}

/// Decimal field of a JSON record, compared by value rather than scale.
pub fn decimal(value: &Value, field: &str) -> rust_decimal::Decimal {
    value[field]
        .as_str()
        .unwrap_or_else(|| panic!("{} should be a decimal string in {}", field, value))
        .parse()
        .expect("valid decimal")
}

pub fn dec(value: &str) -> rust_decimal::Decimal {
    value.parse().expect("valid decimal")
}
