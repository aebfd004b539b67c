//! Order item integration tests for restaurant-service.

mod common;

use axum::http::StatusCode;
use common::{dec, decimal, TestApp, TEST_TABLE_ID};
use restaurant_service::services::UpdateMode;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn create_order_items_prices_each_line() {
    let app = TestApp::spawn().await;
    app.seed_food("F1", "12.345").await;

    let items = app
        .place_order(json!([{ "food_id": "F1", "quantity": 3 }]))
        .await;

    assert_eq!(items.len(), 1);
    assert_eq!(decimal(&items[0], "unit_price"), dec("12.35"));
    assert_eq!(decimal(&items[0], "amount"), dec("37.05"));
    assert_eq!(items[0]["food_id"], "F1");
    assert_eq!(items[0]["created_at"], items[0]["updated_at"]);
}

#[tokio::test]
async fn batch_keeps_input_order_under_one_order() {
    let app = TestApp::spawn().await;
    app.seed_food("F1", "4.00").await;
    app.seed_food("F2", "6.50").await;
    app.seed_food("F3", "1.25").await;

    let items = app
        .place_order(json!([
            { "food_id": "F3", "quantity": 1 },
            { "food_id": "F1", "quantity": 2 },
            { "food_id": "F2", "quantity": 1 },
            { "food_id": "F1", "quantity": 1 }
        ]))
        .await;

    let food_ids: Vec<&str> = items.iter().map(|i| i["food_id"].as_str().unwrap()).collect();
    assert_eq!(food_ids, ["F3", "F1", "F2", "F1"]);

    let order_id = items[0]["order_id"].as_str().unwrap();
    assert!(items.iter().all(|i| i["order_id"] == order_id));

    let orders = app.store.orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order_id);
    assert_eq!(orders[0].table_id.as_deref(), Some(TEST_TABLE_ID));

    let (status, stored) = app.get(&format!("/orderItems-order/{}", order_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored.as_array().unwrap(), &items);
}

#[tokio::test]
async fn invalid_line_rejects_whole_batch() {
    let app = TestApp::spawn().await;
    app.seed_food("F1", "5.00").await;

    let (status, body) = app
        .post(
            "/orderItems",
            json!({
                "table_id": TEST_TABLE_ID,
                "order_items": [
                    { "food_id": "F1", "quantity": 1 },
                    { "quantity": 2 },
                    { "food_id": "F1", "quantity": 1 }
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Validation error");

    let (_, all) = app.get("/orderItems").await;
    assert!(all.as_array().unwrap().is_empty());
    assert!(app.store.orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_positive_quantity_rejects_whole_batch() {
    let app = TestApp::spawn().await;
    app.seed_food("F1", "5.00").await;

    let (status, _) = app
        .post(
            "/orderItems",
            json!({
                "order_items": [
                    { "food_id": "F1", "quantity": 1 },
                    { "food_id": "F1", "quantity": 0 }
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (_, all) = app.get("/orderItems").await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .post("/orderItems", json!({ "table_id": TEST_TABLE_ID, "order_items": [] }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.store.orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_food_prices_at_zero() {
    let app = TestApp::spawn().await;

    let items = app
        .place_order(json!([{ "food_id": "ghost", "quantity": 2 }]))
        .await;

    assert_eq!(decimal(&items[0], "unit_price"), dec("0"));
    assert_eq!(decimal(&items[0], "amount"), dec("0"));
}

#[tokio::test]
async fn failed_item_insert_leaves_order_behind() {
    let app = TestApp::spawn().await;
    app.seed_food("F1", "5.00").await;
    app.store.fail_order_item_inserts(true);

    let (status, body) = app
        .post(
            "/orderItems",
            json!({ "table_id": TEST_TABLE_ID, "order_items": [{ "food_id": "F1", "quantity": 1 }] }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Database error");
    // Separate writes: the order stays even though its items were not stored.
    assert_eq!(app.store.orders().await.unwrap().len(), 1);
    let (_, all) = app.get("/orderItems").await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn get_order_item_by_id() {
    let app = TestApp::spawn().await;
    app.seed_food("F1", "3.10").await;
    let items = app
        .place_order(json!([{ "food_id": "F1", "quantity": 2 }]))
        .await;
    let id = items[0]["id"].as_str().unwrap();

    let (status, item) = app.get(&format!("/orderItems/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item, items[0]);

    let (status, _) = app.get("/orderItems/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_sets_only_supplied_fields() {
    let app = TestApp::spawn().await;
    app.seed_food("F1", "8.00").await;
    let items = app
        .place_order(json!([{ "food_id": "F1", "quantity": 2 }]))
        .await;
    let id = items[0]["id"].as_str().unwrap();

    let (status, outcome) = app
        .patch(&format!("/orderItems/{}", id), json!({ "quantity": 5 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["matched_count"], 1);

    let (_, item) = app.get(&format!("/orderItems/{}", id)).await;
    assert_eq!(decimal(&item, "quantity"), dec("5"));
    assert_eq!(decimal(&item, "unit_price"), dec("8.00"));
    // amount is not recomputed by a patch
    assert_eq!(decimal(&item, "amount"), dec("16.00"));
    assert_eq!(item["food_id"], "F1");
    assert_eq!(item["order_id"], items[0]["order_id"]);
    assert_eq!(item["created_at"], items[0]["created_at"]);
}

#[tokio::test]
async fn patch_rejects_invalid_values() {
    let app = TestApp::spawn().await;
    app.seed_food("F1", "8.00").await;
    let items = app
        .place_order(json!([{ "food_id": "F1", "quantity": 2 }]))
        .await;
    let id = items[0]["id"].as_str().unwrap();

    let (status, _) = app
        .patch(&format!("/orderItems/{}", id), json!({ "quantity": -1 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, item) = app.get(&format!("/orderItems/{}", id)).await;
    assert_eq!(decimal(&item, "quantity"), dec("2"));
}

#[tokio::test]
async fn patch_on_missing_item_upserts_minimal_record() {
    let app = TestApp::spawn().await;

    let (status, outcome) = app
        .patch("/orderItems/new-item", json!({ "quantity": 4 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["upserted_id"], "new-item");

    let stored = app.store.raw_order_item("new-item").await.unwrap();
    let keys: Vec<&str> = stored.keys().map(String::as_str).collect();
    assert_eq!(keys, ["id", "quantity", "updated_at"]);

    // Missing required fields: the record is not readable as an order item.
    let (status, _) = app.get("/orderItems/new-item").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn update_only_mode_reports_missing_item() {
    let app = TestApp::spawn_with(Duration::from_secs(100), UpdateMode::UpdateOnly).await;

    let (status, _) = app
        .patch("/orderItems/new-item", json!({ "quantity": 4 }))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.store.raw_order_item("new-item").await.is_none());
}

#[tokio::test]
async fn delete_all_order_items_empties_collection() {
    let app = TestApp::spawn().await;
    app.seed_food("F1", "1.00").await;
    app.place_order(json!([
        { "food_id": "F1", "quantity": 1 },
        { "food_id": "F1", "quantity": 2 }
    ]))
    .await;

    let (status, body) = app.delete("/allorderitems").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted_count"], 2);

    let (_, all) = app.get("/orderItems").await;
    assert!(all.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn out_of_range_amount_rejects_whole_batch() {
    let app = TestApp::spawn().await;
    app.seed_food("F1", "12.35").await;

    let (status, _) = app
        .post(
            "/orderItems",
            json!({
                "table_id": TEST_TABLE_ID,
                "order_items": [
                    { "food_id": "F1", "quantity": 1 },
                    { "food_id": "F1", "quantity": "79228162514264337593543950335" }
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.store.orders().await.unwrap().is_empty());
    let (_, all) = app.get("/orderItems").await;
    assert!(all.as_array().unwrap().is_empty());
}
