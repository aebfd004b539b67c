use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::models::{OrderItem, OrderItemPack, OrderItemPatch};
use crate::services::UpdateOutcome;
use crate::startup::AppState;

#[tracing::instrument(skip(state))]
pub async fn list_order_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderItem>>, AppError> {
    let items = state
        .within_deadline(state.order_items.find_all())
        .await?;
    Ok(Json(items))
}

#[tracing::instrument(skip(state))]
pub async fn get_order_item(
    State(state): State<AppState>,
    Path(order_item_id): Path<String>,
) -> Result<Json<OrderItem>, AppError> {
    let item = state
        .within_deadline(state.order_items.find_by_id(&order_item_id))
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Order item {} not found", order_item_id))
        })?;
    Ok(Json(item))
}

#[tracing::instrument(skip(state))]
pub async fn order_items_by_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Vec<OrderItem>>, AppError> {
    let items = state
        .within_deadline(state.order_items.find_by_order_id(&order_id))
        .await?;
    Ok(Json(items))
}

#[tracing::instrument(skip(state, pack))]
pub async fn create_order_items(
    State(state): State<AppState>,
    Json(pack): Json<OrderItemPack>,
) -> Result<(StatusCode, Json<Vec<OrderItem>>), AppError> {
    let items = state
        .within_deadline(state.aggregator.place_order(pack))
        .await?;
    Ok((StatusCode::CREATED, Json(items)))
}

#[tracing::instrument(skip(state, patch))]
pub async fn update_order_item(
    State(state): State<AppState>,
    Path(order_item_id): Path<String>,
    Json(patch): Json<OrderItemPatch>,
) -> Result<Json<UpdateOutcome>, AppError> {
    let outcome = state
        .within_deadline(state.patches.update_order_item(&order_item_id, &patch))
        .await?;
    Ok(Json(outcome))
}

#[tracing::instrument(skip(state))]
pub async fn delete_all_order_items(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let deleted = state
        .within_deadline(state.order_items.delete_all())
        .await?;
    tracing::warn!(deleted, "All order items deleted");
    Ok(Json(json!({ "deleted_count": deleted })))
}
