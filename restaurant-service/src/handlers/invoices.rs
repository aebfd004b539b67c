use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::models::{CreateInvoiceRequest, Invoice, InvoicePatch};
use crate::services::UpdateOutcome;
use crate::startup::AppState;

#[tracing::instrument(skip(state))]
pub async fn list_invoices(State(state): State<AppState>) -> Result<Json<Vec<Invoice>>, AppError> {
    let invoices = state.within_deadline(state.invoices.find_all()).await?;
    Ok(Json(invoices))
}

#[tracing::instrument(skip(state))]
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<Json<Invoice>, AppError> {
    let invoice = state
        .within_deadline(state.invoices.find_by_id(&invoice_id))
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice {} not found", invoice_id)))?;
    Ok(Json(invoice))
}

#[tracing::instrument(skip(state, request), fields(order_id = %request.order_id))]
pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    let invoice = state
        .within_deadline(state.invoice_builder.create_invoice(request))
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

#[tracing::instrument(skip(state, patch))]
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
    Json(patch): Json<InvoicePatch>,
) -> Result<Json<UpdateOutcome>, AppError> {
    let outcome = state
        .within_deadline(state.patches.update_invoice(&invoice_id, &patch))
        .await?;
    Ok(Json(outcome))
}

#[tracing::instrument(skip(state))]
pub async fn delete_all_invoices(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let deleted = state.within_deadline(state.invoices.delete_all()).await?;
    tracing::warn!(deleted, "All invoices deleted");
    Ok(Json(json!({ "deleted_count": deleted })))
}
