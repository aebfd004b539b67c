//! Store interfaces the ordering core depends on.
//!
//! Components receive these as `Arc<dyn _>` at construction time, so the
//! MongoDB implementation and the in-memory one are interchangeable.

use async_trait::async_trait;
use mongodb::bson::Document;
use serde::Serialize;
use service_core::error::AppError;

use crate::models::{Food, Invoice, Order, OrderItem};

/// A `$set`-style field update and whether it may create the record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub fields: Document,
    pub upsert: bool,
}

/// Result of applying a [`FieldUpdate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upserted_id: Option<String>,
}

#[async_trait]
pub trait FoodCatalog: Send + Sync {
    async fn find_by_id(&self, food_id: &str) -> Result<Option<Food>, AppError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order and return its identifier.
    async fn create(&self, order: &Order) -> Result<String, AppError>;
}

#[async_trait]
pub trait OrderItemStore: Send + Sync {
    async fn insert_batch(&self, items: &[OrderItem]) -> Result<(), AppError>;

    /// Items of one order, in insertion order.
    async fn find_by_order_id(&self, order_id: &str) -> Result<Vec<OrderItem>, AppError>;

    async fn find_by_id(&self, order_item_id: &str) -> Result<Option<OrderItem>, AppError>;

    async fn find_all(&self) -> Result<Vec<OrderItem>, AppError>;

    async fn update_fields(
        &self,
        order_item_id: &str,
        update: FieldUpdate,
    ) -> Result<UpdateOutcome, AppError>;

    async fn delete_all(&self) -> Result<u64, AppError>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn insert(&self, invoice: &Invoice) -> Result<(), AppError>;

    async fn find_by_id(&self, invoice_id: &str) -> Result<Option<Invoice>, AppError>;

    async fn find_all(&self) -> Result<Vec<Invoice>, AppError>;

    async fn update_fields(
        &self,
        invoice_id: &str,
        update: FieldUpdate,
    ) -> Result<UpdateOutcome, AppError>;

    async fn delete_all(&self) -> Result<u64, AppError>;
}
