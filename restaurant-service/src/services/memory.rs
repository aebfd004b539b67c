//! In-memory stores with the same record semantics as the MongoDB ones.
//!
//! Records are kept as BSON documents so field updates, upserts and decode
//! failures behave like they do against the real collections.

use crate::models::{Food, Invoice, Order, OrderItem};
use crate::services::store::{
    FieldUpdate, FoodCatalog, InvoiceStore, OrderItemStore, OrderStore, UpdateOutcome,
};
use async_trait::async_trait;
use mongodb::bson::{self, Bson, Document};
use serde::de::DeserializeOwned;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    foods: RwLock<Vec<Document>>,
    orders: RwLock<Vec<Document>>,
    order_items: RwLock<Vec<Document>>,
    invoices: RwLock<Vec<Document>>,
    fail_order_item_inserts: AtomicBool,
    fail_invoice_inserts: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_food(&self, food: Food) -> Result<(), AppError> {
        push(&self.foods, &food).await
    }

    /// Make every subsequent order item insert fail with a database error.
    pub fn fail_order_item_inserts(&self, fail: bool) {
        self.fail_order_item_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent invoice insert fail with a database error.
    pub fn fail_invoice_inserts(&self, fail: bool) {
        self.fail_invoice_inserts.store(fail, Ordering::SeqCst);
    }

    /// Store a document as-is, bypassing the typed models.
    pub async fn insert_raw_order_item(&self, document: Document) {
        self.order_items.write().await.push(document);
    }

    pub async fn raw_order_item(&self, order_item_id: &str) -> Option<Document> {
        find_raw(&self.order_items, order_item_id).await
    }

    pub async fn raw_invoice(&self, invoice_id: &str) -> Option<Document> {
        find_raw(&self.invoices, invoice_id).await
    }

    pub async fn orders(&self) -> Result<Vec<Order>, AppError> {
        decode_all(&*self.orders.read().await)
    }

    pub async fn invoice_count(&self) -> usize {
        self.invoices.read().await.len()
    }
}

async fn push<T: Serialize>(collection: &RwLock<Vec<Document>>, record: &T) -> Result<(), AppError> {
    let document = bson::to_document(record)?;
    collection.write().await.push(document);
    Ok(())
}

fn id_matches(document: &Document, id: &str) -> bool {
    matches!(document.get("id"), Some(Bson::String(value)) if value == id)
}

async fn find_raw(collection: &RwLock<Vec<Document>>, id: &str) -> Option<Document> {
    collection
        .read()
        .await
        .iter()
        .find(|document| id_matches(document, id))
        .cloned()
}

async fn find_one<T: DeserializeOwned>(
    collection: &RwLock<Vec<Document>>,
    id: &str,
) -> Result<Option<T>, AppError> {
    find_raw(collection, id)
        .await
        .map(|document| bson::from_document(document).map_err(AppError::from))
        .transpose()
}

fn decode_all<'a, T: DeserializeOwned>(
    documents: impl IntoIterator<Item = &'a Document>,
) -> Result<Vec<T>, AppError> {
    documents
        .into_iter()
        .map(|document| {
            bson::from_document(document.clone()).map_err(|e| {
                tracing::error!("Failed to decode stored record: {}", e);
                AppError::DecodeError(e.to_string())
            })
        })
        .collect()
}

async fn set_fields(
    collection: &RwLock<Vec<Document>>,
    id: &str,
    update: FieldUpdate,
) -> UpdateOutcome {
    let mut documents = collection.write().await;

    if let Some(document) = documents.iter_mut().find(|document| id_matches(document, id)) {
        let mut modified = false;
        for (key, value) in update.fields {
            if document.get(&key) != Some(&value) {
                document.insert(key, value);
                modified = true;
            }
        }
        return UpdateOutcome {
            matched_count: 1,
            modified_count: u64::from(modified),
            upserted_id: None,
        };
    }

    if !update.upsert {
        return UpdateOutcome::default();
    }

    let mut document = Document::new();
    document.insert("id", id);
    for (key, value) in update.fields {
        document.insert(key, value);
    }
    documents.push(document);

    UpdateOutcome {
        matched_count: 0,
        modified_count: 0,
        upserted_id: Some(id.to_string()),
    }
}

async fn delete_everything(collection: &RwLock<Vec<Document>>) -> u64 {
    let mut documents = collection.write().await;
    let deleted = documents.len() as u64;
    documents.clear();
    deleted
}

#[async_trait]
impl FoodCatalog for InMemoryStore {
    async fn find_by_id(&self, food_id: &str) -> Result<Option<Food>, AppError> {
        find_one(&self.foods, food_id).await
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create(&self, order: &Order) -> Result<String, AppError> {
        push(&self.orders, order).await?;
        Ok(order.id.clone())
    }
}

#[async_trait]
impl OrderItemStore for InMemoryStore {
    async fn insert_batch(&self, items: &[OrderItem]) -> Result<(), AppError> {
        if self.fail_order_item_inserts.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "order item insert rejected"
            )));
        }
        let documents = items
            .iter()
            .map(bson::to_document)
            .collect::<Result<Vec<_>, _>>()?;
        self.order_items.write().await.extend(documents);
        Ok(())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Vec<OrderItem>, AppError> {
        let documents = self.order_items.read().await;
        decode_all(documents.iter().filter(|document| {
            matches!(document.get("order_id"), Some(Bson::String(value)) if value == order_id)
        }))
    }

    async fn find_by_id(&self, order_item_id: &str) -> Result<Option<OrderItem>, AppError> {
        find_one(&self.order_items, order_item_id).await
    }

    async fn find_all(&self) -> Result<Vec<OrderItem>, AppError> {
        decode_all(&*self.order_items.read().await)
    }

    async fn update_fields(
        &self,
        order_item_id: &str,
        update: FieldUpdate,
    ) -> Result<UpdateOutcome, AppError> {
        Ok(set_fields(&self.order_items, order_item_id, update).await)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        Ok(delete_everything(&self.order_items).await)
    }
}

#[async_trait]
impl InvoiceStore for InMemoryStore {
    async fn insert(&self, invoice: &Invoice) -> Result<(), AppError> {
        if self.fail_invoice_inserts.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "invoice insert rejected"
            )));
        }
        push(&self.invoices, invoice).await
    }

    async fn find_by_id(&self, invoice_id: &str) -> Result<Option<Invoice>, AppError> {
        find_one(&self.invoices, invoice_id).await
    }

    async fn find_all(&self) -> Result<Vec<Invoice>, AppError> {
        decode_all(&*self.invoices.read().await)
    }

    async fn update_fields(
        &self,
        invoice_id: &str,
        update: FieldUpdate,
    ) -> Result<UpdateOutcome, AppError> {
        Ok(set_fields(&self.invoices, invoice_id, update).await)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        Ok(delete_everything(&self.invoices).await)
    }
}
