//! MongoDB-backed stores for restaurant-service.

use crate::models::{Food, Invoice, Order, OrderItem};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{
    FieldUpdate, FoodCatalog, InvoiceStore, OrderItemStore, OrderStore, UpdateOutcome,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Document},
    options::{FindOptions, IndexOptions, UpdateOptions},
    Client as MongoClient, Collection, Cursor, Database, IndexModel,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use tracing::{info, instrument};

const FOOD_COLLECTION: &str = "food";
const ORDER_COLLECTION: &str = "order";
const ORDER_ITEM_COLLECTION: &str = "orderItem";
const INVOICE_COLLECTION: &str = "invoice";

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        info!("Creating MongoDB indexes for restaurant-service");

        for collection in [
            FOOD_COLLECTION,
            ORDER_COLLECTION,
            ORDER_ITEM_COLLECTION,
            INVOICE_COLLECTION,
        ] {
            let id_index = IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(
                    IndexOptions::builder()
                        .name("id_idx".to_string())
                        .unique(true)
                        .build(),
                )
                .build();

            self.raw(collection)
                .create_index(id_index, None)
                .await
                .map_err(|e| {
                    tracing::error!(collection, "Failed to create id index: {}", e);
                    AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
                })?;
        }

        // Invoices and the by-order listing both look items up by order
        let order_id_index = IndexModel::builder()
            .keys(doc! { "order_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("order_id_idx".to_string())
                    .build(),
            )
            .build();

        self.raw(ORDER_ITEM_COLLECTION)
            .create_index(order_id_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create order_id index: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    fn raw(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    async fn find_documents<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: Document,
        operation: &str,
    ) -> Result<Vec<T>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[operation])
            .start_timer();

        // Sorting on the generated _id keeps insertion order.
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let cursor = self
            .raw(collection)
            .find(filter, options)
            .await
            .map_err(|e| {
                tracing::error!(operation, "Failed to query {}: {}", collection, e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        let records = decode_all(cursor, collection).await;
        timer.observe_duration();
        records
    }

    async fn find_one<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
        operation: &str,
    ) -> Result<Option<T>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[operation])
            .start_timer();

        let found = self
            .raw(collection)
            .find_one(doc! { "id": id }, None)
            .await
            .map_err(|e| {
                tracing::error!(operation, "Failed to find record in {}: {}", collection, e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        timer.observe_duration();

        found
            .map(|document| bson::from_document(document).map_err(AppError::from))
            .transpose()
    }

    async fn set_fields(
        &self,
        collection: &str,
        id: &str,
        update: FieldUpdate,
        operation: &str,
    ) -> Result<UpdateOutcome, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[operation])
            .start_timer();

        let options = UpdateOptions::builder().upsert(update.upsert).build();
        let result = self
            .raw(collection)
            .update_one(doc! { "id": id }, doc! { "$set": update.fields }, options)
            .await
            .map_err(|e| {
                tracing::error!(operation, "Failed to update record in {}: {}", collection, e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        timer.observe_duration();

        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            // The filter field becomes part of an upserted document.
            upserted_id: result.upserted_id.map(|_| id.to_string()),
        })
    }

    async fn delete_everything(&self, collection: &str, operation: &str) -> Result<u64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&[operation])
            .start_timer();

        let result = self
            .raw(collection)
            .delete_many(doc! {}, None)
            .await
            .map_err(|e| {
                tracing::error!(operation, "Failed to delete from {}: {}", collection, e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        timer.observe_duration();
        Ok(result.deleted_count)
    }
}

/// Drain a cursor, failing on the first record that does not decode.
async fn decode_all<T: DeserializeOwned>(
    mut cursor: Cursor<Document>,
    collection: &str,
) -> Result<Vec<T>, AppError> {
    let mut records = Vec::new();
    while let Some(document) = cursor.try_next().await.map_err(|e| {
        tracing::error!("Failed to read from {} cursor: {}", collection, e);
        AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
    })? {
        let record = bson::from_document(document).map_err(|e| {
            tracing::error!(
                decoded_so_far = records.len(),
                "Failed to decode {} record: {}",
                collection,
                e
            );
            AppError::DecodeError(format!("{} record: {}", collection, e))
        })?;
        records.push(record);
    }
    Ok(records)
}

#[async_trait]
impl FoodCatalog for MongoStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, food_id: &str) -> Result<Option<Food>, AppError> {
        self.find_one(FOOD_COLLECTION, food_id, "find_food").await
    }
}

#[async_trait]
impl OrderStore for MongoStore {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn create(&self, order: &Order) -> Result<String, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_order"])
            .start_timer();

        self.db
            .collection::<Order>(ORDER_COLLECTION)
            .insert_one(order, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert order: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        timer.observe_duration();
        Ok(order.id.clone())
    }
}

#[async_trait]
impl OrderItemStore for MongoStore {
    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn insert_batch(&self, items: &[OrderItem]) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_order_items"])
            .start_timer();

        self.db
            .collection::<OrderItem>(ORDER_ITEM_COLLECTION)
            .insert_many(items, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert order items: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        timer.observe_duration();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_order_id(&self, order_id: &str) -> Result<Vec<OrderItem>, AppError> {
        self.find_documents(
            ORDER_ITEM_COLLECTION,
            doc! { "order_id": order_id },
            "find_order_items_by_order",
        )
        .await
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, order_item_id: &str) -> Result<Option<OrderItem>, AppError> {
        self.find_one(ORDER_ITEM_COLLECTION, order_item_id, "find_order_item")
            .await
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<OrderItem>, AppError> {
        self.find_documents(ORDER_ITEM_COLLECTION, doc! {}, "list_order_items")
            .await
    }

    #[instrument(skip(self, update), fields(upsert = update.upsert))]
    async fn update_fields(
        &self,
        order_item_id: &str,
        update: FieldUpdate,
    ) -> Result<UpdateOutcome, AppError> {
        self.set_fields(
            ORDER_ITEM_COLLECTION,
            order_item_id,
            update,
            "update_order_item",
        )
        .await
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> Result<u64, AppError> {
        self.delete_everything(ORDER_ITEM_COLLECTION, "delete_order_items")
            .await
    }
}

#[async_trait]
impl InvoiceStore for MongoStore {
    #[instrument(skip(self, invoice), fields(invoice_id = %invoice.id))]
    async fn insert(&self, invoice: &Invoice) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_invoice"])
            .start_timer();

        self.db
            .collection::<Invoice>(INVOICE_COLLECTION)
            .insert_one(invoice, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert invoice: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;

        timer.observe_duration();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, invoice_id: &str) -> Result<Option<Invoice>, AppError> {
        self.find_one(INVOICE_COLLECTION, invoice_id, "find_invoice")
            .await
    }

    #[instrument(skip(self))]
    async fn find_all(&self) -> Result<Vec<Invoice>, AppError> {
        self.find_documents(INVOICE_COLLECTION, doc! {}, "list_invoices")
            .await
    }

    #[instrument(skip(self, update), fields(upsert = update.upsert))]
    async fn update_fields(
        &self,
        invoice_id: &str,
        update: FieldUpdate,
    ) -> Result<UpdateOutcome, AppError> {
        self.set_fields(INVOICE_COLLECTION, invoice_id, update, "update_invoice")
            .await
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> Result<u64, AppError> {
        self.delete_everything(INVOICE_COLLECTION, "delete_invoices")
            .await
    }
}
