//! Application startup and lifecycle management.
//!
//! Wires the stores into the ordering components and serves them, together
//! with health and metrics endpoints, over HTTP.

use crate::config::{RestaurantConfig, StorageBackend};
use crate::handlers::{health, invoices, order_items};
use crate::services::metrics::ERRORS_TOTAL;
use crate::services::{
    FoodCatalog, InMemoryStore, InvoiceBuilder, InvoiceStore, MongoStore, OrderAggregator,
    OrderItemComposer, OrderItemStore, OrderStore, PartialUpdateMerger, PatchService,
    PricingResolver, UpdateMode,
};
use axum::{
    routing::{delete, get},
    Router,
};
use service_core::error::AppError;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Backing store, as seen by the health probes.
#[derive(Clone)]
pub enum StoreHealth {
    Mongo(MongoStore),
    Memory,
}

impl StoreHealth {
    pub async fn check(&self) -> Result<(), AppError> {
        match self {
            StoreHealth::Mongo(db) => db.health_check().await,
            StoreHealth::Memory => Ok(()),
        }
    }
}

/// Store handles injected into the application.
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn FoodCatalog>,
    pub orders: Arc<dyn OrderStore>,
    pub order_items: Arc<dyn OrderItemStore>,
    pub invoices: Arc<dyn InvoiceStore>,
    pub health: StoreHealth,
}

impl Stores {
    pub fn mongo(db: MongoStore) -> Self {
        let shared = Arc::new(db.clone());
        Self {
            catalog: shared.clone(),
            orders: shared.clone(),
            order_items: shared.clone(),
            invoices: shared,
            health: StoreHealth::Mongo(db),
        }
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            catalog: store.clone(),
            orders: store.clone(),
            order_items: store.clone(),
            invoices: store,
            health: StoreHealth::Memory,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: OrderAggregator,
    pub invoice_builder: InvoiceBuilder,
    pub patches: PatchService,
    pub order_items: Arc<dyn OrderItemStore>,
    pub invoices: Arc<dyn InvoiceStore>,
    pub health: StoreHealth,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(stores: Stores, request_timeout: Duration, update_mode: UpdateMode) -> Self {
        let composer = OrderItemComposer::new(PricingResolver::new(stores.catalog));
        let aggregator =
            OrderAggregator::new(stores.orders, stores.order_items.clone(), composer);
        let invoice_builder =
            InvoiceBuilder::new(stores.order_items.clone(), stores.invoices.clone());
        let patches = PatchService::new(
            PartialUpdateMerger::new(update_mode),
            stores.order_items.clone(),
            stores.invoices.clone(),
        );

        Self {
            aggregator,
            invoice_builder,
            patches,
            order_items: stores.order_items,
            invoices: stores.invoices,
            health: stores.health,
            request_timeout,
        }
    }

    /// Run one request's work under the request timeout.
    ///
    /// On expiry the work is dropped; writes it already issued stay.
    pub async fn within_deadline<T, F>(&self, work: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        let result = match tokio::time::timeout(self.request_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(self.request_timeout)),
        };

        if let Err(e) = &result {
            ERRORS_TOTAL.with_label_values(&[e.kind()]).inc();
        }
        result
    }
}

/// Build the HTTP router for the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/orderItems",
            get(order_items::list_order_items).post(order_items::create_order_items),
        )
        .route(
            "/orderItems/:order_item_id",
            get(order_items::get_order_item).patch(order_items::update_order_item),
        )
        .route(
            "/orderItems-order/:order_id",
            get(order_items::order_items_by_order),
        )
        .route("/allorderitems", delete(order_items::delete_all_order_items))
        .route(
            "/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route(
            "/invoices/:invoice_id",
            get(invoices::get_invoice).patch(invoices::update_invoice),
        )
        .route("/allinvoices", delete(invoices::delete_all_invoices))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics_endpoint))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RestaurantConfig) -> Result<Self, AppError> {
        let stores = match config.storage {
            StorageBackend::Mongodb => {
                let db = MongoStore::connect(&config.mongodb.uri, &config.mongodb.database)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to MongoDB: {}", e);
                        e
                    })?;

                db.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;

                Stores::mongo(db)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory store, data is lost on restart");
                Stores::in_memory(Arc::new(InMemoryStore::new()))
            }
        };

        let state = AppState::new(stores, config.request_timeout, config.update_mode);

        // Port 0 binds a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            update_mode = ?config.update_mode,
            request_timeout = ?config.request_timeout,
            "Restaurant service listening"
        );

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until `shutdown` resolves.
    pub async fn run_until_stopped<S>(self, shutdown: S) -> std::io::Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}
