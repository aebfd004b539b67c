//! Services module for restaurant-service.

pub mod aggregator;
pub mod composer;
pub mod database;
pub mod invoice_builder;
pub mod memory;
pub mod metrics;
pub mod patch;
pub mod pricing;
pub mod store;

pub use aggregator::OrderAggregator;
pub use composer::OrderItemComposer;
pub use database::MongoStore;
pub use invoice_builder::InvoiceBuilder;
pub use memory::InMemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use patch::{PartialUpdateMerger, PatchService, UpdateMode};
pub use pricing::{LinePrice, PricingResolver};
pub use store::{
    FieldUpdate, FoodCatalog, InvoiceStore, OrderItemStore, OrderStore, UpdateOutcome,
};
