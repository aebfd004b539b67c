//! Domain models for restaurant-service.

mod food;
mod invoice;
mod order;
mod order_item;

use chrono::{DateTime, SubsecRound, Utc};

pub use food::Food;
pub use invoice::{CreateInvoiceRequest, Invoice, InvoicePatch, PaymentMethod, PaymentStatus};
pub use order::Order;
pub use order_item::{OrderItem, OrderItemPack, OrderItemPatch, OrderItemRequest};

/// Current time at whole-second precision, which is what every record stores.
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Fresh record identifier (24-char hex, as assigned by the document store).
pub fn new_record_id() -> String {
    mongodb::bson::oid::ObjectId::new().to_hex()
}
