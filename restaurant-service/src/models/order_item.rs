//! Order item model: one priced food line within an order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// A persisted, priced order line.
///
/// `unit_price` is the catalog price snapshotted at creation and
/// `amount = unit_price * quantity`. Neither is re-derived afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub food_id: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One requested line of a batch, as received from the client.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OrderItemRequest {
    #[validate(
        required(message = "food_id is required"),
        length(min = 1, message = "food_id cannot be empty")
    )]
    pub food_id: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "positive_quantity"))]
    pub quantity: Decimal,
}

impl OrderItemRequest {
    pub fn new(food_id: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            food_id: Some(food_id.into()),
            quantity,
        }
    }
}

/// Batch request: a table and the lines ordered at it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderItemPack {
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub order_items: Vec<OrderItemRequest>,
}

/// Fields of an order item that may be patched. Absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct OrderItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "non_negative_price"))]
    pub unit_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "positive_quantity"))]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "food_id cannot be empty"))]
    pub food_id: Option<String>,
}

fn positive_quantity(quantity: &Decimal) -> Result<(), ValidationError> {
    if quantity.is_sign_positive() && !quantity.is_zero() {
        Ok(())
    } else {
        let mut err = ValidationError::new("positive");
        err.message = Some("quantity must be greater than zero".into());
        Err(err)
    }
}

fn non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("unit_price cannot be negative".into());
        Err(err)
    } else {
        Ok(())
    }
}
