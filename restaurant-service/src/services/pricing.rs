//! Line pricing against the food catalog.

use rust_decimal::{Decimal, RoundingStrategy};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;

use crate::services::store::FoodCatalog;

/// Price of one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePrice {
    pub unit_price: Decimal,
    pub amount: Decimal,
}

/// Round half-up to cents.
pub fn round_to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price a line from a catalog price.
///
/// The amount is the rounded unit price times the quantity and is not
/// rounded again, so fractional quantities can leave sub-cent amounts.
/// A product outside the decimal range is rejected.
pub fn price_line(catalog_price: Decimal, quantity: Decimal) -> Result<LinePrice, AppError> {
    let unit_price = round_to_cents(catalog_price);
    let amount = unit_price.checked_mul(quantity).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "amount for quantity {} at unit price {} is out of range",
            quantity,
            unit_price
        ))
    })?;
    Ok(LinePrice { unit_price, amount })
}

#[derive(Clone)]
pub struct PricingResolver {
    catalog: Arc<dyn FoodCatalog>,
}

impl PricingResolver {
    pub fn new(catalog: Arc<dyn FoodCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolve the price of `quantity` units of `food_id`.
    ///
    /// A food missing from the catalog prices at zero.
    #[instrument(skip(self))]
    pub async fn resolve(&self, food_id: &str, quantity: Decimal) -> Result<LinePrice, AppError> {
        let catalog_price = match self.catalog.find_by_id(food_id).await? {
            Some(food) => food.price,
            None => {
                tracing::warn!(food_id, "Food not found in catalog, pricing line at zero");
                Decimal::ZERO
            }
        };
        price_line(catalog_price, quantity)
    }
}
