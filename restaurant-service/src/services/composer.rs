//! Builds priced order items from a requested batch.

use service_core::error::AppError;
use tracing::instrument;
use validator::Validate;

use crate::models::{new_record_id, timestamp, OrderItem, OrderItemRequest};
use crate::services::pricing::PricingResolver;

#[derive(Clone)]
pub struct OrderItemComposer {
    pricing: PricingResolver,
}

impl OrderItemComposer {
    pub fn new(pricing: PricingResolver) -> Self {
        Self { pricing }
    }

    /// Check every line before anything is priced or written.
    ///
    /// An empty batch and any invalid line reject the whole batch.
    pub fn validate_lines(&self, lines: &[OrderItemRequest]) -> Result<(), AppError> {
        if lines.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "order_items must contain at least one line"
            )));
        }

        for (index, line) in lines.iter().enumerate() {
            line.validate().map_err(|errors| {
                tracing::warn!(line_index = index, "Rejecting batch: {}", errors);
                AppError::ValidationError(errors)
            })?;
        }

        Ok(())
    }

    /// Price every line for `order_id`, preserving input order.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn compose(
        &self,
        order_id: &str,
        lines: &[OrderItemRequest],
    ) -> Result<Vec<OrderItem>, AppError> {
        self.validate_lines(lines)?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            // validate_lines guarantees a food id on every line
            let food_id = line.food_id.clone().unwrap_or_default();
            let price = self.pricing.resolve(&food_id, line.quantity).await?;
            let now = timestamp();

            items.push(OrderItem {
                id: new_record_id(),
                order_id: order_id.to_string(),
                food_id,
                quantity: line.quantity,
                unit_price: price.unit_price,
                amount: price.amount,
                created_at: now,
                updated_at: now,
            });
        }

        Ok(items)
    }
}
