//! Creates an order and the order items placed under it.

use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{Order, OrderItem, OrderItemPack};
use crate::services::composer::OrderItemComposer;
use crate::services::metrics::{ORDERS_TOTAL, ORDER_ITEMS_TOTAL};
use crate::services::store::{OrderItemStore, OrderStore};

#[derive(Clone)]
pub struct OrderAggregator {
    orders: Arc<dyn OrderStore>,
    order_items: Arc<dyn OrderItemStore>,
    composer: OrderItemComposer,
}

impl OrderAggregator {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        order_items: Arc<dyn OrderItemStore>,
        composer: OrderItemComposer,
    ) -> Self {
        Self {
            orders,
            order_items,
            composer,
        }
    }

    /// Persist a fresh order for `table_id` (not checked against any table list).
    #[instrument(skip(self))]
    pub async fn create_order(&self, table_id: Option<String>) -> Result<String, AppError> {
        self.persist_order(Order::new(table_id)).await
    }

    async fn persist_order(&self, order: Order) -> Result<String, AppError> {
        let order_id = self.orders.create(&order).await?;
        ORDERS_TOTAL.inc();
        info!(order_id = %order_id, table_id = ?order.table_id, "Order created");
        Ok(order_id)
    }

    /// Create the order for a batch and insert its priced items.
    ///
    /// Lines are validated and priced before the order is written, so an
    /// invalid line leaves nothing behind. The order, the items and any later
    /// invoice are separate writes: if the item insert fails the order stays.
    #[instrument(skip(self, pack), fields(table_id = ?pack.table_id, line_count = pack.order_items.len()))]
    pub async fn place_order(&self, pack: OrderItemPack) -> Result<Vec<OrderItem>, AppError> {
        let order = Order::new(pack.table_id);
        let items = self.composer.compose(&order.id, &pack.order_items).await?;

        let order_id = self.persist_order(order).await?;

        self.order_items.insert_batch(&items).await.map_err(|e| {
            tracing::error!(order_id = %order_id, "Order items not inserted, order left without items: {}", e);
            e
        })?;

        ORDER_ITEMS_TOTAL.inc_by(items.len() as u64);
        info!(order_id = %order_id, count = items.len(), "Order items created");

        Ok(items)
    }
}
