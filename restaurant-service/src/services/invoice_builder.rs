//! Summarizes an order's items into an invoice.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::models::{
    new_record_id, timestamp, CreateInvoiceRequest, Invoice, OrderItem, PaymentMethod,
    PaymentStatus,
};
use crate::services::metrics::INVOICES_TOTAL;
use crate::services::store::{InvoiceStore, OrderItemStore};

/// Whole-unit total of an order: each line amount is truncated before summing.
///
/// This drops every line's fractional part (37.05 + 10.00 + 2.999 gives 49),
/// kept so totals match invoices already issued. A line or a sum that does
/// not fit the integer total is rejected rather than written wrong.
pub fn truncated_total(items: &[OrderItem]) -> Result<i64, AppError> {
    items.iter().try_fold(0i64, |total, item| {
        item.amount
            .trunc()
            .to_i64()
            .and_then(|whole| total.checked_add(whole))
            .ok_or_else(|| {
                AppError::BadRequest(anyhow::anyhow!(
                    "payment amount out of range at order item {}",
                    item.id
                ))
            })
    })
}

/// Payment is due one day after the invoice is created.
pub fn payment_due_date(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + Duration::days(1)
}

#[derive(Clone)]
pub struct InvoiceBuilder {
    order_items: Arc<dyn OrderItemStore>,
    invoices: Arc<dyn InvoiceStore>,
}

impl InvoiceBuilder {
    pub fn new(order_items: Arc<dyn OrderItemStore>, invoices: Arc<dyn InvoiceStore>) -> Self {
        Self {
            order_items,
            invoices,
        }
    }

    /// Assemble an invoice for `order_id` from its current order items.
    #[instrument(skip(self))]
    pub async fn build_invoice(
        &self,
        order_id: &str,
        payment_method: Option<PaymentMethod>,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Invoice, AppError> {
        let items_ordered = self.order_items.find_by_order_id(order_id).await?;
        if items_ordered.is_empty() {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "No order items found for order {}",
                order_id
            )));
        }

        let payment_amount = truncated_total(&items_ordered)?;
        let created_at = timestamp();
        Ok(Invoice {
            id: new_record_id(),
            order_id: order_id.to_string(),
            payment_amount,
            items_ordered,
            payment_method,
            payment_status: payment_status.unwrap_or_default(),
            payment_due_date: payment_due_date(created_at),
            created_at,
            updated_at: created_at,
        })
    }

    /// Build, validate and persist an invoice.
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn create_invoice(&self, request: CreateInvoiceRequest) -> Result<Invoice, AppError> {
        let invoice = self
            .build_invoice(
                &request.order_id,
                request.payment_method,
                request.payment_status,
            )
            .await?;

        invoice.validate()?;
        self.invoices.insert(&invoice).await?;

        INVOICES_TOTAL
            .with_label_values(&[invoice.payment_status.as_str()])
            .inc();
        info!(
            invoice_id = %invoice.id,
            payment_amount = invoice.payment_amount,
            payment_method = invoice.payment_method.map(|m| m.as_str()),
            item_count = invoice.items_ordered.len(),
            "Invoice created"
        );

        Ok(invoice)
    }
}
