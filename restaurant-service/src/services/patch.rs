//! Partial updates shared by invoices and order items.
//!
//! A patch type lists the fields a caller may change, each as an `Option`
//! skipped when `None`. Serializing it therefore yields exactly the fields
//! that were supplied, to which `updated_at` is always added.

use chrono::{DateTime, Utc};
use mongodb::bson::{self, Document};
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::models::{timestamp, InvoicePatch, OrderItemPatch};
use crate::services::metrics::PARTIAL_UPDATES_TOTAL;
use crate::services::store::{FieldUpdate, InvoiceStore, OrderItemStore, UpdateOutcome};

/// What a partial update does when no record has the target id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateMode {
    /// Create the record from the supplied fields alone.
    #[default]
    Upsert,
    /// Leave the store untouched and report the record as not found.
    UpdateOnly,
}

impl UpdateMode {
    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "upsert" => Some(UpdateMode::Upsert),
            "update_only" => Some(UpdateMode::UpdateOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PartialUpdateMerger {
    mode: UpdateMode,
}

impl PartialUpdateMerger {
    pub fn new(mode: UpdateMode) -> Self {
        Self { mode }
    }

    /// Build the field set for `partial`, stamped with `now`.
    pub fn merge<P>(&self, partial: &P, now: DateTime<Utc>) -> Result<FieldUpdate, AppError>
    where
        P: Serialize + Validate,
    {
        partial.validate()?;

        let mut fields: Document = bson::to_document(partial)?;
        fields.insert("updated_at", bson::to_bson(&now)?);

        Ok(FieldUpdate {
            fields,
            upsert: self.mode == UpdateMode::Upsert,
        })
    }

    fn check_outcome(
        &self,
        entity: &str,
        id: &str,
        outcome: UpdateOutcome,
    ) -> Result<UpdateOutcome, AppError> {
        let label = if outcome.upserted_id.is_some() {
            "upserted"
        } else if outcome.matched_count > 0 {
            "updated"
        } else {
            "unmatched"
        };
        PARTIAL_UPDATES_TOTAL.with_label_values(&[entity, label]).inc();

        if label == "unmatched" {
            warn!(entity, id, mode = ?self.mode, "Partial update matched no record");
            return Err(AppError::NotFound(anyhow::anyhow!(
                "{} {} not found",
                entity,
                id
            )));
        }

        info!(entity, id, outcome = label, "Partial update applied");
        Ok(outcome)
    }
}

/// Applies invoice and order item patches through the merger.
#[derive(Clone)]
pub struct PatchService {
    merger: PartialUpdateMerger,
    order_items: Arc<dyn OrderItemStore>,
    invoices: Arc<dyn InvoiceStore>,
}

impl PatchService {
    pub fn new(
        merger: PartialUpdateMerger,
        order_items: Arc<dyn OrderItemStore>,
        invoices: Arc<dyn InvoiceStore>,
    ) -> Self {
        Self {
            merger,
            order_items,
            invoices,
        }
    }

    /// Patch payment method and/or status. The total and item snapshot stay as issued.
    #[instrument(skip(self, patch))]
    pub async fn update_invoice(
        &self,
        invoice_id: &str,
        patch: &InvoicePatch,
    ) -> Result<UpdateOutcome, AppError> {
        let update = self.merger.merge(patch, timestamp())?;
        let outcome = self.invoices.update_fields(invoice_id, update).await?;
        self.merger.check_outcome("invoice", invoice_id, outcome)
    }

    /// Patch unit price, quantity and/or food. `amount` is not recomputed.
    #[instrument(skip(self, patch))]
    pub async fn update_order_item(
        &self,
        order_item_id: &str,
        patch: &OrderItemPatch,
    ) -> Result<UpdateOutcome, AppError> {
        let update = self.merger.merge(patch, timestamp())?;
        let outcome = self.order_items.update_fields(order_item_id, update).await?;
        self.merger.check_outcome("order_item", order_item_id, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMethod, PaymentStatus};
    use mongodb::bson::doc;

    #[test]
    fn only_supplied_fields_and_updated_at_are_set() {
        let merger = PartialUpdateMerger::default();
        let now = timestamp();
        let patch = InvoicePatch {
            payment_status: Some(PaymentStatus::Paid),
            ..Default::default()
        };

        let update = merger.merge(&patch, now).unwrap();

        assert_eq!(
            update.fields,
            doc! {
                "payment_status": "PAID",
                "updated_at": bson::to_bson(&now).unwrap(),
            }
        );
        assert!(update.upsert);
    }

    #[test]
    fn empty_patch_still_touches_updated_at() {
        let merger = PartialUpdateMerger::new(UpdateMode::UpdateOnly);
        let update = merger.merge(&OrderItemPatch::default(), timestamp()).unwrap();

        assert_eq!(update.fields.len(), 1);
        assert!(update.fields.contains_key("updated_at"));
        assert!(!update.upsert);
    }

    #[test]
    fn order_item_patch_whitelist() {
        let merger = PartialUpdateMerger::default();
        let patch = OrderItemPatch {
            unit_price: Some("4.50".parse().unwrap()),
            quantity: Some("2".parse().unwrap()),
            food_id: Some("F9".to_string()),
        };

        let update = merger.merge(&patch, timestamp()).unwrap();
        let keys: Vec<&str> = update.fields.keys().map(String::as_str).collect();

        assert_eq!(keys, ["unit_price", "quantity", "food_id", "updated_at"]);
    }

    #[test]
    fn invalid_patch_is_rejected_before_building_fields() {
        let merger = PartialUpdateMerger::default();
        let patch = OrderItemPatch {
            quantity: Some("-1".parse().unwrap()),
            ..Default::default()
        };

        let result = merger.merge(&patch, timestamp());
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[test]
    fn both_invoice_fields_are_carried() {
        let merger = PartialUpdateMerger::default();
        let patch = InvoicePatch {
            payment_method: Some(PaymentMethod::Cash),
            payment_status: Some(PaymentStatus::Pending),
        };

        let update = merger.merge(&patch, timestamp()).unwrap();
        assert_eq!(update.fields.get_str("payment_method").unwrap(), "CASH");
        assert_eq!(update.fields.get_str("payment_status").unwrap(), "PENDING");
    }

    #[test]
    fn update_mode_parses_config_values() {
        assert_eq!(UpdateMode::from_string("upsert"), Some(UpdateMode::Upsert));
        assert_eq!(
            UpdateMode::from_string("update_only"),
            Some(UpdateMode::UpdateOnly)
        );
        assert_eq!(UpdateMode::from_string("replace"), None);
    }
}
