//! Order model: one dine-in request grouping order items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub table_id: Option<String>,
    pub order_date: DateTime<Utc>,
}

impl Order {
    pub fn new(table_id: Option<String>) -> Self {
        Self {
            id: super::new_record_id(),
            table_id,
            order_date: super::timestamp(),
        }
    }
}
