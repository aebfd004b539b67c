pub mod health;
pub mod invoices;
pub mod order_items;
