//! Restaurant Service - orders, priced order items and invoices.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
