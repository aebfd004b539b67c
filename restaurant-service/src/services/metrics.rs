//! Prometheus metrics for restaurant-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, HistogramVec,
    IntCounter, TextEncoder,
};

/// Orders created.
pub static ORDERS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("restaurant_orders_total", "Total number of orders created")
        .expect("Failed to register orders_total")
});

/// Order items created.
pub static ORDER_ITEMS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "restaurant_order_items_total",
        "Total number of order items created"
    )
    .expect("Failed to register order_items_total")
});

/// Invoice counter by initial payment status.
pub static INVOICES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "restaurant_invoices_total",
        "Total number of invoices by payment status",
        &["payment_status"]
    )
    .expect("Failed to register invoices_total")
});

/// Partial updates by entity and outcome (updated, upserted, unmatched).
pub static PARTIAL_UPDATES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "restaurant_partial_updates_total",
        "Total number of partial updates by entity and outcome",
        &["entity", "outcome"]
    )
    .expect("Failed to register partial_updates_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "restaurant_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Store operation duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "restaurant_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&ORDERS_TOTAL);
    Lazy::force(&ORDER_ITEMS_TOTAL);
    Lazy::force(&INVOICES_TOTAL);
    Lazy::force(&PARTIAL_UPDATES_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
