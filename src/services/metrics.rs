//! Prometheus counters for store operations

use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec, IntCounterVec};

lazy_static! {
    static ref STORE_OPERATIONS: IntCounterVec = register_int_counter_vec!(
        "playlister_store_operations_total",
        "Store requests handled, by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("metric can be registered");
}

/// Count one handled store request
pub fn record(operation: &str, outcome: &str) {
    STORE_OPERATIONS.with_label_values(&[operation, outcome]).inc();
}
