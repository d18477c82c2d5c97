//! Prometheus metrics for delayq
//!
//! Provides centralized metrics collection for monitoring:
//! - Message publishing (immediate / delayed)
//! - Message delivery to handlers
//! - Handler and decode failures
//! - Store errors seen by the consumer loops

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    IntCounter, IntCounterVec, TextEncoder, opts, register_int_counter, register_int_counter_vec,
};

/// Label value for messages pushed to `<topic>:list`
pub const KIND_IMMEDIATE: &str = "immediate";
/// Label value for messages added to `<topic>:zset`
pub const KIND_DELAYED: &str = "delayed";

// ============================================================================
// Producer Metrics
// ============================================================================

/// Total number of messages written to the store (by kind)
pub static MESSAGES_PUBLISHED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "delayq_messages_published_total",
            "Total number of messages written to the store"
        ),
        &["kind"]
    )
    .expect("Failed to register MESSAGES_PUBLISHED_TOTAL metric")
});

// ============================================================================
// Consumer Metrics
// ============================================================================

/// Total number of messages dispatched to a handler (by kind)
pub static MESSAGES_DELIVERED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "delayq_messages_delivered_total",
            "Total number of messages dispatched to a handler"
        ),
        &["kind"]
    )
    .expect("Failed to register MESSAGES_DELIVERED_TOTAL metric")
});

/// Handler invocations that returned an error
pub static HANDLER_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "delayq_handler_failures_total",
        "Handler invocations that returned an error"
    ))
    .expect("Failed to register HANDLER_FAILURES_TOTAL metric")
});

/// Stored payloads that could not be decoded (the message is lost)
pub static DECODE_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "delayq_decode_failures_total",
        "Stored payloads that could not be decoded"
    ))
    .expect("Failed to register DECODE_FAILURES_TOTAL metric")
});

/// Store errors observed by consumer poll loops (by operation)
pub static STORE_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "delayq_store_errors_total",
            "Store errors observed by consumer poll loops"
        ),
        &["operation"]
    )
    .expect("Failed to register STORE_ERRORS_TOTAL metric")
});

// ============================================================================
// Metrics Collection
// ============================================================================

/// Gather all registered metrics and encode as Prometheus text format
pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    Ok(encoder.encode_to_string(&metric_families)?)
}
