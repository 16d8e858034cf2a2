// src/utils/prometheus_metrics.rs

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Gauge, Histogram,
};

// Driver
pub static IDS_ENQUEUED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "harvester_ids_enqueued_total",
        "Total number of movie identifiers placed on the work queue."
    )
    .expect("Failed to register IDS_ENQUEUED_TOTAL counter")
});

// Workers
pub static RECORDS_NORMALIZED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "harvester_records_normalized_total",
        "Total number of records fetched and normalized successfully."
    )
    .expect("Failed to register RECORDS_NORMALIZED_TOTAL counter")
});

pub static FETCH_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "harvester_fetch_errors_total",
        "Total number of failed fetches, by error kind.",
        &["kind"]
    )
    .expect("Failed to register FETCH_ERRORS_TOTAL counter")
});

pub static NORMALIZE_ERRORS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "harvester_normalize_errors_total",
        "Total number of records dropped because they did not match the schema."
    )
    .expect("Failed to register NORMALIZE_ERRORS_TOTAL counter")
});

pub static RATE_LIMIT_CANCELLED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "harvester_rate_limit_cancelled_total",
        "Total number of rate limiter waits abandoned by cancellation."
    )
    .expect("Failed to register RATE_LIMIT_CANCELLED_TOTAL counter")
});

pub static RATE_LIMIT_WAIT_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "harvester_rate_limit_wait_seconds",
        "Histogram of time spent waiting for a rate limiter token."
    )
    .expect("Failed to register RATE_LIMIT_WAIT_SECONDS histogram")
});

pub static ACTIVE_FETCHES: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "harvester_active_fetches",
        "Number of outbound requests currently in flight."
    )
    .expect("Failed to register ACTIVE_FETCHES gauge")
});

pub static FETCH_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "harvester_fetch_duration_seconds",
        "Histogram of outbound request latencies."
    )
    .expect("Failed to register FETCH_DURATION_SECONDS histogram")
});

// Aggregator
pub static RECORDS_WRITTEN_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "harvester_records_written_total",
        "Total number of records durably written."
    )
    .expect("Failed to register RECORDS_WRITTEN_TOTAL counter")
});

pub static BATCHES_FLUSHED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "harvester_batches_flushed_total",
        "Total number of batches written successfully."
    )
    .expect("Failed to register BATCHES_FLUSHED_TOTAL counter")
});

pub static BATCH_WRITE_ERRORS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "harvester_batch_write_errors_total",
        "Total number of batches dropped after a failed write."
    )
    .expect("Failed to register BATCH_WRITE_ERRORS_TOTAL counter")
});

pub static FLUSH_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "harvester_flush_duration_seconds",
        "Histogram of batch write durations."
    )
    .expect("Failed to register FLUSH_DURATION_SECONDS histogram")
});
