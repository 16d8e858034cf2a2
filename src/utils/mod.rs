// Utils

pub mod common;
pub mod json;
pub mod prometheus_metrics;
