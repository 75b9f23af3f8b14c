//! Batch loader for wafer metrology records.
//!
//! A wafer's records are validated, converted to bind rows and submitted
//! with a single `execute_batch` call, so the round trip to the warehouse is
//! paid once per wafer instead of once per row.

pub mod loader;
pub mod metrics;

pub use loader::BatchLoader;
pub use metrics::{BatchReport, LoadMetrics};
