//! Core types for the wafer-metrology pipeline.
//!
//! This crate provides the foundational types shared by the generator,
//! loader, aggregator and warehouse backends:
//!
//! - [`MetrologyRecord`] - One measurement event for a wafer at a process step
//! - [`AggregateRow`] - Per-step statistics for a lot
//! - [`WarehouseValue`] / [`Table`] - Bound parameters and tabular query results
//! - [`WarehouseClient`] - The store abstraction every backend implements
//! - [`sql`] - Statement builders for the `wafer_metrology` table
//!
//! # Architecture
//!
//! ```text
//! metrology-core (this crate)
//!    │
//!    ├─── metrology-generator   (produces MetrologyRecord)
//!    ├─── metrology-loader      (MetrologyRecord -> execute_batch)
//!    ├─── metrology-analyze     (query_as_table -> AggregateRow)
//!    │
//!    ├─── warehouse-postgresql  (implements WarehouseClient)
//!    └─── warehouse-sqlite      (implements WarehouseClient)
//! ```

pub mod client;
pub mod error;
pub mod record;
pub mod sql;
pub mod testing;
pub mod value;

// Re-exports for convenience
pub use client::{Statement, WarehouseClient};
pub use error::{MetrologyError, RecordError, WarehouseError};
pub use record::{AggregateRow, MetrologyRecord};
pub use value::{Table, WarehouseValue};
