//! Lot aggregation for wafer metrology.
//!
//! This crate issues the grouped analysis query for one lot and decodes the
//! returned table into [`AggregateRow`](metrology_core::AggregateRow)s.
//!
//! # Example
//!
//! ```ignore
//! use metrology_analyze::LotAggregator;
//!
//! let rows = LotAggregator::new(&warehouse).analyze("LOT_A_2025").await?;
//! for row in &rows {
//!     println!("{} {:.2} {:.3}", row.process_step, row.avg_defects, row.avg_line_width);
//! }
//! ```

pub mod aggregator;
pub mod report;

pub use aggregator::{decode_aggregate_rows, LotAggregator};
pub use report::LotReport;
