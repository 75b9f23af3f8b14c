//! Wafer metrology ETL and reporting.
//!
//! Simulates per-wafer process-metrology events, bulk-loads them into a
//! warehouse table and reports per-step statistics for a production lot.
//!
//! # Pipeline
//!
//! ```text
//! for each wafer in the lot:
//!     RecordGenerator ──► BatchLoader ──► WarehouseClient::execute_batch
//! barrier (all wafers confirmed)
//! LotAggregator ──► WarehouseClient::query_as_table ──► Vec<AggregateRow>
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Simulate a lot against an embedded database and print the report
//! wafer-metrology simulate --backend sqlite --sqlite-path fab.db --lot-id LOT_A_2025
//!
//! # Same against PostgreSQL, four wafers in flight at once
//! wafer-metrology simulate --backend postgresql \
//!   --postgresql-connection-string "host=localhost user=postgres password=postgres dbname=fab" \
//!   --schema metrology --concurrency 4
//!
//! # Re-run the analysis only
//! wafer-metrology analyze --backend sqlite --sqlite-path fab.db --lot-id LOT_A_2025 --format json
//! ```

pub mod args;
pub mod connect;
pub mod pipeline;
pub mod render;

pub use args::{AnalyzeArgs, Backend, InitArgs, OutputFormat, SimulateArgs, WarehouseArgs};
pub use pipeline::{prepare_table, run_lot, LotOutcome, LotPlan, WaferFailure, WaferLoad};
