//! Synthetic metrology record generator.
//!
//! This crate provides the [`RecordGenerator`] which produces one
//! [`MetrologyRecord`](metrology_core::MetrologyRecord) per process step for a
//! wafer. Randomness comes from an explicit RNG so tests can seed it and get
//! the same widths and defect counts on every run.
//!
//! # Architecture
//!
//! ```text
//!  (wafer_id, lot_id, step_count)
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ RecordGenerator  │
//! │                  │
//! │  - rng (StdRng)  │
//! │  - clock         │
//! └────────┬─────────┘
//!          │
//!          ▼
//!    Vec<MetrologyRecord>  Step_00 .. Step_{N-1}
//! ```
//!
//! # Example
//!
//! ```rust
//! use metrology_generator::RecordGenerator;
//!
//! let mut generator = RecordGenerator::seeded(42);
//! let records = generator.generate("WAFER_01", "LOT_A_2025", 10);
//! assert_eq!(records.len(), 10);
//! assert_eq!(records[0].process_step, "Step_00");
//! ```

pub mod generator;
pub mod generators;

// Re-exports for convenience
pub use generator::{step_label, wafer_id, RecordGenerator};
pub use generators::numeric::{DEFECT_COUNT_RANGE, LINE_WIDTH_RANGE_NM};
