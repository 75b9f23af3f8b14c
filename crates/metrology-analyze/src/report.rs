//! Lot report assembled from aggregate rows.

use metrology_core::AggregateRow;
use serde::Serialize;

/// Analysis result for one lot, in query order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotReport {
    pub lot_id: String,
    pub rows: Vec<AggregateRow>,
}

impl LotReport {
    pub fn new(lot_id: impl Into<String>, rows: Vec<AggregateRow>) -> Self {
        Self {
            lot_id: lot_id.into(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Step with the highest mean defect count (first row).
    pub fn worst_step(&self) -> Option<&AggregateRow> {
        self.rows.first()
    }

    /// Mean line width across steps, weighting each step equally.
    pub fn mean_line_width(&self) -> Option<f64> {
        if self.rows.is_empty() {
            return None;
        }
        let total: f64 = self.rows.iter().map(|r| r.avg_line_width).sum();
        Some(total / self.rows.len() as f64)
    }
}
