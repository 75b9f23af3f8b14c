//! Measurement and aggregate row types.

use crate::error::RecordError;
use crate::value::WarehouseValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One process-metrology measurement event for a wafer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetrologyRecord {
    /// Physical wafer identifier, stable across steps.
    pub wafer_id: String,
    /// Production lot the wafer belongs to.
    pub lot_id: String,
    /// Ordinal step label (`Step_00` ... `Step_NN`).
    pub process_step: String,
    /// Capture time.
    pub event_timestamp: DateTime<Utc>,
    /// Measured feature width in nanometres.
    pub line_width_nm: f64,
    /// Defects detected at this step.
    pub defect_count: u32,
}

impl MetrologyRecord {
    /// Check the record against the data-model invariants.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.wafer_id.is_empty() {
            return Err(RecordError::EmptyField("wafer_id"));
        }
        if self.lot_id.is_empty() {
            return Err(RecordError::EmptyField("lot_id"));
        }
        if self.process_step.is_empty() {
            return Err(RecordError::EmptyField("process_step"));
        }
        if !self.line_width_nm.is_finite() {
            return Err(RecordError::NonFiniteLineWidth(self.line_width_nm));
        }
        if i32::try_from(self.defect_count).is_err() {
            return Err(RecordError::DefectCountOutOfRange(self.defect_count));
        }
        Ok(())
    }

    /// Bind values in `wafer_metrology` column order:
    /// `(WAFER_ID, LOT_ID, PROCESS_STEP, EVENT_TIMESTAMP, LINE_WIDTH_NM, DEFECT_COUNT)`.
    ///
    /// The timestamp is stored timezone-naive in UTC.
    pub fn to_row(&self) -> Result<Vec<WarehouseValue>, RecordError> {
        let defect_count = i32::try_from(self.defect_count)
            .map_err(|_| RecordError::DefectCountOutOfRange(self.defect_count))?;
        Ok(vec![
            WarehouseValue::Text(self.wafer_id.clone()),
            WarehouseValue::Text(self.lot_id.clone()),
            WarehouseValue::Text(self.process_step.clone()),
            WarehouseValue::Timestamp(self.event_timestamp.naive_utc()),
            WarehouseValue::Float64(self.line_width_nm),
            WarehouseValue::Int32(defect_count),
        ])
    }
}

/// Per-step statistics computed for one lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    pub process_step: String,
    /// Mean of `defect_count` over every record of the step, zeros included.
    pub avg_defects: f64,
    /// Mean of `line_width_nm` over every record of the step.
    pub avg_line_width: f64,
}
