//! Error types for warehouse access and the metrology pipeline.

use thiserror::Error;

/// Errors raised by a [`WarehouseClient`](crate::WarehouseClient) implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WarehouseError {
    /// The store cannot be reached or the session was lost.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// The store refused the statement (schema mismatch, constraint, syntax).
    #[error("Statement rejected: {0}")]
    Rejected(String),

    /// A result value could not be converted to the requested type.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// A record that breaks one of the data-model invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("line width must be finite, got {0}")]
    NonFiniteLineWidth(f64),

    #[error("defect count {0} does not fit the DEFECT_COUNT column")]
    DefectCountOutOfRange(u32),
}

/// Errors surfaced by the loader and aggregator.
///
/// Every warehouse failure is passed upward; nothing is swallowed.
#[derive(Error, Debug)]
pub enum MetrologyError {
    /// The warehouse could not be reached while ingesting or querying.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// A batch submission was rejected. No rows of the batch count as ingested.
    #[error("Ingestion of wafer '{wafer_id}' failed: {source}")]
    Ingestion {
        wafer_id: String,
        #[source]
        source: WarehouseError,
    },

    /// The analysis query failed. Distinct from an empty result.
    #[error("Analysis query for lot '{lot_id}' failed: {reason}")]
    Query { lot_id: String, reason: String },

    /// A record failed validation before it was submitted.
    #[error("Invalid record for wafer '{wafer_id}' at {process_step}: {source}")]
    InvalidRecord {
        wafer_id: String,
        process_step: String,
        #[source]
        source: RecordError,
    },

    #[error("Invalid lot plan: {0}")]
    InvalidPlan(String),
}

impl MetrologyError {
    /// Classify a warehouse failure raised while ingesting a wafer's batch.
    pub fn ingestion(wafer_id: impl Into<String>, error: WarehouseError) -> Self {
        match error {
            WarehouseError::Connectivity(reason) => Self::Connectivity(reason),
            other => Self::Ingestion {
                wafer_id: wafer_id.into(),
                source: other,
            },
        }
    }

    /// Classify a warehouse failure raised while querying a lot.
    pub fn query(lot_id: impl Into<String>, error: WarehouseError) -> Self {
        match error {
            WarehouseError::Connectivity(reason) => Self::Connectivity(reason),
            other => Self::Query {
                lot_id: lot_id.into(),
                reason: other.to_string(),
            },
        }
    }

    /// Whether resubmitting the same work could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connectivity(_) | Self::Ingestion { .. })
    }

    /// Whether a batch was submitted and the store failed it. Records
    /// rejected before submission do not count.
    pub fn is_batch_failure(&self) -> bool {
        matches!(self, Self::Connectivity(_) | Self::Ingestion { .. })
    }
}
