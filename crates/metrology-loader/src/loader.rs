//! Batched INSERT submission.

use crate::metrics::BatchReport;
use metrology_core::{sql, MetrologyError, MetrologyRecord, WarehouseClient, WarehouseError};
use std::time::Instant;
use tracing::{debug, error};

/// Loader submitting a wafer's records as one bulk insert.
///
/// Holds no state between calls; every `ingest` is independent.
pub struct BatchLoader<'a, W: WarehouseClient + ?Sized> {
    client: &'a W,
    insert_sql: String,
}

impl<'a, W: WarehouseClient + ?Sized> BatchLoader<'a, W> {
    pub fn new(client: &'a W) -> Self {
        Self {
            client,
            insert_sql: sql::insert_sql(),
        }
    }

    /// Ingest `records` and return the number of rows stored.
    ///
    /// An empty slice is a no-op returning 0. On failure nothing is counted
    /// as ingested.
    pub async fn ingest(&self, records: &[MetrologyRecord]) -> Result<u64, MetrologyError> {
        Ok(self.ingest_timed(records).await?.rows)
    }

    /// Like [`ingest`](Self::ingest), also reporting time spent in the store.
    pub async fn ingest_timed(
        &self,
        records: &[MetrologyRecord],
    ) -> Result<BatchReport, MetrologyError> {
        let Some(first) = records.first() else {
            debug!("Empty batch, nothing to ingest");
            return Ok(BatchReport {
                rows: 0,
                duration: Default::default(),
            });
        };
        let wafer_id = first.wafer_id.as_str();

        let rows = records
            .iter()
            .map(|record| {
                record
                    .validate()
                    .and_then(|()| record.to_row())
                    .map_err(|source| MetrologyError::InvalidRecord {
                        wafer_id: record.wafer_id.clone(),
                        process_step: record.process_step.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let start = Instant::now();
        let acknowledged = self
            .client
            .execute_batch(&self.insert_sql, &rows)
            .await
            .map_err(|e| {
                error!("Batch for wafer '{}' failed: {}", wafer_id, e);
                MetrologyError::ingestion(wafer_id, e)
            })?;
        let duration = start.elapsed();

        if acknowledged != rows.len() as u64 {
            let e = WarehouseError::Rejected(format!(
                "store acknowledged {acknowledged} of {} rows",
                rows.len()
            ));
            error!("Batch for wafer '{}' failed: {}", wafer_id, e);
            return Err(MetrologyError::ingestion(wafer_id, e));
        }

        debug!(
            "Ingested {} rows for wafer '{}' in {:?}",
            acknowledged, wafer_id, duration
        );

        Ok(BatchReport {
            rows: acknowledged,
            duration,
        })
    }
}
