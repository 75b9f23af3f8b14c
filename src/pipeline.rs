//! Lot pipeline: generate and ingest every wafer, then analyze the lot once.

use futures::stream::{self, StreamExt};
use metrology_analyze::LotAggregator;
use metrology_core::{sql, AggregateRow, MetrologyError, WarehouseClient, WarehouseError};
use metrology_generator::{wafer_id, RecordGenerator};
use metrology_loader::{BatchLoader, BatchReport, LoadMetrics};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Parameters for simulating one lot.
#[derive(Debug, Clone, PartialEq)]
pub struct LotPlan {
    pub lot_id: String,
    pub wafer_count: u32,
    pub step_count: u32,
    /// Base seed; wafer `i` draws from `seed + i`.
    pub seed: u64,
    /// Wafer batches in flight at once (at least 1).
    pub concurrency: usize,
    /// Total attempts per wafer batch (at least 1).
    pub max_attempts: u32,
}

impl Default for LotPlan {
    fn default() -> Self {
        Self {
            lot_id: "LOT_A_2025".to_string(),
            wafer_count: 5,
            step_count: 10,
            seed: 42,
            concurrency: 1,
            max_attempts: 1,
        }
    }
}

/// A wafer whose records were all stored.
#[derive(Debug, Clone, PartialEq)]
pub struct WaferLoad {
    pub wafer_id: String,
    pub rows: u64,
    pub attempts: u32,
}

/// A wafer whose batch was never acknowledged. None of its rows count as ingested.
#[derive(Debug)]
pub struct WaferFailure {
    pub wafer_id: String,
    pub attempts: u32,
    pub error: MetrologyError,
}

/// Result of running a lot.
#[derive(Debug)]
pub struct LotOutcome {
    pub lot_id: String,
    pub ingested: Vec<WaferLoad>,
    pub failed: Vec<WaferFailure>,
    pub metrics: LoadMetrics,
    /// Present only when every wafer was ingested.
    pub analysis: Option<Vec<AggregateRow>>,
}

impl LotOutcome {
    /// Whether every wafer of the lot was ingested.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_wafer_ids(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.wafer_id.as_str()).collect()
    }
}

/// Create the metrology table, dropping an existing one first if `replace`.
pub async fn prepare_table<W: WarehouseClient + ?Sized>(
    client: &W,
    replace: bool,
) -> Result<(), WarehouseError> {
    if replace {
        info!("Dropping table: {}", sql::TABLE_NAME);
        client
            .execute(&metrology_core::Statement::new(sql::drop_table_sql()))
            .await?;
    }
    info!("Creating table: {}", sql::TABLE_NAME);
    for statement in sql::create_table_statements() {
        client.execute(&statement).await?;
    }
    Ok(())
}

/// Generate and ingest every wafer of the lot, then analyze it.
///
/// Analysis runs only after every wafer batch has been confirmed. If any
/// wafer failed, the already-ingested wafers stay in place, the failures are
/// returned by wafer id, and no analysis is attempted.
pub async fn run_lot<W: WarehouseClient + ?Sized>(
    client: &W,
    plan: &LotPlan,
) -> Result<LotOutcome, MetrologyError> {
    let mut outcome = ingest_lot(client, plan).await?;

    if !outcome.is_complete() {
        error!(
            "Lot '{}' incomplete, skipping analysis; failed wafers: {:?}",
            plan.lot_id,
            outcome.failed_wafer_ids()
        );
        return Ok(outcome);
    }

    let rows = LotAggregator::new(client).analyze(&plan.lot_id).await?;
    outcome.analysis = Some(rows);
    Ok(outcome)
}

/// Generate and ingest every wafer of the lot without analyzing it.
pub async fn ingest_lot<W: WarehouseClient + ?Sized>(
    client: &W,
    plan: &LotPlan,
) -> Result<LotOutcome, MetrologyError> {
    if plan.lot_id.is_empty() {
        return Err(MetrologyError::InvalidPlan("lot id must not be empty".to_string()));
    }
    if plan.step_count > 100 {
        warn!(
            "{} steps requested; labels past Step_99 do not sort in step order",
            plan.step_count
        );
    }

    let start = Instant::now();
    let concurrency = plan.concurrency.max(1);
    info!(
        "Loading lot '{}': {} wafers x {} steps (seed={}, concurrency={})",
        plan.lot_id, plan.wafer_count, plan.step_count, plan.seed, concurrency
    );

    let mut results: Vec<WaferResult> = stream::iter(0..plan.wafer_count)
        .map(|index| load_wafer(client, plan, index))
        .buffer_unordered(concurrency)
        .collect()
        .await;
    results.sort_by_key(|result| result.index);

    let mut outcome = LotOutcome {
        lot_id: plan.lot_id.clone(),
        ingested: Vec::new(),
        failed: Vec::new(),
        metrics: LoadMetrics::default(),
        analysis: None,
    };

    for result in results {
        outcome.metrics.generation_duration += result.generation_duration;
        for _ in 0..result.rejected_attempts {
            outcome.metrics.record_failure();
        }
        match result.outcome {
            Ok(report) => {
                outcome.metrics.record_batch(&report);
                outcome.ingested.push(WaferLoad {
                    wafer_id: result.wafer_id,
                    rows: report.rows,
                    attempts: result.attempts,
                });
            }
            Err(error) => outcome.failed.push(WaferFailure {
                wafer_id: result.wafer_id,
                attempts: result.attempts,
                error,
            }),
        }
    }
    outcome.metrics.total_duration = start.elapsed();

    info!(
        "Lot '{}' loaded: {} rows from {} wafers in {:?} ({:.2} rows/sec), {} wafers failed",
        plan.lot_id,
        outcome.metrics.rows_inserted,
        outcome.ingested.len(),
        outcome.metrics.total_duration,
        outcome.metrics.rows_per_second(),
        outcome.failed.len()
    );

    Ok(outcome)
}

struct WaferResult {
    index: u32,
    wafer_id: String,
    attempts: u32,
    rejected_attempts: u32,
    generation_duration: Duration,
    outcome: Result<BatchReport, MetrologyError>,
}

async fn load_wafer<W: WarehouseClient + ?Sized>(
    client: &W,
    plan: &LotPlan,
    index: u32,
) -> WaferResult {
    let wafer_id = wafer_id(index);

    let gen_start = Instant::now();
    let records = RecordGenerator::seeded(plan.seed.wrapping_add(u64::from(index))).generate(
        &wafer_id,
        &plan.lot_id,
        plan.step_count,
    );
    let generation_duration = gen_start.elapsed();

    let loader = BatchLoader::new(client);
    let max_attempts = plan.max_attempts.max(1);
    let mut attempts = 0;
    let mut rejected_attempts = 0;

    // The whole batch is resubmitted on retry; a rejected batch stored nothing.
    let outcome = loop {
        attempts += 1;
        match loader.ingest_timed(&records).await {
            Ok(report) => break Ok(report),
            Err(e) => {
                if e.is_batch_failure() {
                    rejected_attempts += 1;
                }
                if e.is_retryable() && attempts < max_attempts {
                    warn!(
                        "Wafer '{}' attempt {}/{} failed, retrying: {}",
                        wafer_id, attempts, max_attempts, e
                    );
                    continue;
                }
                error!("Wafer '{}' failed after {} attempts: {}", wafer_id, attempts, e);
                break Err(e);
            }
        }
    };

    WaferResult {
        index,
        wafer_id,
        attempts,
        rejected_attempts,
        generation_duration,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrology_core::testing::{RecordedCall, ScriptedWarehouse};

    fn plan(wafers: u32, steps: u32) -> LotPlan {
        LotPlan {
            wafer_count: wafers,
            step_count: steps,
            ..LotPlan::default()
        }
    }

    #[tokio::test]
    async fn test_one_batch_per_wafer_then_one_query() {
        let warehouse = ScriptedWarehouse::new();

        let outcome = run_lot(&warehouse, &plan(5, 10)).await.unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.ingested.len(), 5);
        assert_eq!(outcome.metrics.rows_inserted, 50);
        assert_eq!(outcome.metrics.batch_count, 5);
        assert_eq!(outcome.analysis, Some(Vec::new()));

        let calls = warehouse.calls();
        assert_eq!(calls.len(), 6);
        assert!(calls[..5]
            .iter()
            .all(|c| matches!(c, RecordedCall::Batch { rows, .. } if rows.len() == 10)));
        assert!(matches!(calls[5], RecordedCall::Query(_)));
    }

    #[tokio::test]
    async fn test_failed_wafer_skips_analysis() {
        let warehouse = ScriptedWarehouse::new();
        warehouse.fail_batches_for(
            "WAFER_03",
            1,
            WarehouseError::Rejected("constraint".to_string()),
        );

        let outcome = run_lot(&warehouse, &plan(5, 10)).await.unwrap();

        assert!(!outcome.is_complete());
        assert_eq!(outcome.failed_wafer_ids(), vec!["WAFER_03"]);
        assert_eq!(outcome.ingested.len(), 4);
        assert_eq!(outcome.metrics.rows_inserted, 40);
        assert_eq!(outcome.metrics.failed_batches, 1);
        assert!(outcome.analysis.is_none());
        assert_eq!(warehouse.query_call_count(), 0);
    }

    #[tokio::test]
    async fn test_retry_resubmits_whole_batch() {
        let warehouse = ScriptedWarehouse::new();
        warehouse.fail_batches_for(
            "WAFER_02",
            2,
            WarehouseError::Connectivity("reset".to_string()),
        );

        let outcome = run_lot(
            &warehouse,
            &LotPlan {
                max_attempts: 3,
                ..plan(3, 4)
            },
        )
        .await
        .unwrap();

        assert!(outcome.is_complete());
        let wafer_2 = outcome
            .ingested
            .iter()
            .find(|w| w.wafer_id == "WAFER_02")
            .unwrap();
        assert_eq!(wafer_2.attempts, 3);
        assert_eq!(wafer_2.rows, 4);
        assert_eq!(outcome.metrics.failed_batches, 2);
        assert_eq!(warehouse.batch_call_count(), 5);
    }

    #[tokio::test]
    async fn test_invalid_lot_id_not_retried() {
        let warehouse = ScriptedWarehouse::new();
        let result = run_lot(
            &warehouse,
            &LotPlan {
                lot_id: String::new(),
                ..LotPlan::default()
            },
        )
        .await;

        assert!(matches!(result, Err(MetrologyError::InvalidPlan(_))));
        assert!(warehouse.calls().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_ingest_reports_sorted() {
        let warehouse = ScriptedWarehouse::new();

        let outcome = run_lot(
            &warehouse,
            &LotPlan {
                concurrency: 4,
                ..plan(8, 3)
            },
        )
        .await
        .unwrap();

        let ids: Vec<&str> = outcome.ingested.iter().map(|w| w.wafer_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "WAFER_01", "WAFER_02", "WAFER_03", "WAFER_04", "WAFER_05", "WAFER_06",
                "WAFER_07", "WAFER_08"
            ]
        );
        // The query is always issued last.
        assert!(matches!(
            warehouse.calls().last(),
            Some(RecordedCall::Query(_))
        ));
    }

    #[tokio::test]
    async fn test_wafers_reported_in_index_order_past_99() {
        let warehouse = ScriptedWarehouse::new();

        let outcome = ingest_lot(
            &warehouse,
            &LotPlan {
                concurrency: 8,
                ..plan(101, 1)
            },
        )
        .await
        .unwrap();

        let ids: Vec<&str> = outcome.ingested.iter().map(|w| w.wafer_id.as_str()).collect();
        assert_eq!(ids.len(), 101);
        assert_eq!(ids[8..11], ["WAFER_09", "WAFER_10", "WAFER_11"]);
        assert_eq!(ids[98..], ["WAFER_99", "WAFER_100", "WAFER_101"]);
    }

    #[tokio::test]
    async fn test_prepare_table_replace_drops_first() {
        let warehouse = ScriptedWarehouse::new();
        prepare_table(&warehouse, true).await.unwrap();

        let sqls: Vec<String> = warehouse
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Execute(statement) => Some(statement.sql),
                _ => None,
            })
            .collect();
        assert_eq!(sqls.len(), 3);
        assert_eq!(sqls[0], sql::drop_table_sql());
        assert_eq!(sqls[1], sql::create_table_sql());
    }
}
