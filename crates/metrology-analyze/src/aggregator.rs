//! Grouped per-step aggregation for a lot.

use metrology_core::sql::{
    self, COL_AVG_DEFECTS, COL_AVG_LINE_WIDTH, COL_PROCESS_STEP, COL_ROW_COUNT,
};
use metrology_core::{AggregateRow, MetrologyError, Table, WarehouseClient, WarehouseError};
use std::time::Instant;
use tracing::{debug, info};

/// Aggregator running the lot analysis query.
///
/// Stateless: results depend only on the lot id and the store's content.
pub struct LotAggregator<'a, W: WarehouseClient + ?Sized> {
    client: &'a W,
}

impl<'a, W: WarehouseClient + ?Sized> LotAggregator<'a, W> {
    pub fn new(client: &'a W) -> Self {
        Self { client }
    }

    /// Per-step mean defect count and mean line width for `lot_id`,
    /// highest mean defect count first.
    ///
    /// A lot with no records yields an empty vector, not an error.
    pub async fn analyze(&self, lot_id: &str) -> Result<Vec<AggregateRow>, MetrologyError> {
        if lot_id.is_empty() {
            return Err(MetrologyError::Query {
                lot_id: String::new(),
                reason: "lot id must not be empty".to_string(),
            });
        }

        let statement = sql::analysis_statement(lot_id);
        debug!("Analysis query: {}", statement.sql);

        let start = Instant::now();
        let table = self
            .client
            .query_as_table(&statement)
            .await
            .map_err(|e| MetrologyError::query(lot_id, e))?;
        let rows = decode_aggregate_rows(&table).map_err(|e| MetrologyError::query(lot_id, e))?;

        info!(
            "Analyzed lot '{}': {} process steps in {:?}",
            lot_id,
            rows.len(),
            start.elapsed()
        );
        Ok(rows)
    }

    /// Number of stored records for `lot_id`.
    pub async fn record_count(&self, lot_id: &str) -> Result<u64, MetrologyError> {
        let table = self
            .client
            .query_as_table(&sql::row_count_statement(lot_id))
            .await
            .map_err(|e| MetrologyError::query(lot_id, e))?;

        let decode = || -> Result<u64, WarehouseError> {
            let column = table.column_index(COL_ROW_COUNT)?;
            let value = table.value(0, column)?;
            value
                .as_i64()
                .and_then(|count| u64::try_from(count).ok())
                .ok_or_else(|| {
                    WarehouseError::Decode(format!("expected row count, got {}", value.type_name()))
                })
        };
        decode().map_err(|e| MetrologyError::query(lot_id, e))
    }
}

/// Decode an analysis result table, keeping the store's row order.
pub fn decode_aggregate_rows(table: &Table) -> Result<Vec<AggregateRow>, WarehouseError> {
    // Some drivers omit column metadata for empty results.
    if table.is_empty() {
        return Ok(Vec::new());
    }
    let step = table.column_index(COL_PROCESS_STEP)?;
    let defects = table.column_index(COL_AVG_DEFECTS)?;
    let width = table.column_index(COL_AVG_LINE_WIDTH)?;

    (0..table.len())
        .map(|row| {
            Ok(AggregateRow {
                process_step: table.text(row, step)?,
                avg_defects: table.float(row, defects)?,
                avg_line_width: table.float(row, width)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrology_core::testing::{RecordedCall, ScriptedWarehouse};
    use metrology_core::WarehouseValue;

    fn analysis_table(rows: &[(&str, f64, f64)]) -> Table {
        Table::new(vec![
            COL_PROCESS_STEP.to_string(),
            COL_AVG_DEFECTS.to_string(),
            COL_AVG_LINE_WIDTH.to_string(),
        ])
        .with_rows(
            rows.iter()
                .map(|(step, defects, width)| {
                    vec![
                        WarehouseValue::from(*step),
                        WarehouseValue::Float64(*defects),
                        WarehouseValue::Float64(*width),
                    ]
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_issues_single_bound_query() {
        let warehouse = ScriptedWarehouse::new();
        let aggregator = LotAggregator::new(&warehouse);

        let rows = aggregator.analyze("LOT_A_2025").await.unwrap();

        assert!(rows.is_empty());
        let calls = warehouse.calls();
        assert_eq!(calls.len(), 1);
        match &calls[0] {
            RecordedCall::Query(statement) => {
                assert!(statement.sql.contains("WHERE LOT_ID = $1"));
                assert!(!statement.sql.contains("LOT_A_2025"));
                assert_eq!(statement.params, vec![WarehouseValue::from("LOT_A_2025")]);
            }
            other => panic!("Expected query call, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decodes_rows_in_store_order() {
        let warehouse = ScriptedWarehouse::new();
        warehouse.push_query_result(Ok(analysis_table(&[
            ("Step_02", 4.0, 51.01),
            ("Step_00", 4.0, 50.98),
            ("Step_03", 2.0, 51.10),
            ("Step_01", 1.0, 50.75),
        ])));

        let rows = LotAggregator::new(&warehouse)
            .analyze("LOT_A_2025")
            .await
            .unwrap();

        let steps: Vec<&str> = rows.iter().map(|r| r.process_step.as_str()).collect();
        assert_eq!(steps, vec!["Step_02", "Step_00", "Step_03", "Step_01"]);
        assert_eq!(rows[2].avg_defects, 2.0);
        assert_eq!(rows[3].avg_line_width, 50.75);
    }

    #[test]
    fn test_integer_averages_accepted() {
        let table = Table::new(vec![
            "process_step".to_string(),
            "avg_defects".to_string(),
            "avg_line_width".to_string(),
        ])
        .with_rows(vec![vec![
            WarehouseValue::from("Step_00"),
            WarehouseValue::Int64(3),
            WarehouseValue::Float64(51.0),
        ]]);

        let rows = decode_aggregate_rows(&table).unwrap();
        assert_eq!(rows[0].avg_defects, 3.0);
    }

    #[tokio::test]
    async fn test_query_failure_surfaced() {
        let warehouse = ScriptedWarehouse::new();
        warehouse.push_query_result(Err(WarehouseError::Rejected("timeout".to_string())));

        let err = LotAggregator::new(&warehouse)
            .analyze("LOT_A_2025")
            .await
            .unwrap_err();

        match err {
            MetrologyError::Query { lot_id, reason } => {
                assert_eq!(lot_id, "LOT_A_2025");
                assert!(reason.contains("timeout"));
            }
            other => panic!("Expected query error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_result_is_query_error() {
        let warehouse = ScriptedWarehouse::new();
        warehouse.push_query_result(Ok(Table::new(vec!["PROCESS_STEP".to_string()])
            .with_rows(vec![vec![WarehouseValue::from("Step_00")]])));

        let err = LotAggregator::new(&warehouse)
            .analyze("LOT_A_2025")
            .await
            .unwrap_err();
        assert!(matches!(err, MetrologyError::Query { .. }));
    }

    #[tokio::test]
    async fn test_empty_lot_id_rejected_without_query() {
        let warehouse = ScriptedWarehouse::new();

        let err = LotAggregator::new(&warehouse).analyze("").await.unwrap_err();

        assert!(matches!(err, MetrologyError::Query { .. }));
        assert_eq!(warehouse.query_call_count(), 0);
    }

    #[tokio::test]
    async fn test_record_count() {
        let warehouse = ScriptedWarehouse::new();
        warehouse.push_query_result(Ok(Table::new(vec![COL_ROW_COUNT.to_string()])
            .with_rows(vec![vec![WarehouseValue::Int64(50)]])));

        let count = LotAggregator::new(&warehouse)
            .record_count("LOT_A_2025")
            .await
            .unwrap();
        assert_eq!(count, 50);
    }
}
