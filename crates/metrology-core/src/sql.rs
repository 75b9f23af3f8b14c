//! Statement builders for the `wafer_metrology` table.
//!
//! All statements use `$n` placeholders, which both PostgreSQL and SQLite
//! accept. Result columns are aliased with quoted upper-case names so every
//! backend returns `PROCESS_STEP`, `AVG_DEFECTS` and `AVG_LINE_WIDTH` verbatim.

use crate::client::Statement;
use crate::error::WarehouseError;

/// Name of the metrology fact table.
pub const TABLE_NAME: &str = "wafer_metrology";

/// Insert column order, matching [`MetrologyRecord::to_row`](crate::MetrologyRecord::to_row).
pub const INSERT_COLUMNS: [&str; 6] = [
    "WAFER_ID",
    "LOT_ID",
    "PROCESS_STEP",
    "EVENT_TIMESTAMP",
    "LINE_WIDTH_NM",
    "DEFECT_COUNT",
];

pub const COL_PROCESS_STEP: &str = "PROCESS_STEP";
pub const COL_AVG_DEFECTS: &str = "AVG_DEFECTS";
pub const COL_AVG_LINE_WIDTH: &str = "AVG_LINE_WIDTH";
pub const COL_ROW_COUNT: &str = "ROW_COUNT";

/// Generate CREATE TABLE statement.
pub fn create_table_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {TABLE_NAME} (\n    \
         WAFER_ID VARCHAR(255) NOT NULL,\n    \
         LOT_ID VARCHAR(255) NOT NULL,\n    \
         PROCESS_STEP VARCHAR(255) NOT NULL,\n    \
         EVENT_TIMESTAMP TIMESTAMP NOT NULL,\n    \
         LINE_WIDTH_NM DOUBLE PRECISION NOT NULL,\n    \
         DEFECT_COUNT INTEGER NOT NULL CHECK (DEFECT_COUNT >= 0)\n)"
    )
}

/// Generate the lot index statement. Every analysis filters on LOT_ID.
pub fn create_lot_index_sql() -> String {
    format!("CREATE INDEX IF NOT EXISTS {TABLE_NAME}_lot_idx ON {TABLE_NAME} (LOT_ID)")
}

/// Generate DROP TABLE statement.
pub fn drop_table_sql() -> String {
    format!("DROP TABLE IF EXISTS {TABLE_NAME}")
}

/// All statements needed to bring up an empty table.
pub fn create_table_statements() -> Vec<Statement> {
    vec![
        Statement::new(create_table_sql()),
        Statement::new(create_lot_index_sql()),
    ]
}

/// Generate the parameterized single-row INSERT used for batch submission.
pub fn insert_sql() -> String {
    let placeholders: Vec<String> = (1..=INSERT_COLUMNS.len())
        .map(|i| format!("${i}"))
        .collect();
    format!(
        "INSERT INTO {TABLE_NAME} ({}) VALUES ({})",
        INSERT_COLUMNS.join(", "),
        placeholders.join(", ")
    )
}

/// Per-step averages for one lot, highest mean defect count first.
///
/// Groups with equal `AVG_DEFECTS` come back in `PROCESS_STEP` order.
pub fn analysis_statement(lot_id: &str) -> Statement {
    Statement::new(format!(
        "SELECT PROCESS_STEP AS \"{COL_PROCESS_STEP}\", \
         CAST(AVG(DEFECT_COUNT) AS DOUBLE PRECISION) AS \"{COL_AVG_DEFECTS}\", \
         CAST(AVG(LINE_WIDTH_NM) AS DOUBLE PRECISION) AS \"{COL_AVG_LINE_WIDTH}\" \
         FROM {TABLE_NAME} \
         WHERE LOT_ID = $1 \
         GROUP BY PROCESS_STEP \
         ORDER BY \"{COL_AVG_DEFECTS}\" DESC, \"{COL_PROCESS_STEP}\" ASC"
    ))
    .bind(lot_id)
}

/// Number of stored records for one lot.
pub fn row_count_statement(lot_id: &str) -> Statement {
    Statement::new(format!(
        "SELECT COUNT(*) AS \"{COL_ROW_COUNT}\" FROM {TABLE_NAME} WHERE LOT_ID = $1"
    ))
    .bind(lot_id)
}

/// Quote an identifier for statements that cannot take bound values
/// (schema selection).
pub fn quote_identifier(name: &str) -> Result<String, WarehouseError> {
    if name.is_empty() {
        return Err(WarehouseError::Rejected(
            "identifier must not be empty".to_string(),
        ));
    }
    if name.contains('"') || name.contains('\0') {
        return Err(WarehouseError::Rejected(format!(
            "identifier {name:?} contains a quote or NUL character"
        )));
    }
    Ok(format!("\"{name}\""))
}
