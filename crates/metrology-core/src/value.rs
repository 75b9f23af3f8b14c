//! Bound parameter values and tabular query results.

use crate::error::WarehouseError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single value exchanged with the warehouse, either as a bound
/// statement parameter or as a cell of a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WarehouseValue {
    /// Text / VARCHAR value
    Text(String),

    /// 32-bit signed integer (INTEGER)
    Int32(i32),

    /// 64-bit signed integer (BIGINT, COUNT results)
    Int64(i64),

    /// 64-bit floating point (DOUBLE PRECISION)
    Float64(f64),

    /// Timezone-naive timestamp, interpreted as UTC
    Timestamp(NaiveDateTime),

    /// Null value
    Null,
}

impl WarehouseValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get this value as text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a float, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float64(f) => Some(*f),
            Self::Int32(i) => Some(f64::from(*i)),
            Self::Int64(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get this value as an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(i) => Some(i64::from(*i)),
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Short type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Float64(_) => "float64",
            Self::Timestamp(_) => "timestamp",
            Self::Null => "null",
        }
    }
}

impl From<&str> for WarehouseValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for WarehouseValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Result of a read query: named columns and positional rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<WarehouseValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<WarehouseValue>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matching exactly first and then ignoring case
    /// (stores that fold unquoted identifiers return lower-case names).
    pub fn column_index(&self, name: &str) -> Result<usize, WarehouseError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(name))
            })
            .ok_or_else(|| {
                WarehouseError::Decode(format!(
                    "column '{name}' not in result (columns: {:?})",
                    self.columns
                ))
            })
    }

    /// Cell at `row`, `column`.
    pub fn value(&self, row: usize, column: usize) -> Result<&WarehouseValue, WarehouseError> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .ok_or_else(|| WarehouseError::Decode(format!("no cell at row {row}, column {column}")))
    }

    /// Text cell; null and non-text values are decode errors.
    pub fn text(&self, row: usize, column: usize) -> Result<String, WarehouseError> {
        let value = self.value(row, column)?;
        value.as_str().map(str::to_string).ok_or_else(|| {
            WarehouseError::Decode(format!(
                "expected text at row {row}, column '{}', got {}",
                self.columns[column],
                value.type_name()
            ))
        })
    }

    /// Numeric cell widened to f64; null and non-numeric values are decode errors.
    pub fn float(&self, row: usize, column: usize) -> Result<f64, WarehouseError> {
        let value = self.value(row, column)?;
        value.as_f64().ok_or_else(|| {
            WarehouseError::Decode(format!(
                "expected number at row {row}, column '{}', got {}",
                self.columns[column],
                value.type_name()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(vec!["process_step".to_string(), "AVG_DEFECTS".to_string()]).with_rows(vec![
            vec![WarehouseValue::from("Step_00"), WarehouseValue::Float64(2.5)],
            vec![WarehouseValue::from("Step_01"), WarehouseValue::Int64(3)],
            vec![WarehouseValue::from("Step_02"), WarehouseValue::Null],
        ])
    }

    #[test]
    fn test_column_index_case_fallback() {
        let table = table();
        assert_eq!(table.column_index("PROCESS_STEP").unwrap(), 0);
        assert_eq!(table.column_index("AVG_DEFECTS").unwrap(), 1);
        assert!(matches!(
            table.column_index("AVG_LINE_WIDTH"),
            Err(WarehouseError::Decode(_))
        ));
    }

    #[test]
    fn test_float_widens_integers() {
        let table = table();
        assert_eq!(table.float(0, 1).unwrap(), 2.5);
        assert_eq!(table.float(1, 1).unwrap(), 3.0);
    }

    #[test]
    fn test_null_is_decode_error() {
        let table = table();
        assert!(matches!(table.float(2, 1), Err(WarehouseError::Decode(_))));
        assert!(matches!(table.text(0, 1), Err(WarehouseError::Decode(_))));
        assert!(matches!(table.value(9, 0), Err(WarehouseError::Decode(_))));
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(WarehouseValue::Int32(7).as_i64(), Some(7));
        assert_eq!(WarehouseValue::Float64(1.5).as_i64(), None);
        assert!(WarehouseValue::Null.is_null());
        assert_eq!(WarehouseValue::from("x").as_str(), Some("x"));
    }
}
