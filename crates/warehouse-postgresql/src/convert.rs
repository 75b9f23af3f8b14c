//! Conversions between warehouse values and tokio-postgres types.

use chrono::NaiveDateTime;
use metrology_core::{WarehouseError, WarehouseValue};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::Row;

/// Convert a WarehouseValue to a boxed ToSql trait object.
pub(crate) fn value_to_boxed(value: &WarehouseValue) -> Box<dyn ToSql + Sync + Send> {
    match value {
        WarehouseValue::Null => Box::new(None::<String>),
        WarehouseValue::Text(s) => Box::new(s.clone()),
        WarehouseValue::Int32(i) => Box::new(*i),
        WarehouseValue::Int64(i) => Box::new(*i),
        WarehouseValue::Float64(f) => Box::new(*f),
        WarehouseValue::Timestamp(ts) => Box::new(*ts),
    }
}

/// Box every value of a parameter list.
pub(crate) fn boxed_params(values: &[WarehouseValue]) -> Vec<Box<dyn ToSql + Sync + Send>> {
    values.iter().map(value_to_boxed).collect()
}

/// Borrow boxed parameters in the shape tokio-postgres expects.
pub(crate) fn param_refs(params: &[Box<dyn ToSql + Sync + Send>]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect()
}

/// Read one cell of a result row.
pub(crate) fn cell_value(row: &Row, idx: usize) -> Result<WarehouseValue, WarehouseError> {
    let column = &row.columns()[idx];
    let ty = column.type_();
    let decode_err = |e: tokio_postgres::Error| {
        WarehouseError::Decode(format!("column '{}': {e}", column.name()))
    };

    let value = if [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME].contains(ty) {
        row.try_get::<_, Option<String>>(idx)
            .map_err(decode_err)?
            .map(WarehouseValue::Text)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)
            .map_err(decode_err)?
            .map(|i| WarehouseValue::Int32(i32::from(i)))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)
            .map_err(decode_err)?
            .map(WarehouseValue::Int32)
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)
            .map_err(decode_err)?
            .map(WarehouseValue::Int64)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)
            .map_err(decode_err)?
            .map(|f| WarehouseValue::Float64(f64::from(f)))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)
            .map_err(decode_err)?
            .map(WarehouseValue::Float64)
    } else if *ty == Type::NUMERIC {
        match row.try_get::<_, Option<Decimal>>(idx).map_err(decode_err)? {
            Some(d) => Some(WarehouseValue::Float64(d.to_f64().ok_or_else(|| {
                WarehouseError::Decode(format!("column '{}': {d} out of f64 range", column.name()))
            })?)),
            None => None,
        }
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<NaiveDateTime>>(idx)
            .map_err(decode_err)?
            .map(WarehouseValue::Timestamp)
    } else {
        return Err(WarehouseError::Decode(format!(
            "column '{}' has unsupported type {}",
            column.name(),
            ty
        )));
    };

    Ok(value.unwrap_or(WarehouseValue::Null))
}

/// Map a driver error onto the warehouse error taxonomy.
pub(crate) fn classify(error: tokio_postgres::Error) -> WarehouseError {
    let io_failure = std::error::Error::source(&error)
        .and_then(|source| source.downcast_ref::<std::io::Error>())
        .is_some();

    if error.is_closed() || io_failure {
        WarehouseError::Connectivity(error.to_string())
    } else if let Some(db_error) = error.as_db_error() {
        WarehouseError::Rejected(format!("{} ({})", db_error.message(), db_error.code().code()))
    } else {
        WarehouseError::Rejected(error.to_string())
    }
}
