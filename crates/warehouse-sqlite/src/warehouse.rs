//! SQLite warehouse client.

use metrology_core::{Statement, Table, WarehouseClient, WarehouseError, WarehouseValue};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ErrorCode};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Path that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Warehouse client over one SQLite connection.
///
/// Every statement runs on the blocking thread pool while holding the
/// connection lock, so async workers never wait on SQLite I/O. Batches are
/// applied inside a transaction.
#[derive(Clone)]
pub struct SqliteWarehouse {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteWarehouse {
    /// Open (creating if needed) a database file, or an in-memory database
    /// for [`IN_MEMORY`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WarehouseError> {
        let path = path.as_ref();
        if path == Path::new(IN_MEMORY) {
            return Self::open_in_memory();
        }
        let conn = Connection::open(path).map_err(classify)?;
        info!("Opened SQLite warehouse at {}", path.display());
        Ok(Self::with_connection(conn))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, WarehouseError> {
        let conn = Connection::open_in_memory().map_err(classify)?;
        debug!("Opened in-memory SQLite warehouse");
        Ok(Self::with_connection(conn))
    }

    pub fn with_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, WarehouseError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, WarehouseError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            // A panic mid-transaction already rolled the transaction back.
            let mut conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut conn)
        })
        .await
        .map_err(|e| WarehouseError::Connectivity(format!("SQLite worker failed: {e}")))?
    }
}

#[async_trait::async_trait]
impl WarehouseClient for SqliteWarehouse {
    async fn execute(&self, statement: &Statement) -> Result<(), WarehouseError> {
        debug!("Execute: {}", statement.sql);
        let statement = statement.clone();
        self.with_conn(move |conn| run_execute(conn, &statement)).await
    }

    async fn execute_batch(
        &self,
        statement: &str,
        rows: &[Vec<WarehouseValue>],
    ) -> Result<u64, WarehouseError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let statement = statement.to_string();
        let rows = rows.to_vec();
        let inserted = self
            .with_conn(move |conn| run_batch(conn, &statement, &rows))
            .await?;
        debug!("Batch committed: {} rows", inserted);
        Ok(inserted)
    }

    async fn query_as_table(&self, statement: &Statement) -> Result<Table, WarehouseError> {
        debug!("Query: {}", statement.sql);
        let statement = statement.clone();
        self.with_conn(move |conn| run_query(conn, &statement)).await
    }
}

fn run_execute(conn: &Connection, statement: &Statement) -> Result<(), WarehouseError> {
    if statement.params.is_empty() {
        conn.execute_batch(&statement.sql).map_err(classify)
    } else {
        conn.execute(&statement.sql, params_from_iter(to_sql_values(&statement.params)))
            .map(|_| ())
            .map_err(classify)
    }
}

fn run_batch(
    conn: &mut Connection,
    statement: &str,
    rows: &[Vec<WarehouseValue>],
) -> Result<u64, WarehouseError> {
    let tx = conn.transaction().map_err(classify)?;
    let mut inserted = 0u64;
    {
        let mut prepared = tx.prepare(statement).map_err(classify)?;
        for row in rows {
            inserted += prepared
                .execute(params_from_iter(to_sql_values(row)))
                .map_err(classify)? as u64;
        }
    }
    // Dropping an uncommitted transaction rolls it back.
    tx.commit().map_err(classify)?;
    Ok(inserted)
}

fn run_query(conn: &Connection, statement: &Statement) -> Result<Table, WarehouseError> {
    let mut prepared = conn.prepare(&statement.sql).map_err(classify)?;
    let columns: Vec<String> = prepared
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let column_count = columns.len();

    let mut result = prepared
        .query(params_from_iter(to_sql_values(&statement.params)))
        .map_err(classify)?;

    let mut rows = Vec::new();
    while let Some(row) = result.next().map_err(classify)? {
        let values = (0..column_count)
            .map(|idx| {
                let value = row.get_ref(idx).map_err(classify)?;
                from_value_ref(value, &columns[idx])
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(values);
    }

    Ok(Table::new(columns).with_rows(rows))
}

fn to_sql_values(values: &[WarehouseValue]) -> Vec<Value> {
    values
        .iter()
        .map(|value| match value {
            WarehouseValue::Null => Value::Null,
            WarehouseValue::Text(s) => Value::Text(s.clone()),
            WarehouseValue::Int32(i) => Value::Integer(i64::from(*i)),
            WarehouseValue::Int64(i) => Value::Integer(*i),
            WarehouseValue::Float64(f) => Value::Real(*f),
            WarehouseValue::Timestamp(ts) => Value::Text(ts.format(TIMESTAMP_FORMAT).to_string()),
        })
        .collect()
}

fn from_value_ref(value: ValueRef<'_>, column: &str) -> Result<WarehouseValue, WarehouseError> {
    match value {
        ValueRef::Null => Ok(WarehouseValue::Null),
        ValueRef::Integer(i) => Ok(WarehouseValue::Int64(i)),
        ValueRef::Real(f) => Ok(WarehouseValue::Float64(f)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| WarehouseValue::Text(s.to_string()))
            .map_err(|e| WarehouseError::Decode(format!("column '{column}': {e}"))),
        ValueRef::Blob(_) => Err(WarehouseError::Decode(format!(
            "column '{column}' holds a blob"
        ))),
    }
}

/// Map a rusqlite error onto the warehouse error taxonomy.
fn classify(error: rusqlite::Error) -> WarehouseError {
    match &error {
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(
                failure.code,
                ErrorCode::CannotOpen
                    | ErrorCode::NotADatabase
                    | ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::SystemIoFailure
            ) =>
        {
            WarehouseError::Connectivity(error.to_string())
        }
        _ => WarehouseError::Rejected(error.to_string()),
    }
}
