//! WarehouseClient trait definition.
//!
//! Connection setup, authentication and teardown belong to the backend
//! crates; the pipeline only ever sees a value implementing this trait.

use crate::error::WarehouseError;
use crate::value::{Table, WarehouseValue};

/// SQL text plus the values bound to its `$1..$n` placeholders.
///
/// Values never get interpolated into the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<WarehouseValue>,
}

impl Statement {
    /// A statement without parameters (DDL, context selection).
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind the next positional parameter.
    pub fn bind(mut self, value: impl Into<WarehouseValue>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// Trait for talking to the metrology warehouse.
///
/// Implementations must tolerate concurrent calls from several tasks; the
/// pipeline may submit batches for different wafers at the same time.
///
/// # Usage Pattern
///
/// Pipeline code uses generics for static dispatch:
///
/// ```ignore
/// pub async fn ingest<W: WarehouseClient + ?Sized>(
///     client: &W,
///     records: &[MetrologyRecord],
/// ) -> Result<u64, MetrologyError> {
///     client.execute_batch(&sql::insert_sql(), &rows).await?;
/// }
/// ```
#[async_trait::async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Run a DDL or control statement.
    async fn execute(&self, statement: &Statement) -> Result<(), WarehouseError>;

    /// Run a parameterized insert once per row tuple, as one bulk operation.
    ///
    /// Returns the number of rows acknowledged by the store. On error no row
    /// of the batch may be reported as ingested.
    async fn execute_batch(
        &self,
        statement: &str,
        rows: &[Vec<WarehouseValue>],
    ) -> Result<u64, WarehouseError>;

    /// Run a read query and collect the full result.
    async fn query_as_table(&self, statement: &Statement) -> Result<Table, WarehouseError>;
}

#[async_trait::async_trait]
impl<W: WarehouseClient + ?Sized> WarehouseClient for std::sync::Arc<W> {
    async fn execute(&self, statement: &Statement) -> Result<(), WarehouseError> {
        (**self).execute(statement).await
    }

    async fn execute_batch(
        &self,
        statement: &str,
        rows: &[Vec<WarehouseValue>],
    ) -> Result<u64, WarehouseError> {
        (**self).execute_batch(statement, rows).await
    }

    async fn query_as_table(&self, statement: &Statement) -> Result<Table, WarehouseError> {
        (**self).query_as_table(statement).await
    }
}
