//! PostgreSQL warehouse client.

use crate::convert::{boxed_params, cell_value, classify, param_refs};
use metrology_core::sql::quote_identifier;
use metrology_core::{Statement, Table, WarehouseClient, WarehouseError, WarehouseValue};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, info};

/// Warehouse client over a single PostgreSQL session.
///
/// The session is shared behind a mutex, so concurrent batches are
/// serialized on the wire but may be issued from any number of tasks.
#[derive(Clone)]
pub struct PostgreSQLWarehouse {
    client: Arc<Mutex<Client>>,
}

impl PostgreSQLWarehouse {
    /// Connect to PostgreSQL.
    ///
    /// # Arguments
    ///
    /// * `connection_string` - e.g. "host=localhost user=postgres password=postgres dbname=fab"
    pub async fn connect(connection_string: &str) -> Result<Self, WarehouseError> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .map_err(|e| WarehouseError::Connectivity(e.to_string()))?;

        // Spawn the connection task
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        // Test connection
        client.simple_query("SELECT 1").await.map_err(classify)?;
        info!("Connected to PostgreSQL warehouse");

        Ok(Self::with_client(Arc::new(Mutex::new(client))))
    }

    /// Create a warehouse client from an existing session.
    pub fn with_client(client: Arc<Mutex<Client>>) -> Self {
        Self { client }
    }

    /// Select the schema that unqualified table names resolve to.
    pub async fn use_schema(&self, schema: &str) -> Result<(), WarehouseError> {
        let statement = Statement::new(format!("SET search_path TO {}", quote_identifier(schema)?));
        self.execute(&statement).await?;
        info!("Session context set to schema {}", schema);
        Ok(())
    }
}

#[async_trait::async_trait]
impl WarehouseClient for PostgreSQLWarehouse {
    async fn execute(&self, statement: &Statement) -> Result<(), WarehouseError> {
        let client = self.client.lock().await;
        debug!("Execute: {}", statement.sql);
        let params = boxed_params(&statement.params);
        client
            .execute(statement.sql.as_str(), &param_refs(&params))
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn execute_batch(
        &self,
        statement: &str,
        rows: &[Vec<WarehouseValue>],
    ) -> Result<u64, WarehouseError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut client = self.client.lock().await;
        // One transaction per batch: either every row lands or none does.
        let transaction = client.transaction().await.map_err(classify)?;
        let prepared = transaction.prepare(statement).await.map_err(classify)?;

        let mut inserted = 0u64;
        for row in rows {
            let params = boxed_params(row);
            inserted += transaction
                .execute(&prepared, &param_refs(&params))
                .await
                .map_err(classify)?;
        }

        transaction.commit().await.map_err(classify)?;
        debug!("Batch committed: {} rows", inserted);
        Ok(inserted)
    }

    async fn query_as_table(&self, statement: &Statement) -> Result<Table, WarehouseError> {
        let client = self.client.lock().await;
        debug!("Query: {}", statement.sql);

        let prepared = client.prepare(&statement.sql).await.map_err(classify)?;
        let columns: Vec<String> = prepared
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let params = boxed_params(&statement.params);
        let rows = client
            .query(&prepared, &param_refs(&params))
            .await
            .map_err(classify)?;

        let rows = rows
            .iter()
            .map(|row| {
                (0..columns.len())
                    .map(|idx| cell_value(row, idx))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Table::new(columns).with_rows(rows))
    }
}
