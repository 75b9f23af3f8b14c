//! Scripted warehouse client for tests.
//!
//! [`ScriptedWarehouse`] records every call and can inject failures per
//! wafer. It either answers on its own (acknowledging every batch and
//! returning a canned table) or forwards to a real backend.

use crate::client::{Statement, WarehouseClient};
use crate::error::WarehouseError;
use crate::value::{Table, WarehouseValue};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

/// A call observed by [`ScriptedWarehouse`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Execute(Statement),
    Batch {
        statement: String,
        rows: Vec<Vec<WarehouseValue>>,
    },
    Query(Statement),
}

#[derive(Default)]
struct Script {
    calls: Vec<RecordedCall>,
    batch_failures: HashMap<String, VecDeque<WarehouseError>>,
    fail_every_batch: Option<WarehouseError>,
    query_results: VecDeque<Result<Table, WarehouseError>>,
    acknowledged_override: Option<u64>,
}

/// Test double implementing [`WarehouseClient`].
#[derive(Clone, Default)]
pub struct ScriptedWarehouse {
    script: Arc<Mutex<Script>>,
    inner: Option<Arc<dyn WarehouseClient>>,
}

impl ScriptedWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward calls that are not failed by the script to `inner`.
    pub fn wrapping(inner: Arc<dyn WarehouseClient>) -> Self {
        Self {
            script: Arc::default(),
            inner: Some(inner),
        }
    }

    /// Fail the next `times` batches whose first row belongs to `wafer_id`.
    pub fn fail_batches_for(&self, wafer_id: &str, times: usize, error: WarehouseError) {
        let mut script = self.lock();
        let queue = script.batch_failures.entry(wafer_id.to_string()).or_default();
        for _ in 0..times {
            queue.push_back(error.clone());
        }
    }

    /// Fail every batch with `error`.
    pub fn fail_every_batch(&self, error: WarehouseError) {
        self.lock().fail_every_batch = Some(error);
    }

    /// Queue a result for the next unforwarded query.
    pub fn push_query_result(&self, result: Result<Table, WarehouseError>) {
        self.lock().query_results.push_back(result);
    }

    /// Report `count` acknowledged rows for every successful standalone batch.
    pub fn acknowledge(&self, count: u64) {
        self.lock().acknowledged_override = Some(count);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn batch_call_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::Batch { .. }))
            .count()
    }

    pub fn query_call_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::Query(_)))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread must not hide the calls made so far.
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn batch_wafer_id(rows: &[Vec<WarehouseValue>]) -> Option<String> {
    rows.first()
        .and_then(|row| row.first())
        .and_then(WarehouseValue::as_str)
        .map(str::to_string)
}

#[async_trait::async_trait]
impl WarehouseClient for ScriptedWarehouse {
    async fn execute(&self, statement: &Statement) -> Result<(), WarehouseError> {
        self.lock()
            .calls
            .push(RecordedCall::Execute(statement.clone()));
        match &self.inner {
            Some(inner) => inner.execute(statement).await,
            None => Ok(()),
        }
    }

    async fn execute_batch(
        &self,
        statement: &str,
        rows: &[Vec<WarehouseValue>],
    ) -> Result<u64, WarehouseError> {
        let acknowledged = {
            let mut script = self.lock();
            script.calls.push(RecordedCall::Batch {
                statement: statement.to_string(),
                rows: rows.to_vec(),
            });
            if let Some(error) = &script.fail_every_batch {
                return Err(error.clone());
            }
            if let Some(wafer_id) = batch_wafer_id(rows) {
                if let Some(error) = script
                    .batch_failures
                    .get_mut(&wafer_id)
                    .and_then(VecDeque::pop_front)
                {
                    return Err(error);
                }
            }
            script.acknowledged_override
        };

        match &self.inner {
            Some(inner) => inner.execute_batch(statement, rows).await,
            None => Ok(acknowledged.unwrap_or(rows.len() as u64)),
        }
    }

    async fn query_as_table(&self, statement: &Statement) -> Result<Table, WarehouseError> {
        let queued = {
            let mut script = self.lock();
            script.calls.push(RecordedCall::Query(statement.clone()));
            script.query_results.pop_front()
        };

        match (queued, &self.inner) {
            (Some(result), _) => result,
            (None, Some(inner)) => inner.query_as_table(statement).await,
            (None, None) => Ok(Table::default()),
        }
    }
}
