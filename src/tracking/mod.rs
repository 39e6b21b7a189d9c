// src/tracking/mod.rs

//! Tracking table for background executions.
//!
//! Every `run_async` call owns one [`ExecutionRecord`] here. Records move from
//! `Running` to exactly one terminal status and are dropped a grace period
//! later by a per-record timer task. The table is the only state shared
//! between the caller and worker tasks; a single mutex guards it.

pub mod record;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::types::ExecutionId;

pub use record::{ExecutionRecord, ExecutionStatus};

#[derive(Default)]
struct Table {
    records: HashMap<ExecutionId, ExecutionRecord>,
    /// Pending removal timers, keyed like `records`.
    timers: HashMap<ExecutionId, AbortHandle>,
}

pub struct ExecutionRegistry {
    table: Mutex<Table>,
    grace: Duration,
    runtime: Handle,
}

impl std::fmt::Debug for ExecutionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionRegistry")
            .field("grace", &self.grace)
            .field("tracked", &self.lock().records.len())
            .finish_non_exhaustive()
    }
}

impl ExecutionRegistry {
    /// `grace` is how long a finished record stays visible; removal timers
    /// are spawned on `runtime`.
    pub fn new(grace: Duration, runtime: Handle) -> Arc<Self> {
        Arc::new(Self {
            table: Mutex::new(Table::default()),
            grace,
            runtime,
        })
    }

    pub fn add(&self, id: ExecutionId, record: ExecutionRecord) {
        debug!(execution_id = %id, automation = %record.automation_id, "tracking execution");
        self.lock().records.insert(id, record);
    }

    /// Drop a record immediately, cancelling its pending removal timer.
    pub fn remove(&self, id: &ExecutionId) -> Option<ExecutionRecord> {
        let mut table = self.lock();
        if let Some(timer) = table.timers.remove(id) {
            timer.abort();
        }
        table.records.remove(id)
    }

    pub fn get(&self, id: &ExecutionId) -> Option<ExecutionRecord> {
        self.lock().records.get(id).cloned()
    }

    /// Copy of the whole table.
    pub fn get_all(&self) -> HashMap<ExecutionId, ExecutionRecord> {
        self.lock().records.clone()
    }

    /// Ids currently in `Running` state.
    pub fn running(&self) -> Vec<ExecutionId> {
        self.lock()
            .records
            .iter()
            .filter(|(_, r)| r.status == ExecutionStatus::Running)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Restamp `started_at` once the worker actually picks the run up.
    pub fn mark_started(&self, id: &ExecutionId) {
        if let Some(record) = self.lock().records.get_mut(id) {
            record.begin();
        }
    }

    /// Best-effort cancel: flips a running record to `Cancelled` and arms its
    /// removal. The child process, if any, keeps running.
    ///
    /// Returns `true` iff the id is tracked. A record that already reached a
    /// terminal status keeps it.
    pub fn mark_cancelled(self: &Arc<Self>, id: &ExecutionId) -> bool {
        let transitioned = {
            let mut table = self.lock();
            match table.records.get_mut(id) {
                Some(record) => record.transition(ExecutionStatus::Cancelled),
                None => return false,
            }
        };

        if transitioned {
            info!(execution_id = %id, "execution marked cancelled");
            self.schedule_removal(id);
        }
        true
    }

    /// Set the terminal status reported by a worker.
    ///
    /// Returns `false` when the record is unknown or already terminal (for
    /// example after a cancel request); the stored status is then unchanged.
    pub fn finish(&self, id: &ExecutionId, status: ExecutionStatus) -> bool {
        let mut table = self.lock();
        match table.records.get_mut(id) {
            Some(record) => record.transition(status),
            None => false,
        }
    }

    /// Remove the record once the grace period has elapsed.
    ///
    /// Re-arming replaces an earlier timer for the same id.
    pub fn schedule_removal(self: &Arc<Self>, id: &ExecutionId) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let grace = self.grace;
        let timer_id = id.clone();

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(grace).await;
            if let Some(registry) = weak.upgrade() {
                registry.expire(&timer_id);
            }
        });

        let mut table = self.lock();
        if !table.records.contains_key(id) {
            handle.abort();
            return;
        }
        if let Some(previous) = table.timers.insert(id.clone(), handle.abort_handle()) {
            previous.abort();
        }
    }

    fn expire(&self, id: &ExecutionId) {
        let mut table = self.lock();
        table.timers.remove(id);
        if table.records.remove(id).is_some() {
            debug!(execution_id = %id, "execution record expired");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        // Critical sections never panic, so a poisoned lock still holds a
        // consistent table.
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
