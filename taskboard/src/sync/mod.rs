//! Reconciliation between the confirmed store and the server.
//!
//! [`SyncEngine::submit`] turns a drop into one reorder batch, sends it,
//! and replaces the confirmed tasks with the server's answer. Every sync
//! takes a sequence number when it starts; a reply is committed only if no
//! newer sync has been committed first, so the store always reflects the
//! latest committed answer. A failed sync leaves the store untouched.

pub mod plan;

pub use plan::{ReorderPlan, plan_reorder};

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use taskboard_proto::column::ColumnSet;
use taskboard_proto::reorder::{ReorderError, validate_batch};
use taskboard_proto::task::{Scope, Task, sort_board_order};

use crate::drag::DropOutcome;
use crate::remote::{RemoteError, RemoteTaskService};
use crate::store::TaskStore;

/// Errors from a sync. The confirmed store is unchanged when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The remote call failed.
    #[error("remote call failed: {0}")]
    Remote(#[from] RemoteError),

    /// The planned batch failed local validation.
    #[error("invalid reorder batch: {0}")]
    InvalidBatch(#[from] ReorderError),

    /// The server's task list is not usable.
    #[error("invalid server response: {0}")]
    InvalidResponse(String),
}

/// How a sync ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The drop changed nothing; no request was sent.
    Unchanged,
    /// The server's answer is now the confirmed state.
    Committed {
        /// Sequence number of this sync.
        sequence: u64,
        /// Tasks in scope as committed by this sync.
        tasks: Vec<Task>,
    },
    /// A newer sync was committed first; this answer was discarded.
    Stale {
        /// Sequence number of this sync.
        sequence: u64,
        /// Sequence number already committed.
        latest: u64,
    },
}

/// Applies drops to the server and keeps the confirmed store in step.
pub struct SyncEngine<S, R> {
    store: Arc<S>,
    remote: R,
    columns: ColumnSet,
    scope: Scope,
    next_sequence: AtomicU64,
    applied: Mutex<u64>,
}

impl<S: TaskStore, R: RemoteTaskService> SyncEngine<S, R> {
    /// Creates an engine for one board scope.
    pub fn new(store: Arc<S>, remote: R, columns: ColumnSet, scope: Scope) -> Self {
        Self {
            store,
            remote,
            columns,
            scope,
            next_sequence: AtomicU64::new(0),
            applied: Mutex::new(0),
        }
    }

    /// The confirmed store.
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The remote service.
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Column configuration.
    pub const fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Scope this engine syncs.
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Confirmed tasks in scope.
    pub fn confirmed(&self) -> Vec<Task> {
        self.store.get_all(self.scope)
    }

    /// Plans `outcome` against the current confirmed state without sending
    /// anything.
    pub fn plan(&self, outcome: &DropOutcome) -> ReorderPlan {
        plan_reorder(outcome, &self.confirmed(), &self.columns)
    }

    /// Persists a drop.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the batch is invalid, the remote call
    /// fails, or the reply is unusable. The store is not modified.
    pub async fn submit(&self, outcome: &DropOutcome) -> Result<SyncOutcome, SyncError> {
        let sequence = self.next_sequence();
        let plan = self.plan(outcome);
        if plan.is_empty() {
            tracing::debug!(task = %outcome.task_id, sequence, "drop changes nothing");
            return Ok(SyncOutcome::Unchanged);
        }
        validate_batch(&plan.changes)?;

        tracing::info!(
            task = %outcome.task_id,
            sequence,
            records = plan.changes.len(),
            rebalanced = plan.rebalanced,
            scope = %self.scope,
            "submitting reorder"
        );
        let tasks = self
            .remote
            .submit_reorder(self.scope, &plan.changes)
            .await
            .inspect_err(|e| {
                tracing::warn!(sequence, status = e.status(), error = %e, "reorder failed");
            })?;
        validate_response(&tasks)?;
        Ok(self.commit(sequence, tasks))
    }

    /// Loads the authoritative list, subject to the same ordering guard as
    /// [`submit`](Self::submit).
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the fetch fails or the reply is unusable.
    pub async fn refresh(&self) -> Result<SyncOutcome, SyncError> {
        let sequence = self.next_sequence();
        let tasks = self
            .remote
            .fetch_tasks(self.scope)
            .await
            .inspect_err(|e| tracing::warn!(sequence, error = %e, "refresh failed"))?;
        validate_response(&tasks)?;
        Ok(self.commit(sequence, tasks))
    }

    fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn commit(&self, sequence: u64, tasks: Vec<Task>) -> SyncOutcome {
        let mut confirmed: Vec<Task> = tasks
            .into_iter()
            .filter(|t| self.scope.contains(t))
            .collect();
        sort_board_order(&mut confirmed);

        let mut applied = self.applied.lock();
        if sequence <= *applied {
            tracing::debug!(sequence, latest = *applied, "discarding stale sync result");
            return SyncOutcome::Stale {
                sequence,
                latest: *applied,
            };
        }
        self.store.replace_all(self.scope, confirmed.clone());
        *applied = sequence;
        drop(applied);
        tracing::debug!(sequence, "sync committed");
        SyncOutcome::Committed {
            sequence,
            tasks: confirmed,
        }
    }
}

fn validate_response(tasks: &[Task]) -> Result<(), SyncError> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(task.id) {
            return Err(SyncError::InvalidResponse(format!(
                "task {} listed twice",
                task.id
            )));
        }
        if let Some(key) = task.order_in_list
            && !key.is_finite()
        {
            return Err(SyncError::InvalidResponse(format!(
                "task {} has non-finite order key {key}",
                task.id
            )));
        }
    }
    Ok(())
}
