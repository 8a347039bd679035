//! In-process remote task service for tests.
//!
//! Behaves like the REST server: batches and replies pass through the JSON
//! codec, and batches are applied all or nothing. Tests
//! can script a failure for the next call or hold the next reply until
//! they release it, to reproduce out-of-order completions.

use std::sync::Arc;

use parking_lot::Mutex;
use taskboard_proto::codec;
use taskboard_proto::column::ColumnSet;
use taskboard_proto::reorder::{ReorderError, TaskReorderItem, apply_reorder};
use taskboard_proto::task::{Scope, Task, sort_board_order};
use tokio::sync::oneshot;

use super::{RemoteError, RemoteTaskService};

/// Releases a reply held by [`LoopbackTaskService::hold_next`].
#[derive(Debug)]
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    /// Lets the held reply through.
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<Task>,
    submissions: Vec<Vec<TaskReorderItem>>,
    fetches: usize,
    fail_next: Option<RemoteError>,
    hold_next: Option<oneshot::Receiver<()>>,
}

/// Remote service backed by an in-memory task list.
#[derive(Debug, Clone)]
pub struct LoopbackTaskService {
    inner: Arc<Mutex<Inner>>,
    columns: ColumnSet,
}

impl LoopbackTaskService {
    /// Creates a service holding `tasks`.
    #[must_use]
    pub fn new(tasks: Vec<Task>, columns: ColumnSet) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                tasks,
                ..Inner::default()
            })),
            columns,
        }
    }

    /// Makes the next call fail with `error` without touching any task.
    pub fn fail_next(&self, error: RemoteError) {
        self.inner.lock().fail_next = Some(error);
    }

    /// Holds the reply to the next `submit_reorder` until the returned
    /// gate is released. The batch itself is applied on arrival.
    #[must_use]
    pub fn hold_next(&self) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().hold_next = Some(rx);
        Gate(tx)
    }

    /// Every batch received so far, in arrival order.
    #[must_use]
    pub fn submissions(&self) -> Vec<Vec<TaskReorderItem>> {
        self.inner.lock().submissions.clone()
    }

    /// Number of `fetch_tasks` calls served.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.inner.lock().fetches
    }

    /// Authoritative task list, sorted.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        let mut tasks = self.inner.lock().tasks.clone();
        sort_board_order(&mut tasks);
        tasks
    }

    /// Replaces the authoritative list, as another client would.
    pub fn set_tasks(&self, tasks: Vec<Task>) {
        self.inner.lock().tasks = tasks;
    }

    fn scoped(tasks: &[Task], scope: Scope) -> Vec<Task> {
        let mut scoped: Vec<Task> = tasks.iter().filter(|t| scope.contains(t)).cloned().collect();
        sort_board_order(&mut scoped);
        scoped
    }
}

impl RemoteTaskService for LoopbackTaskService {
    async fn submit_reorder(
        &self,
        scope: Scope,
        changes: &[TaskReorderItem],
    ) -> Result<Vec<Task>, RemoteError> {
        let bytes = codec::encode_batch(changes)?;
        let batch = codec::decode_batch(&bytes)?;

        let (reply, hold) = {
            let mut inner = self.inner.lock();
            inner.submissions.push(batch.clone());
            if let Some(error) = inner.fail_next.take() {
                return Err(error);
            }
            let mut next = inner.tasks.clone();
            apply_reorder(&mut next, &batch, &self.columns).map_err(reject)?;
            inner.tasks = next;
            (Self::scoped(&inner.tasks, scope), inner.hold_next.take())
        };

        if let Some(hold) = hold {
            let _ = hold.await;
        }
        over_wire(&reply)
    }

    async fn fetch_tasks(&self, scope: Scope) -> Result<Vec<Task>, RemoteError> {
        let mut inner = self.inner.lock();
        inner.fetches += 1;
        if let Some(error) = inner.fail_next.take() {
            return Err(error);
        }
        let reply = Self::scoped(&inner.tasks, scope);
        drop(inner);
        over_wire(&reply)
    }
}

fn over_wire(tasks: &[Task]) -> Result<Vec<Task>, RemoteError> {
    let bytes = codec::encode_tasks(tasks)?;
    Ok(codec::decode_tasks(&bytes)?)
}

fn reject(error: ReorderError) -> RemoteError {
    let status = match error {
        ReorderError::UnknownTask(_) => 404,
        _ => 422,
    };
    RemoteError::Rejected {
        status,
        detail: error.to_string(),
    }
}
