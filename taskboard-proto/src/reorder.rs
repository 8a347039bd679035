//! Batch reorder protocol: the sparse change record and its semantics.
//!
//! A reorder request is a list of [`TaskReorderItem`] patches. Each patch
//! names one task and carries only the fields that change; absent fields
//! are left untouched. A batch is validated in full before any task is
//! modified, so it applies completely or not at all.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::column::{ColumnId, ColumnSet};
use crate::task::{ProjectId, Task, TaskId};

/// Sparse patch describing how one task moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReorderItem {
    /// Task being patched.
    pub task_id: TaskId,
    /// New sort key, if it changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_order_in_list: Option<f64>,
    /// New column, if it changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<ColumnId>,
    /// New project, if it changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_project_id: Option<ProjectId>,
}

impl TaskReorderItem {
    /// Creates a patch that changes nothing yet.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            new_order_in_list: None,
            new_status: None,
            new_project_id: None,
        }
    }

    /// Whether the patch carries no change at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.new_order_in_list.is_none()
            && self.new_status.is_none()
            && self.new_project_id.is_none()
    }

    /// Builds the patch turning `before` into `after`, or `None` when the
    /// ordering fields are identical.
    ///
    /// Clearing a key or a project cannot be expressed by a sparse patch;
    /// such differences are not reported.
    #[must_use]
    pub fn between(before: &Task, after: &Task) -> Option<Self> {
        let mut item = Self::new(after.id);
        if after.status != before.status {
            item.new_status = Some(after.status.clone());
        }
        if after.order_in_list != before.order_in_list {
            item.new_order_in_list = after.order_in_list;
        }
        if after.project_id != before.project_id {
            item.new_project_id = after.project_id;
        }
        (!item.is_empty()).then_some(item)
    }

    /// Writes the patched fields into `task`.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(status) = &self.new_status {
            task.status = status.clone();
        }
        if let Some(key) = self.new_order_in_list {
            task.order_in_list = Some(key);
        }
        if let Some(project) = self.new_project_id {
            task.project_id = Some(project);
        }
    }
}

/// Reasons a reorder batch is refused.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum ReorderError {
    /// A patch changes nothing.
    #[error("reorder item for task {0} changes nothing")]
    EmptyPatch(TaskId),
    /// The same task appears twice in one batch.
    #[error("task {0} appears more than once in the batch")]
    DuplicateTask(TaskId),
    /// A sort key is NaN or infinite.
    #[error("task {task_id} has a non-finite order key: {key}")]
    NonFiniteOrder {
        /// Offending task.
        task_id: TaskId,
        /// Offending key.
        key: f64,
    },
    /// The batch names a task that does not exist.
    #[error("task {0} not found")]
    UnknownTask(TaskId),
    /// The batch moves a task into a column that is not configured.
    #[error("task {task_id} cannot move to unknown status '{status}'")]
    UnknownStatus {
        /// Offending task.
        task_id: TaskId,
        /// Requested status.
        status: ColumnId,
    },
}

/// Checks the shape of a batch without looking at any task list.
///
/// # Errors
///
/// Returns the first [`ReorderError`] found: an empty patch, a repeated
/// task id, or a non-finite sort key.
pub fn validate_batch(items: &[TaskReorderItem]) -> Result<(), ReorderError> {
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if item.is_empty() {
            return Err(ReorderError::EmptyPatch(item.task_id));
        }
        if !seen.insert(item.task_id) {
            return Err(ReorderError::DuplicateTask(item.task_id));
        }
        if let Some(key) = item.new_order_in_list
            && !key.is_finite()
        {
            return Err(ReorderError::NonFiniteOrder {
                task_id: item.task_id,
                key,
            });
        }
    }
    Ok(())
}

/// Applies a batch to `tasks`, all or nothing.
///
/// Every item is checked against the task list and the column set before
/// the first task is modified. On error `tasks` is unchanged.
///
/// # Errors
///
/// Returns a [`ReorderError`] from [`validate_batch`], or
/// [`ReorderError::UnknownTask`] / [`ReorderError::UnknownStatus`] when an
/// item does not match the task list or the configured columns.
pub fn apply_reorder(
    tasks: &mut [Task],
    items: &[TaskReorderItem],
    columns: &ColumnSet,
) -> Result<(), ReorderError> {
    validate_batch(items)?;

    let index: HashMap<TaskId, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| (task.id, i))
        .collect();

    let mut targets = Vec::with_capacity(items.len());
    for item in items {
        let Some(&position) = index.get(&item.task_id) else {
            return Err(ReorderError::UnknownTask(item.task_id));
        };
        if let Some(status) = &item.new_status
            && !columns.contains(status)
        {
            return Err(ReorderError::UnknownStatus {
                task_id: item.task_id,
                status: status.clone(),
            });
        }
        targets.push(position);
    }

    for (item, position) in items.iter().zip(targets) {
        item.apply_to(&mut tasks[position]);
    }
    Ok(())
}
