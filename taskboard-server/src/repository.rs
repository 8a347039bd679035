//! Authoritative task list.
//!
//! A reorder batch is validated and applied under a single write lock, so
//! readers see either none or all of it.

use taskboard_proto::column::ColumnSet;
use taskboard_proto::reorder::{ReorderError, TaskReorderItem, apply_reorder};
use taskboard_proto::task::{Scope, Task, sort_board_order};
use tokio::sync::RwLock;

/// In-memory task repository.
pub struct TaskRepository {
    tasks: RwLock<Vec<Task>>,
    columns: ColumnSet,
}

impl TaskRepository {
    /// Creates a repository holding `tasks`.
    #[must_use]
    pub fn new(tasks: Vec<Task>, columns: ColumnSet) -> Self {
        Self {
            tasks: RwLock::new(tasks),
            columns,
        }
    }

    /// Tasks in `scope`, sorted by `(order_in_list, id)`.
    pub async fn list(&self, scope: Scope) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        scoped(&tasks, scope)
    }

    /// Applies a reorder batch and returns the tasks in `scope`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReorderError`] if any item is invalid; nothing is
    /// applied in that case.
    pub async fn reorder(
        &self,
        scope: Scope,
        items: &[TaskReorderItem],
    ) -> Result<Vec<Task>, ReorderError> {
        let mut tasks = self.tasks.write().await;
        apply_reorder(&mut tasks, items, &self.columns)?;
        Ok(scoped(&tasks, scope))
    }
}

fn scoped(tasks: &[Task], scope: Scope) -> Vec<Task> {
    let mut scoped: Vec<Task> = tasks.iter().filter(|t| scope.contains(t)).cloned().collect();
    sort_board_order(&mut scoped);
    scoped
}
