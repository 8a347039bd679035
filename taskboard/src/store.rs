//! Confirmed task store.
//!
//! Holds the last server-confirmed task list. Only the sync engine writes
//! to it, and only with a complete authoritative list for one scope.

use std::collections::HashSet;

use parking_lot::RwLock;
use taskboard_proto::task::{Scope, Task, sort_board_order};

/// Read/replace access to confirmed tasks.
pub trait TaskStore: Send + Sync {
    /// Confirmed tasks in `scope`, sorted by `(order_in_list, id)`.
    fn get_all(&self, scope: Scope) -> Vec<Task>;

    /// Atomically replaces every task in `scope` with `tasks`.
    ///
    /// Tasks outside the scope are left alone; incoming tasks that do not
    /// belong to the scope are dropped.
    fn replace_all(&self, scope: Scope, tasks: Vec<Task>);
}

/// [`TaskStore`] kept in memory behind a read-write lock.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl InMemoryTaskStore {
    /// Creates a store holding `tasks`.
    #[must_use]
    pub fn new(tasks: Vec<Task>) -> Self {
        let store = Self::default();
        store.replace_all(Scope::Board, tasks);
        store
    }

    /// Number of confirmed tasks across every scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn get_all(&self, scope: Scope) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .iter()
            .filter(|t| scope.contains(t))
            .cloned()
            .collect();
        sort_board_order(&mut tasks);
        tasks
    }

    fn replace_all(&self, scope: Scope, tasks: Vec<Task>) {
        let mut seen = HashSet::with_capacity(tasks.len());
        let incoming: Vec<Task> = tasks
            .into_iter()
            .filter(|t| scope.contains(t) && seen.insert(t.id))
            .collect();

        let mut guard = self.tasks.write();
        guard.retain(|t| !scope.contains(t) && !seen.contains(&t.id));
        guard.extend(incoming);
        sort_board_order(&mut guard);
    }
}
