//! Working snapshot used while a drag is in progress.
//!
//! The snapshot is a private copy of the confirmed tasks, laid out column
//! by column in display order. Drag-over events move tasks around inside
//! it; the confirmed store is never touched until a sync commits.

use taskboard_proto::column::{ColumnId, ColumnSet};
use taskboard_proto::task::{Task, TaskId};

use super::Position;
use super::grouping::group_by_column;

/// Column-contiguous copy of the board.
///
/// Tasks of the first column come first, then the second column, and so
/// on. Every task's `status` names a configured column.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingSnapshot {
    tasks: Vec<Task>,
    columns: ColumnSet,
}

impl WorkingSnapshot {
    /// Copies the confirmed tasks into display order.
    ///
    /// Tasks with an unknown status are placed in the fallback column and
    /// their status is rewritten to it.
    #[must_use]
    pub fn from_confirmed(confirmed: &[Task], columns: &ColumnSet) -> Self {
        let view = group_by_column(confirmed, columns);
        let mut tasks = Vec::with_capacity(confirmed.len());
        for column in view.columns() {
            for task in &column.tasks {
                let mut task = (*task).clone();
                task.status = column.column.id.clone();
                tasks.push(task);
            }
        }
        Self {
            tasks,
            columns: columns.clone(),
        }
    }

    /// All tasks, column by column.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Column configuration the snapshot was built with.
    #[must_use]
    pub const fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Tasks of one column in display order.
    #[must_use]
    pub fn column_tasks(&self, column: &ColumnId) -> &[Task] {
        let range = self.range_of(column);
        &self.tasks[range]
    }

    /// Mutable tasks of one column in display order.
    pub fn column_mut(&mut self, column: &ColumnId) -> &mut [Task] {
        let range = self.range_of(column);
        &mut self.tasks[range]
    }

    /// Ids of one column in display order.
    #[must_use]
    pub fn column_ids(&self, column: &ColumnId) -> Vec<TaskId> {
        self.column_tasks(column).iter().map(|t| t.id).collect()
    }

    /// Current position of a task.
    #[must_use]
    pub fn position_of(&self, id: TaskId) -> Option<Position> {
        let flat = self.tasks.iter().position(|t| t.id == id)?;
        let column = self.tasks[flat].status.clone();
        let start = self.range_of(&column).start;
        Some(Position {
            column,
            index: flat - start,
        })
    }

    /// Moves task `id` to `index` in `column`, where `index` is counted
    /// after the task has been taken out of its current place and is
    /// clamped to the column length.
    ///
    /// Returns `false` when the task is unknown, the column is not
    /// configured, or the task is already there.
    pub fn move_task(&mut self, id: TaskId, column: &ColumnId, index: usize) -> bool {
        if !self.columns.contains(column) {
            return false;
        }
        let Some(from) = self.tasks.iter().position(|t| t.id == id) else {
            return false;
        };
        if let Some(current) = self.position_of(id) {
            let len_without = self.column_tasks(column).len() - usize::from(current.column == *column);
            if current.column == *column && current.index == index.min(len_without) {
                return false;
            }
        }

        let mut task = self.tasks.remove(from);
        task.status = column.clone();
        let range = self.range_of(column);
        let at = range.start + index.min(range.len());
        self.tasks.insert(at, task);
        true
    }

    /// Flat range occupied by one column. Unknown columns yield an empty
    /// range at the end.
    fn range_of(&self, column: &ColumnId) -> std::ops::Range<usize> {
        let Some(slot) = self.columns.index_of(column) else {
            return self.tasks.len()..self.tasks.len();
        };
        let start = self
            .tasks
            .iter()
            .position(|t| {
                self.columns
                    .index_of(&t.status)
                    .is_some_and(|other| other >= slot)
            })
            .unwrap_or(self.tasks.len());
        let len = self.tasks[start..]
            .iter()
            .take_while(|t| t.status == *column)
            .count();
        start..start + len
    }
}
