//! Column grouping view.
//!
//! Projects a flat task list onto the configured columns. Each task lands
//! in the column matching its status, or in the first column when its
//! status is unknown, and every column is sorted by `(order_in_list, id)`.

use std::collections::HashMap;

use taskboard_proto::column::{Column, ColumnId, ColumnSet};
use taskboard_proto::task::{Task, TaskId};

use super::Position;

/// One column of a [`BoardView`].
#[derive(Debug, Clone)]
pub struct ColumnView<'a> {
    /// Column configuration.
    pub column: &'a Column,
    /// Tasks in display order.
    pub tasks: Vec<&'a Task>,
}

/// Tasks grouped by column, in column order.
#[derive(Debug, Clone)]
pub struct BoardView<'a> {
    columns: Vec<ColumnView<'a>>,
}

impl<'a> BoardView<'a> {
    /// Columns in display order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnView<'a>] {
        &self.columns
    }

    /// The column named `id`, if configured.
    #[must_use]
    pub fn column(&self, id: &ColumnId) -> Option<&ColumnView<'a>> {
        self.columns.iter().find(|c| c.column.id == *id)
    }

    /// Where task `id` is displayed.
    #[must_use]
    pub fn position_of(&self, id: TaskId) -> Option<Position> {
        self.columns.iter().find_map(|view| {
            view.tasks
                .iter()
                .position(|t| t.id == id)
                .map(|index| Position::new(view.column.id.clone(), index))
        })
    }

    /// Ids of one column in display order; empty for unknown columns.
    #[must_use]
    pub fn column_ids(&self, id: &ColumnId) -> Vec<TaskId> {
        self.column(id)
            .map(|view| view.tasks.iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }

    /// Total number of tasks on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    /// Whether the board has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Groups `tasks` by column in O(n log n).
#[must_use]
pub fn group_by_column<'a>(tasks: &'a [Task], columns: &'a ColumnSet) -> BoardView<'a> {
    let slots: HashMap<&ColumnId, usize> = columns.ids().enumerate().map(|(i, id)| (id, i)).collect();
    let mut buckets: Vec<Vec<&Task>> = vec![Vec::new(); columns.len()];

    for task in tasks {
        let slot = slots.get(&task.status).copied().unwrap_or(0);
        buckets[slot].push(task);
    }

    let columns = columns
        .columns()
        .iter()
        .zip(buckets)
        .map(|(column, mut tasks)| {
            tasks.sort_by(|a, b| a.board_cmp(b));
            ColumnView { column, tasks }
        })
        .collect();

    BoardView { columns }
}
