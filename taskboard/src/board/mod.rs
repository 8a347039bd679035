//! Board projections: the per-column view rendered from confirmed tasks and
//! the working snapshot mutated while a drag is in progress.

pub mod grouping;
pub mod snapshot;

pub use grouping::{BoardView, ColumnView, group_by_column};
pub use snapshot::WorkingSnapshot;

use taskboard_proto::column::ColumnId;

/// Where a task sits on the board: a column and a zero-based index in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    /// Column holding the task.
    pub column: ColumnId,
    /// Index within the column, top first.
    pub index: usize,
}

impl Position {
    /// Creates a position.
    pub fn new(column: impl Into<ColumnId>, index: usize) -> Self {
        Self {
            column: column.into(),
            index,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.column, self.index)
    }
}
