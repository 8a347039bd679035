//! Board column configuration.
//!
//! A column is a fixed bucket of tasks sharing a status value. The set of
//! columns is ordered and never empty; its first column is where tasks with
//! an unrecognised status are shown.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a column, equal to the `status` of the tasks it holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    /// Creates a column identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ColumnId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single board column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Status value of the tasks in this column.
    pub id: ColumnId,
    /// Human-readable heading.
    pub label: String,
}

impl Column {
    /// Creates a column.
    pub fn new(id: impl Into<ColumnId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Errors raised when building a [`ColumnSet`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColumnError {
    /// No columns were configured.
    #[error("a board needs at least one column")]
    Empty,
    /// Two columns share an identifier.
    #[error("duplicate column id: {0}")]
    DuplicateColumn(ColumnId),
}

/// Ordered, non-empty set of columns with unique ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    columns: Vec<Column>,
}

impl ColumnSet {
    /// Builds a column set.
    ///
    /// # Errors
    ///
    /// Returns [`ColumnError::Empty`] for an empty list, or
    /// [`ColumnError::DuplicateColumn`] if an id repeats.
    pub fn new(columns: Vec<Column>) -> Result<Self, ColumnError> {
        if columns.is_empty() {
            return Err(ColumnError::Empty);
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(&column.id) {
                return Err(ColumnError::DuplicateColumn(column.id.clone()));
            }
        }
        Ok(Self { columns })
    }

    /// Columns in display order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Iterates over column ids in display order.
    pub fn ids(&self) -> impl Iterator<Item = &ColumnId> {
        self.columns.iter().map(|c| &c.id)
    }

    /// The column that receives tasks with an unknown status.
    #[must_use]
    pub fn fallback(&self) -> &Column {
        // Non-empty by construction.
        &self.columns[0]
    }

    /// Whether `id` names a configured column.
    #[must_use]
    pub fn contains(&self, id: &ColumnId) -> bool {
        self.columns.iter().any(|c| c.id == *id)
    }

    /// Display index of the column named `id`.
    #[must_use]
    pub fn index_of(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.id == *id)
    }

    /// Resolves a task status to the column it is rendered in, falling back
    /// to the first column for unknown statuses.
    #[must_use]
    pub fn resolve(&self, status: &ColumnId) -> &ColumnId {
        self.columns
            .iter()
            .find(|c| c.id == *status)
            .map_or(&self.fallback().id, |c| &c.id)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self {
            columns: vec![
                Column::new("todo", "To Do"),
                Column::new("in_progress", "In Progress"),
                Column::new("done", "Done"),
            ],
        }
    }
}
