//! Task model shared by the board client and the server.
//!
//! Only the fields that take part in ordering are modelled, plus the
//! title for display. Tasks in a column are totally ordered by
//! [`Task::board_cmp`]: `order_in_list` ascending with a missing key
//! sorting last, then `id` ascending.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::column::ColumnId;

/// Stable identifier of a task. Ordered, so it doubles as the tie-break key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the project a task is grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(u64);

impl ProjectId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A task as carried on the wire and held in the client store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Column the task belongs to.
    pub status: ColumnId,
    /// Sort key within the column. `None` sorts after every keyed task.
    #[serde(default)]
    pub order_in_list: Option<f64>,
    /// Owning project, if any.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

impl Task {
    /// Creates an unkeyed task with no project.
    pub fn new(id: TaskId, title: impl Into<String>, status: impl Into<ColumnId>) -> Self {
        Self {
            id,
            title: title.into(),
            status: status.into(),
            order_in_list: None,
            project_id: None,
        }
    }

    /// Sets the ordering key.
    #[must_use]
    pub fn with_order(mut self, key: f64) -> Self {
        self.order_in_list = Some(key);
        self
    }

    /// Sets the owning project.
    #[must_use]
    pub fn with_project(mut self, project: ProjectId) -> Self {
        self.project_id = Some(project);
        self
    }

    /// Total order used inside a column: key ascending (missing keys last),
    /// then id ascending.
    #[must_use]
    pub fn board_cmp(&self, other: &Self) -> Ordering {
        compare_keys(self.order_in_list, other.order_in_list).then_with(|| self.id.cmp(&other.id))
    }
}

/// Compares two optional ordering keys, treating `None` as `+infinity`.
#[must_use]
pub fn compare_keys(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sorts tasks in place by [`Task::board_cmp`].
pub fn sort_board_order(tasks: &mut [Task]) {
    tasks.sort_by(Task::board_cmp);
}

/// The subset of tasks a view, store or request operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    /// Every task on the board.
    #[default]
    Board,
    /// Only tasks belonging to one project.
    Project(ProjectId),
}

impl Scope {
    /// Builds a scope from an optional project filter.
    #[must_use]
    pub const fn from_project(project: Option<ProjectId>) -> Self {
        match project {
            Some(id) => Self::Project(id),
            None => Self::Board,
        }
    }

    /// Returns the project filter, if any.
    #[must_use]
    pub const fn project_id(self) -> Option<ProjectId> {
        match self {
            Self::Board => None,
            Self::Project(id) => Some(id),
        }
    }

    /// Whether `task` falls inside this scope.
    #[must_use]
    pub fn contains(self, task: &Task) -> bool {
        match self {
            Self::Board => true,
            Self::Project(id) => task.project_id == Some(id),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Board => write!(f, "board"),
            Self::Project(id) => write!(f, "project {id}"),
        }
    }
}

/// Query-string form of a [`Scope`] (`?project_id=N`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeQuery {
    /// Optional project filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
}

impl From<Scope> for ScopeQuery {
    fn from(scope: Scope) -> Self {
        Self {
            project_id: scope.project_id(),
        }
    }
}

impl From<ScopeQuery> for Scope {
    fn from(query: ScopeQuery) -> Self {
        Self::from_project(query.project_id)
    }
}
