//! Turning a drop into a minimal reorder batch.

use std::collections::HashMap;

use taskboard_proto::column::{ColumnId, ColumnSet};
use taskboard_proto::reorder::TaskReorderItem;
use taskboard_proto::task::{Task, TaskId};

use crate::board::{Position, WorkingSnapshot};
use crate::drag::DropOutcome;
use crate::ordering::{KeyAssignment, assign_column_keys};

/// The batch derived from one drop, plus the board it predicts.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderPlan {
    /// Change records for every task whose status, key or project differs
    /// from the baseline, in board order.
    pub changes: Vec<TaskReorderItem>,
    /// Board after the batch is applied, for optimistic rendering.
    pub predicted: WorkingSnapshot,
    /// Where the dropped task ends up, or `None` if it is no longer on the
    /// board.
    pub destination: Option<Position>,
    /// Whether a touched column had to be renumbered.
    pub rebalanced: bool,
}

impl ReorderPlan {
    /// Whether the drop changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Replays `outcome` onto `baseline` and diffs the result against it.
///
/// The dropped task is placed right before its drop-time successor if that
/// task is still in the destination column, otherwise right after its
/// predecessor, otherwise at the recorded index. Only the origin and
/// destination columns get new keys.
#[must_use]
pub fn plan_reorder(outcome: &DropOutcome, baseline: &[Task], columns: &ColumnSet) -> ReorderPlan {
    let mut predicted = WorkingSnapshot::from_confirmed(baseline, columns);
    let Some(origin) = predicted.position_of(outcome.task_id) else {
        return ReorderPlan {
            changes: Vec::new(),
            predicted,
            destination: None,
            rebalanced: false,
        };
    };

    let column = &outcome.destination.column;
    let index = rebased_index(&predicted, outcome, column);
    predicted.move_task(outcome.task_id, column, index);

    let mut rebalanced = false;
    let mut touched: Vec<&ColumnId> = vec![&origin.column];
    if origin.column != *column {
        touched.push(column);
    }
    for id in touched {
        let assignment = assign_column_keys(predicted.column_mut(id), Some(outcome.task_id));
        rebalanced |= assignment == KeyAssignment::Rebalanced;
    }

    let changes = diff(baseline, &predicted, outcome.task_id, columns);
    let destination = predicted.position_of(outcome.task_id);
    ReorderPlan {
        changes,
        predicted,
        destination,
        rebalanced,
    }
}

/// Index in `column` (counted without the dropped task) that reproduces
/// the drop relative to its neighbours.
fn rebased_index(snapshot: &WorkingSnapshot, outcome: &DropOutcome, column: &ColumnId) -> usize {
    let others: Vec<TaskId> = snapshot
        .column_ids(column)
        .into_iter()
        .filter(|id| *id != outcome.task_id)
        .collect();
    let find = |id: TaskId| others.iter().position(|other| *other == id);

    if let Some(index) = outcome.anchor.before.and_then(find) {
        return index;
    }
    if let Some(index) = outcome.anchor.after.and_then(find) {
        return index + 1;
    }
    outcome.destination.index
}

fn diff(
    baseline: &[Task],
    predicted: &WorkingSnapshot,
    dropped: TaskId,
    columns: &ColumnSet,
) -> Vec<TaskReorderItem> {
    let before: HashMap<TaskId, &Task> = baseline.iter().map(|t| (t.id, t)).collect();
    predicted
        .tasks()
        .iter()
        .filter_map(|after| {
            let before = before.get(&after.id)?;
            let mut item = TaskReorderItem::between(before, after)?;
            // Unknown statuses are shown in the fallback column; only the
            // dropped task is actually moved into it.
            if after.id != dropped && columns.resolve(&before.status) == &after.status {
                item.new_status = None;
            }
            (!item.is_empty()).then_some(item)
        })
        .collect()
}
