//! Property-based tests for drag ordering and reorder planning.
//!
//! Uses proptest to verify:
//! 1. Applying a plan's change records to the confirmed board and sorting
//!    by `(order_in_list, id)` reproduces the board shown at drop time.
//! 2. Re-inserting a task at its current position changes nothing.
//! 3. On a fully keyed board with distinct keys, a drop sends at most one
//!    record, and none when the task ends where it started.
//! 4. Besides the dropped task, only unkeyed or tied tasks are ever rekeyed.
//! 5. On a board with no keys yet, appending the newest task to a column
//!    only changes its status.

use proptest::prelude::*;
use proptest::sample::Index;
use taskboard::board::WorkingSnapshot;
use taskboard::drag::{DragController, DragEffect, DragEvent, DragTarget, DropOutcome};
use taskboard::sync::plan_reorder;
use taskboard_proto::column::{ColumnId, ColumnSet};
use taskboard_proto::task::{Task, TaskId, sort_board_order};

const STATUSES: [&str; 3] = ["todo", "in_progress", "done"];

/// Strategy for a sorted board with ids `1..=n`. Keys are drawn from a
/// small set so ties and missing keys are common.
fn arb_board() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec((0..STATUSES.len(), prop::option::of(0u8..6)), 1..14).prop_map(
        |rows| {
            let mut tasks: Vec<Task> = rows
                .into_iter()
                .enumerate()
                .map(|(i, (status, key))| Task {
                    id: TaskId::new(i as u64 + 1),
                    title: format!("task {}", i + 1),
                    status: STATUSES[status].into(),
                    order_in_list: key.map(f64::from),
                    project_id: None,
                })
                .collect();
            sort_board_order(&mut tasks);
            tasks
        },
    )
}

/// Strategy for a sorted board where every task has its own key.
fn arb_keyed_board() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(0..STATUSES.len(), 1..14).prop_map(|statuses| {
        let mut tasks: Vec<Task> = statuses
            .into_iter()
            .enumerate()
            .map(|(i, status)| {
                Task::new(TaskId::new(i as u64 + 1), format!("task {}", i + 1), STATUSES[status])
                    .with_order(i as f64 * 10.0)
            })
            .collect();
        sort_board_order(&mut tasks);
        tasks
    })
}

/// Strategy for a sorted board in which no task has a key yet.
fn arb_unkeyed_board() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(0..STATUSES.len(), 1..14).prop_map(|statuses| {
        let mut tasks: Vec<Task> = statuses
            .into_iter()
            .enumerate()
            .map(|(i, status)| {
                Task::new(TaskId::new(i as u64 + 1), format!("task {}", i + 1), STATUSES[status])
            })
            .collect();
        sort_board_order(&mut tasks);
        tasks
    })
}

/// A drag target before it is bound to a concrete board.
#[derive(Debug, Clone)]
enum TargetPick {
    Column(usize),
    Task(Index),
    Slot(usize, usize),
}

fn arb_target() -> impl Strategy<Value = TargetPick> {
    prop_oneof![
        (0..STATUSES.len()).prop_map(TargetPick::Column),
        any::<Index>().prop_map(TargetPick::Task),
        (0..STATUSES.len(), 0usize..16).prop_map(|(c, i)| TargetPick::Slot(c, i)),
    ]
}

fn bind(pick: &TargetPick, board: &[Task]) -> DragTarget {
    match pick {
        TargetPick::Column(c) => DragTarget::Column(ColumnId::new(STATUSES[*c])),
        TargetPick::Task(index) => DragTarget::Task(index.get(board).id),
        TargetPick::Slot(c, index) => DragTarget::Slot {
            column: ColumnId::new(STATUSES[*c]),
            index: *index,
        },
    }
}

/// Runs a full drag over `board` and returns the drop.
fn drag(board: &[Task], task: &Index, path: &[TargetPick], release: &TargetPick) -> DropOutcome {
    drag_task(board, task.get(board).id, path, release)
}

fn drag_task(board: &[Task], task_id: TaskId, path: &[TargetPick], release: &TargetPick) -> DropOutcome {
    let mut controller = DragController::new(ColumnSet::default());
    controller.handle(DragEvent::Start {
        task_id,
        confirmed: board.to_vec(),
    });
    for pick in path {
        controller.handle(DragEvent::Over(bind(pick, board)));
    }
    match controller.handle(DragEvent::Drop(Some(bind(release, board)))).pop() {
        Some(DragEffect::Dropped(outcome)) => *outcome,
        other => panic!("expected a drop, got {other:?}"),
    }
}

fn column_ids(tasks: &[Task], column: &str) -> Vec<TaskId> {
    tasks
        .iter()
        .filter(|t| t.status.as_str() == column)
        .map(|t| t.id)
        .collect()
}

proptest! {
    #[test]
    fn applied_plan_sorts_to_displayed_order(
        board in arb_board(),
        task in any::<Index>(),
        path in prop::collection::vec(arb_target(), 0..6),
        release in arb_target(),
    ) {
        let columns = ColumnSet::default();
        let outcome = drag(&board, &task, &path, &release);
        let plan = plan_reorder(&outcome, &board, &columns);

        let mut applied = board.clone();
        for item in &plan.changes {
            if let Some(task) = applied.iter_mut().find(|t| t.id == item.task_id) {
                item.apply_to(task);
            }
        }
        sort_board_order(&mut applied);

        for status in STATUSES {
            let column = ColumnId::new(status);
            prop_assert_eq!(column_ids(&applied, status), plan.predicted.column_ids(&column));
            prop_assert_eq!(column_ids(&applied, status), outcome.snapshot.column_ids(&column));
        }
    }

    #[test]
    fn reinsert_at_current_position_is_noop(board in arb_board(), task in any::<Index>()) {
        let mut snapshot = WorkingSnapshot::from_confirmed(&board, &ColumnSet::default());
        let id = task.get(&board).id;
        let position = snapshot.position_of(id).unwrap();
        let before = snapshot.clone();

        prop_assert!(!snapshot.move_task(id, &position.column, position.index));
        prop_assert_eq!(snapshot, before);
    }

    #[test]
    fn repeated_hover_is_idempotent(
        board in arb_board(),
        task in any::<Index>(),
        target in arb_target(),
    ) {
        let mut controller = DragController::new(ColumnSet::default());
        controller.handle(DragEvent::Start {
            task_id: task.get(&board).id,
            confirmed: board.clone(),
        });
        let target = bind(&target, &board);
        controller.handle(DragEvent::Over(target.clone()));
        let once = controller.snapshot().cloned();
        prop_assert!(controller.handle(DragEvent::Over(target)).is_empty());
        prop_assert_eq!(controller.snapshot().cloned(), once);
    }

    #[test]
    fn distinct_keys_need_at_most_one_record(
        board in arb_keyed_board(),
        task in any::<Index>(),
        path in prop::collection::vec(arb_target(), 0..6),
        release in arb_target(),
    ) {
        let outcome = drag(&board, &task, &path, &release);
        let plan = plan_reorder(&outcome, &board, &ColumnSet::default());

        let moved = outcome.destination != outcome.origin;
        prop_assert_eq!(plan.changes.len(), usize::from(moved));
        prop_assert!(!plan.rebalanced);
        if let Some(item) = plan.changes.first() {
            prop_assert_eq!(item.task_id, outcome.task_id);
        }
    }

    #[test]
    fn only_dropped_unkeyed_or_tied_tasks_are_rekeyed(
        board in arb_board(),
        task in any::<Index>(),
        path in prop::collection::vec(arb_target(), 0..6),
        release in arb_target(),
    ) {
        let outcome = drag(&board, &task, &path, &release);
        let plan = plan_reorder(&outcome, &board, &ColumnSet::default());

        prop_assert!(!plan.rebalanced);
        for item in plan.changes.iter().filter(|c| c.task_id != outcome.task_id) {
            let before = board.iter().find(|t| t.id == item.task_id).unwrap();
            let tied = board.iter().any(|t| {
                t.id != before.id
                    && t.status == before.status
                    && t.order_in_list == before.order_in_list
            });
            prop_assert!(
                before.order_in_list.is_none() || tied,
                "task {} with a unique key was rekeyed", before.id
            );
            prop_assert_eq!(item.new_status.as_ref(), None);
        }
    }

    #[test]
    fn newest_unkeyed_task_appended_needs_only_status(
        board in arb_unkeyed_board(),
        column in 0..STATUSES.len(),
    ) {
        let newest = board.iter().map(|t| t.id).max().unwrap();
        let outcome = drag_task(&board, newest, &[], &TargetPick::Column(column));
        let plan = plan_reorder(&outcome, &board, &ColumnSet::default());

        let moved = outcome.destination != outcome.origin;
        prop_assert_eq!(plan.changes.len(), usize::from(moved));
        if let Some(item) = plan.changes.first() {
            prop_assert_eq!(item.task_id, newest);
            prop_assert_eq!(item.new_order_in_list, None);
            prop_assert_eq!(item.new_status.as_ref(), Some(&ColumnId::new(STATUSES[column])));
        }
    }
}
