//! Integration tests for overlapping syncs and rollback.
//!
//! Uses the in-process loopback service so replies can be held back and
//! released in any order:
//! - A reply that arrives after a newer commit is reported stale
//! - A failed sync leaves the confirmed store exactly as it was
//! - Each drop is diffed against the store as it is when the drop lands

use std::sync::Arc;

use taskboard::drag::{DragController, DragEffect, DragEvent, DragTarget, DropOutcome};
use taskboard::remote::RemoteError;
use taskboard::remote::loopback::LoopbackTaskService;
use taskboard::store::InMemoryTaskStore;
use taskboard::sync::{SyncEngine, SyncError, SyncOutcome};
use taskboard_proto::column::ColumnSet;
use taskboard_proto::task::{Scope, Task, TaskId};

type Engine = SyncEngine<InMemoryTaskStore, LoopbackTaskService>;

fn board() -> Vec<Task> {
    vec![
        Task::new(TaskId::new(1), "one", "todo").with_order(1.0),
        Task::new(TaskId::new(2), "two", "todo").with_order(2.0),
        Task::new(TaskId::new(3), "three", "todo").with_order(3.0),
        Task::new(TaskId::new(5), "five", "done").with_order(1.0),
        Task::new(TaskId::new(9), "nine", "done").with_order(2.0),
    ]
}

fn engine() -> Arc<Engine> {
    let columns = ColumnSet::default();
    Arc::new(SyncEngine::new(
        Arc::new(InMemoryTaskStore::new(board())),
        LoopbackTaskService::new(board(), columns.clone()),
        columns,
        Scope::Board,
    ))
}

fn drag(confirmed: Vec<Task>, id: u64, target: DragTarget) -> DropOutcome {
    let mut controller = DragController::new(ColumnSet::default());
    controller.handle(DragEvent::Start {
        task_id: TaskId::new(id),
        confirmed,
    });
    match controller.handle(DragEvent::Drop(Some(target))).pop() {
        Some(DragEffect::Dropped(outcome)) => *outcome,
        other => panic!("expected a drop, got {other:?}"),
    }
}

fn column(tasks: &[Task], status: &str) -> Vec<u64> {
    tasks
        .iter()
        .filter(|t| t.status.as_str() == status)
        .map(|t| t.id.get())
        .collect()
}

#[tokio::test]
async fn late_reply_of_older_sync_is_stale() {
    let engine = engine();

    // A: started first, its reply is held.
    let gate = engine.remote().hold_next();
    let outcome_a = drag(engine.confirmed(), 1, DragTarget::Column("done".into()));
    let pending_a = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move { engine.submit(&outcome_a).await })
    };
    while engine.remote().submissions().is_empty() {
        tokio::task::yield_now().await;
    }

    // B: started second, resolves first.
    let outcome_b = drag(engine.confirmed(), 3, DragTarget::Slot {
        column: "todo".into(),
        index: 0,
    });
    let result_b = engine.submit(&outcome_b).await.unwrap();
    let SyncOutcome::Committed { sequence: seq_b, .. } = result_b else {
        panic!("expected B to commit, got {result_b:?}");
    };
    assert_eq!(seq_b, 2);
    let after_b = engine.confirmed();

    gate.release();
    let result_a = pending_a.await.unwrap().unwrap();
    assert_eq!(
        result_a,
        SyncOutcome::Stale {
            sequence: 1,
            latest: 2
        }
    );
    assert_eq!(engine.confirmed(), after_b);
    assert_eq!(engine.remote().submissions().len(), 2);
}

#[tokio::test]
async fn rejected_sync_restores_pre_drag_state() {
    let engine = engine();
    let before = engine.confirmed();
    engine.remote().fail_next(RemoteError::Rejected {
        status: 422,
        detail: "nope".to_string(),
    });

    let outcome = drag(engine.confirmed(), 2, DragTarget::Column("done".into()));
    let result = engine.submit(&outcome).await;

    assert!(matches!(
        result,
        Err(SyncError::Remote(RemoteError::Rejected { status: 422, .. }))
    ));
    assert_eq!(engine.confirmed(), before);
    assert_eq!(engine.remote().tasks(), before);
}

#[tokio::test]
async fn timeout_is_recoverable_and_retry_succeeds() {
    let engine = engine();
    engine.remote().fail_next(RemoteError::Timeout);

    let outcome = drag(engine.confirmed(), 2, DragTarget::Column("done".into()));
    assert!(engine.submit(&outcome).await.is_err());

    let retried = engine.submit(&outcome).await.unwrap();
    assert!(matches!(retried, SyncOutcome::Committed { .. }));
    assert_eq!(column(&engine.confirmed(), "done"), vec![5, 9, 2]);
}

#[tokio::test]
async fn single_move_sends_single_record() {
    let engine = engine();
    let outcome = drag(engine.confirmed(), 3, DragTarget::Task(TaskId::new(2)));
    engine.submit(&outcome).await.unwrap();

    let submissions = engine.remote().submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].len(), 1);
    assert_eq!(submissions[0][0].task_id, TaskId::new(3));
    assert_eq!(submissions[0][0].new_order_in_list, Some(1.5));
    assert_eq!(column(&engine.confirmed(), "todo"), vec![1, 3, 2]);
}

#[tokio::test]
async fn drop_is_diffed_against_current_store() {
    let engine = engine();
    // Drag computed against the initial board...
    let stale_view = engine.confirmed();
    let first = drag(stale_view.clone(), 3, DragTarget::Slot {
        column: "todo".into(),
        index: 0,
    });
    // ...but another drop commits before it is submitted.
    let other = drag(stale_view, 9, DragTarget::Slot {
        column: "todo".into(),
        index: 0,
    });
    engine.submit(&other).await.unwrap();
    assert_eq!(column(&engine.confirmed(), "todo"), vec![9, 1, 2, 3]);

    // Task 3 was dropped before task 1, which is still its successor.
    engine.submit(&first).await.unwrap();
    assert_eq!(column(&engine.confirmed(), "todo"), vec![9, 3, 1, 2]);
    let last = engine.remote().submissions().pop().unwrap();
    assert_eq!(last.len(), 1);
}

#[tokio::test]
async fn refresh_after_failed_sync_shows_server_state() {
    let engine = engine();
    engine.remote().fail_next(RemoteError::Unavailable("offline".into()));
    let outcome = drag(engine.confirmed(), 1, DragTarget::Column("done".into()));
    assert!(engine.submit(&outcome).await.is_err());

    let mut changed = board();
    changed[0].status = "in_progress".into();
    engine.remote().set_tasks(changed);

    let result = engine.refresh().await.unwrap();
    assert!(matches!(result, SyncOutcome::Committed { .. }));
    assert_eq!(column(&engine.confirmed(), "in_progress"), vec![1]);
    assert_eq!(engine.remote().fetch_count(), 1);
}
