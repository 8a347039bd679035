//! End-to-end reorder tests over HTTP.
//!
//! Starts `taskboard-server` in-process and drives the client core
//! against it:
//! - A drag to the end of another column becomes one change record
//! - The server's answer replaces the confirmed store
//! - Rejected batches leave both sides untouched
//! - Project scope is honoured on both endpoints

use std::sync::Arc;
use std::time::Duration;

use taskboard::drag::{DragController, DragEffect, DragEvent, DragTarget, DropOutcome};
use taskboard::remote::http::HttpTaskService;
use taskboard::remote::{RemoteError, RemoteTaskService};
use taskboard::store::{InMemoryTaskStore, TaskStore};
use taskboard::sync::{SyncEngine, SyncError, SyncOutcome};
use taskboard_proto::column::{Column, ColumnSet};
use taskboard_proto::reorder::TaskReorderItem;
use taskboard_proto::task::{ProjectId, Scope, Task, TaskId};
use taskboard_server::repository::TaskRepository;
use url::Url;

type Engine = SyncEngine<InMemoryTaskStore, HttpTaskService>;

fn seed() -> Vec<Task> {
    vec![
        Task::new(TaskId::new(1), "Write docs", "todo")
            .with_order(1.0)
            .with_project(ProjectId::new(1)),
        Task::new(TaskId::new(3), "Fix login", "todo")
            .with_order(2.0)
            .with_project(ProjectId::new(1)),
        Task::new(TaskId::new(5), "Ship v1", "done")
            .with_order(1.0)
            .with_project(ProjectId::new(1)),
        Task::new(TaskId::new(9), "Retro", "done")
            .with_order(2.0)
            .with_project(ProjectId::new(1)),
        Task::new(TaskId::new(20), "Other project", "todo")
            .with_order(1.0)
            .with_project(ProjectId::new(2)),
    ]
}

/// Start the server in-process and return its API root and repository.
async fn start_server() -> (Url, Arc<TaskRepository>) {
    let repository = Arc::new(TaskRepository::new(seed(), ColumnSet::default()));
    let server = taskboard_server::server::serve("127.0.0.1:0", Arc::clone(&repository))
        .await
        .expect("failed to start taskboard server");
    let url = Url::parse(&format!("http://{}/api", server.addr)).unwrap();
    (url, repository)
}

async fn engine(url: Url, scope: Scope) -> Engine {
    let remote = HttpTaskService::new(url, Duration::from_secs(5)).unwrap();
    let engine = SyncEngine::new(
        Arc::new(InMemoryTaskStore::default()),
        remote,
        ColumnSet::default(),
        scope,
    );
    engine.refresh().await.unwrap();
    engine
}

fn drag(engine: &Engine, id: u64, target: DragTarget) -> DropOutcome {
    let mut controller = DragController::new(engine.columns().clone());
    controller.handle(DragEvent::Start {
        task_id: TaskId::new(id),
        confirmed: engine.confirmed(),
    });
    controller.handle(DragEvent::Over(target.clone()));
    match controller.handle(DragEvent::Drop(Some(target))).pop() {
        Some(DragEffect::Dropped(outcome)) => *outcome,
        other => panic!("expected a drop, got {other:?}"),
    }
}

fn column(tasks: &[Task], status: &str) -> Vec<u64> {
    let mut ids: Vec<&Task> = tasks.iter().filter(|t| t.status.as_str() == status).collect();
    ids.sort_by(|a, b| a.board_cmp(b));
    ids.iter().map(|t| t.id.get()).collect()
}

#[tokio::test]
async fn move_to_end_of_done_sends_single_record() {
    let (url, repository) = start_server().await;
    let engine = engine(url, Scope::Project(ProjectId::new(1))).await;

    let outcome = drag(&engine, 3, DragTarget::Column("done".into()));
    let plan = engine.plan(&outcome);
    assert_eq!(
        plan.changes,
        vec![TaskReorderItem {
            task_id: TaskId::new(3),
            new_order_in_list: Some(3.0),
            new_status: Some("done".into()),
            new_project_id: None,
        }]
    );

    let result = engine.submit(&outcome).await.unwrap();
    assert!(matches!(result, SyncOutcome::Committed { .. }));

    let confirmed = engine.confirmed();
    assert_eq!(column(&confirmed, "done"), vec![5, 9, 3]);
    assert_eq!(column(&confirmed, "todo"), vec![1]);
    assert_eq!(
        confirmed,
        repository.list(Scope::Project(ProjectId::new(1))).await
    );
}

#[tokio::test]
async fn move_within_column_takes_midpoint() {
    let (url, _repository) = start_server().await;
    let engine = engine(url, Scope::Board).await;

    let outcome = drag(&engine, 9, DragTarget::Task(TaskId::new(5)));
    engine.submit(&outcome).await.unwrap();

    let confirmed = engine.confirmed();
    assert_eq!(column(&confirmed, "done"), vec![9, 5]);
    let moved = confirmed.iter().find(|t| t.id == TaskId::new(9)).unwrap();
    assert_eq!(moved.order_in_list, Some(0.0));
}

#[tokio::test]
async fn rejected_batch_rolls_back_store() {
    let (url, repository) = start_server().await;
    // The client knows a column the server does not accept.
    let columns = ColumnSet::new(vec![
        Column::new("todo", "To Do"),
        Column::new("blocked", "Blocked"),
        Column::new("done", "Done"),
    ])
    .unwrap();
    let remote = HttpTaskService::new(url, Duration::from_secs(5)).unwrap();
    let engine = SyncEngine::new(
        Arc::new(InMemoryTaskStore::default()),
        remote,
        columns,
        Scope::Board,
    );
    engine.refresh().await.unwrap();
    let before = engine.confirmed();
    let server_before = repository.list(Scope::Board).await;

    let outcome = drag(&engine, 3, DragTarget::Column("blocked".into()));
    let result = engine.submit(&outcome).await;

    assert!(matches!(
        result,
        Err(SyncError::Remote(RemoteError::Rejected { status: 422, .. }))
    ));
    assert_eq!(engine.store().get_all(Scope::Board), before);
    assert_eq!(repository.list(Scope::Board).await, server_before);
}

#[tokio::test]
async fn unknown_status_is_unprocessable() {
    let (url, repository) = start_server().await;
    let remote = HttpTaskService::new(url, Duration::from_secs(5)).unwrap();
    let before = repository.list(Scope::Board).await;

    let items = vec![
        TaskReorderItem {
            new_order_in_list: Some(0.5),
            ..TaskReorderItem::new(TaskId::new(1))
        },
        TaskReorderItem {
            new_status: Some("archived".into()),
            ..TaskReorderItem::new(TaskId::new(3))
        },
    ];
    let result = remote.submit_reorder(Scope::Board, &items).await;
    let Err(RemoteError::Rejected { status, detail }) = result else {
        panic!("expected rejection, got {result:?}");
    };
    assert_eq!(status, 422);
    assert!(detail.contains("archived"), "detail: {detail}");
    assert_eq!(repository.list(Scope::Board).await, before);
}

#[tokio::test]
async fn project_scope_filters_both_endpoints() {
    let (url, _repository) = start_server().await;
    let remote = HttpTaskService::new(url, Duration::from_secs(5)).unwrap();

    let project = Scope::Project(ProjectId::new(2));
    let tasks = remote.fetch_tasks(project).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, TaskId::new(20));

    let items = vec![TaskReorderItem {
        new_status: Some("done".into()),
        ..TaskReorderItem::new(TaskId::new(20))
    }];
    let tasks = remote.submit_reorder(project, &items).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status.as_str(), "done");

    let board = remote.fetch_tasks(Scope::Board).await.unwrap();
    assert_eq!(board.len(), 5);
}

#[tokio::test]
async fn empty_server_serves_empty_board() {
    let repository = Arc::new(TaskRepository::new(Vec::new(), ColumnSet::default()));
    let addr = taskboard_server::server::serve("127.0.0.1:0", repository)
        .await
        .expect("failed to start taskboard server")
        .addr;
    let url = Url::parse(&format!("http://{addr}/api")).unwrap();
    let engine = engine(url, Scope::Board).await;
    assert!(engine.confirmed().is_empty());

    let health = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(health, "ok");
}

#[tokio::test]
async fn task_json_uses_plain_fields() {
    let (url, _repository) = start_server().await;
    let body: serde_json::Value = reqwest::get(format!("{url}/tasks?project_id=2"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body,
        serde_json::json!([{
            "id": 20,
            "title": "Other project",
            "status": "todo",
            "order_in_list": 1.0,
            "project_id": 2
        }])
    );
}
