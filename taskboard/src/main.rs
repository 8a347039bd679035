//! `taskboard`: command-line client for a kanban board.
//!
//! Prints the board or moves a task, going through the same drag and
//! sync machinery an interactive front end uses. Configuration via CLI
//! flags, environment variables, or config file
//! (`~/.config/taskboard/config.toml`).
//!
//! ```bash
//! # Print every column
//! cargo run --bin taskboard -- show
//!
//! # Move task 3 to the end of "done", then to the top of "todo"
//! cargo run --bin taskboard -- move 3 done
//! cargo run --bin taskboard -- move 3 todo --index 0
//!
//! # Point at another server
//! TASKBOARD_SERVER_URL=http://10.0.0.5:8000/api cargo run --bin taskboard -- show
//! ```

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskboard::board::group_by_column;
use taskboard::config::{CliArgs, ClientConfig, Command, ConfigError};
use taskboard::drag::{DragController, DragEffect, DragEvent, DragRejection, DragTarget};
use taskboard::remote::RemoteError;
use taskboard::remote::http::HttpTaskService;
use taskboard::store::InMemoryTaskStore;
use taskboard::sync::{SyncEngine, SyncError, SyncOutcome};
use taskboard_proto::column::ColumnId;
use taskboard_proto::task::TaskId;

type Engine = SyncEngine<InMemoryTaskStore, HttpTaskService>;

/// Failures reported to the user.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Drag(#[from] DragRejection),
    #[error("unknown column '{0}'")]
    UnknownColumn(ColumnId),
    #[error("move of task {0} was not applied")]
    NotApplied(TaskId),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: CliArgs) -> Result<(), CliError> {
    let config = ClientConfig::load(&cli)?;
    tracing::info!(server = %config.server_url, scope = %config.scope, "taskboard starting");

    let remote = HttpTaskService::new(config.server_url.clone(), config.request_timeout)?;
    let engine = SyncEngine::new(
        Arc::new(InMemoryTaskStore::default()),
        remote,
        config.columns.clone(),
        config.scope,
    );
    engine.refresh().await?;

    match cli.command.unwrap_or(Command::Show) {
        Command::Show => {}
        Command::Move {
            task_id,
            column,
            index,
        } => move_task(&engine, task_id, ColumnId::new(column), index).await?,
    }
    print_board(&engine);
    Ok(())
}

/// Drives one drag from pick-up to drop and syncs the result.
async fn move_task(
    engine: &Engine,
    task_id: TaskId,
    column: ColumnId,
    index: Option<usize>,
) -> Result<(), CliError> {
    if !engine.columns().contains(&column) {
        return Err(CliError::UnknownColumn(column));
    }
    let target = match index {
        Some(index) => DragTarget::Slot { column, index },
        None => DragTarget::Column(column),
    };

    let mut controller = DragController::new(engine.columns().clone());
    let mut effects = controller.handle(DragEvent::Start {
        task_id,
        confirmed: engine.confirmed(),
    });
    effects.extend(controller.handle(DragEvent::Drop(Some(target))));

    for effect in effects {
        match effect {
            DragEffect::Rejected(rejection) => return Err(rejection.into()),
            DragEffect::Dropped(outcome) => {
                return match engine.submit(&outcome).await? {
                    SyncOutcome::Unchanged => {
                        println!("Task {task_id} is already at {}", outcome.destination);
                        Ok(())
                    }
                    SyncOutcome::Committed { .. } => {
                        println!("Moved task {task_id} to {}", outcome.destination);
                        Ok(())
                    }
                    SyncOutcome::Stale { .. } => Err(CliError::NotApplied(task_id)),
                };
            }
            DragEffect::Started { .. } | DragEffect::Moved { .. } | DragEffect::Cancelled { .. } => {}
        }
    }
    Err(CliError::NotApplied(task_id))
}

fn print_board(engine: &Engine) {
    let tasks = engine.confirmed();
    let view = group_by_column(&tasks, engine.columns());
    for column in view.columns() {
        println!("{} ({})", column.column.label, column.tasks.len());
        for task in &column.tasks {
            let key = task
                .order_in_list
                .map_or_else(|| "-".to_string(), |k| k.to_string());
            println!("  #{:<5} {:<40} [{key}]", task.id.get(), task.title);
        }
    }
}

/// Initialize logging to stderr, or to `file_path` when given.
///
/// Returns a [`WorkerGuard`] for file logging that must be held until
/// shutdown so buffered entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some(log_path) = file_path else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
        return None;
    };

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;
    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}
