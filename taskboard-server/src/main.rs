//! `Taskboard` server: REST backend holding the authoritative task list.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 127.0.0.1:8000 with an empty board
//! cargo run --bin taskboard-server
//!
//! # Seed the board from a JSON task list and bind elsewhere
//! cargo run --bin taskboard-server -- --bind 0.0.0.0:8080 --seed tasks.json
//! ```

use std::sync::Arc;

use clap::Parser;
use taskboard_server::config::{ServerCliArgs, ServerConfig};
use taskboard_server::repository::TaskRepository;
use taskboard_server::server;

#[tokio::main]
async fn main() {
    let cli = ServerCliArgs::parse();

    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let tasks = match config.load_seed() {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::error!(error = %e, "failed to load seed tasks");
            std::process::exit(1);
        }
    };
    tracing::info!(
        addr = %config.bind_addr,
        tasks = tasks.len(),
        columns = config.columns.len(),
        "starting taskboard server"
    );

    let repository = Arc::new(TaskRepository::new(tasks, config.columns.clone()));
    match server::serve(&config.bind_addr, repository).await {
        Ok(running) => {
            tracing::info!(addr = %running.addr, "taskboard server listening");
            if let Err(e) = running.task.await {
                tracing::error!(error = %e, "taskboard server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start taskboard server");
            std::process::exit(1);
        }
    }
}
