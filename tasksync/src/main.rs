//! tasksync client -- list and create tasks through the sync engine.
//!
//! # Usage
//!
//! ```bash
//! # First page from the default server (http://127.0.0.1:8080)
//! cargo run --bin tasksync
//!
//! # Every page
//! cargo run --bin tasksync -- list --all
//!
//! # Create a task
//! cargo run --bin tasksync -- add "buy milk"
//!
//! # Another server, with debug logs in a file
//! TASKSYNC_URL=http://10.0.0.5:8080 cargo run --bin tasksync -- \
//!     --log-level debug --log-file /tmp/tasksync.log list
//! ```

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tasksync::api::http::HttpApiClient;
use tasksync::config::{CliArgs, ClientConfig, Command};
use tasksync::selectors;
use tasksync::{Action, LoadStatus, Store};
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Hold the guard so buffered file logs are flushed on exit.
    let _log_guard = init_logging(&config.log_level, cli.log_file.as_deref());

    let api = match HttpApiClient::new(&config.server_url) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(server = %config.server_url, page_size = config.page_size, "client starting");

    let store = Store::new(api, config.engine_config());
    match cli.command.unwrap_or(Command::List { all: false }) {
        Command::List { all } => list(&store, all).await,
        Command::Add { text } => add(&store, text).await,
    }
}

/// Initialize file-based logging via `tracing-appender`, or stderr logging
/// when no file is given.
///
/// Returns a guard that must be held for the lifetime of the program to
/// ensure buffered logs are flushed.
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

async fn list(store: &Store<HttpApiClient>, all: bool) -> ExitCode {
    store.dispatch(Action::RequestReload);
    store.settle().await;

    while all && selectors::has_more(&store.state()) {
        store.dispatch(Action::RequestNextPage);
        store.settle().await;
        if selectors::load_status(&store.state()) == LoadStatus::Error {
            break;
        }
    }

    let state = store.state();
    for task in selectors::ordered_tasks(&state) {
        let mark = if task.is_complete { 'x' } else { ' ' };
        println!("{} [{mark}] {}", task.id, task.text);
    }

    if let Some(message) = selectors::last_error(&state) {
        eprintln!("Error: failed to load tasks: {message}");
        return ExitCode::FAILURE;
    }
    if selectors::has_more(&state) {
        eprintln!("(more tasks available, use `list --all`)");
    }
    ExitCode::SUCCESS
}

async fn add(store: &Store<HttpApiClient>, text: String) -> ExitCode {
    let mut actions = store.actions();
    store.dispatch(Action::EditDraft { text });
    let temp_id = store.submit_draft();
    store.settle().await;

    while let Ok(action) = actions.try_recv() {
        match action {
            Action::CreateConfirmed {
                temp_id: confirmed,
                record_id,
            } if confirmed == temp_id => {
                println!("{record_id}");
                return ExitCode::SUCCESS;
            }
            Action::CreateFailed {
                temp_id: failed,
                message,
            } if failed == temp_id => {
                eprintln!("Error: create failed: {message}");
                return ExitCode::FAILURE;
            }
            Action::RequestReload => {
                eprintln!("Error: server response did not identify the new task");
                return ExitCode::FAILURE;
            }
            _ => {}
        }
    }

    eprintln!("Error: create did not complete");
    ExitCode::FAILURE
}
