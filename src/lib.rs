pub mod collections;
pub mod csv;
pub mod db;
pub mod errors;
pub mod forms;
pub mod importer;
pub mod kanban;
pub mod models;
pub mod pages;
pub mod tasks;

pub use crate::errors::{AppError, AppResult};

use crate::db::Database;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Prepares an application data directory: structured logging underneath
/// it, plus the SQLite record store at its canonical location.
pub fn init_app(data_dir: &Path) -> AppResult<Database> {
    std::fs::create_dir_all(data_dir).map_err(|error| AppError::Io(error.to_string()))?;
    init_tracing(data_dir).map_err(AppError::Internal)?;

    let database = Database::new(&data_dir.join("nexus.db"))?;
    tracing::info!(path = %database.path().display(), "record store ready");
    Ok(database)
}

fn init_tracing(app_data_dir: &Path) -> Result<(), String> {
    let log_dir = app_data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "nexus.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}
