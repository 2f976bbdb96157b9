//! File-based logging for the TUI.
//!
//! Stdout belongs to the terminal UI, so the tracing subscriber writes to
//! rotating daily log files under the data directory instead.
//!
//! - `PIPEDECK_LOG`: base log level for this workspace's crates (default "info")
//! - `PIPEDECK_LOG_DIR`: override the log directory
//! - `PIPEDECK_LOG_MAX_FILES`: daily files to retain (default 7)

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use utils::assets::log_dir;

const LOG_FILE_PREFIX: &str = "pipedeck.log";

/// Initialize the logging system.
///
/// Returns a guard that must be held for the lifetime of the application to
/// ensure all logs are flushed; `None` if the log directory could not be
/// created (the app still runs, just without logs).
pub fn init_logging() -> Option<WorkerGuard> {
    let level = std::env::var("PIPEDECK_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,tui={level},api={level},logs={level},services={level},utils={level}",
        level = level
    );
    let env_filter = EnvFilter::try_new(&filter_string).expect("Failed to create tracing filter");

    let dir = log_dir();
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("Failed to create log directory {dir:?}: {e}");
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = ?dir,
        "pipedeck starting"
    );

    let max_files = std::env::var("PIPEDECK_LOG_MAX_FILES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(7);
    std::thread::spawn(move || cleanup_old_logs(&dir, max_files));

    Some(guard)
}

/// Clean up old log files, keeping only the most recent `max_files`.
fn cleanup_old_logs(dir: &PathBuf, max_files: usize) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(LOG_FILE_PREFIX))
                .unwrap_or(false)
        })
        .filter_map(|e| {
            e.metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(|t| (e.path(), t))
        })
        .collect();

    // Sort by modification time, newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.into_iter().skip(max_files) {
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!("Failed to remove old log file {:?}: {}", path, e);
        }
    }
}
