use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_NAME: &str = "presence-sync.log";
const LOG_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn,discord_sdk=warn";

/// Install console and daily-rolling file logging.
///
/// The returned guard flushes the file writer when dropped; keep it alive for
/// the whole process.
pub fn init_logging() -> WorkerGuard {
    let log_dir = log_directory();

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("Logging initialized, log directory: {}", log_dir.display());
    tracing::info!("presence-sync version: {}", env!("CARGO_PKG_VERSION"));

    let removed = cleanup_old_logs(&log_dir, SystemTime::now() - LOG_RETENTION);
    if removed > 0 {
        tracing::debug!("Removed {} expired log files", removed);
    }

    guard
}

fn log_directory() -> PathBuf {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("presence-sync")
        .join("logs");

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    log_dir
}

/// Rotated files look like `presence-sync.log.2026-10-01`; the live file is never removed.
fn is_rotated_log(file_name: &str) -> bool {
    file_name.starts_with(LOG_FILE_NAME) && file_name != LOG_FILE_NAME
}

/// Delete rotated log files last modified before `cutoff`, returning how many were removed
fn cleanup_old_logs(log_dir: &Path, cutoff: SystemTime) -> usize {
    let entries = match std::fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to read log directory for cleanup: {}", e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();

        let rotated = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_rotated_log);
        if !rotated {
            continue;
        }

        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };

        if modified < cutoff {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Failed to remove old log file {:?}: {}", path, e),
            }
        }
    }

    removed
}
