// File-based logging - installs a tracing subscriber that writes to stderr and to a
// timestamped log file.
//
// Creates a new log file on every launch:
//   <data_dir>/com.voicerecorder.app/logs/voice-recorder-2026-03-01_14-30-00.log
//
// Keeps last 5 log files, deletes older ones.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

const LOG_PREFIX: &str = "voice-recorder-";
const KEEP_LOGS: usize = 5;

/// Initialize logging. Call once at startup; later calls are no-ops.
///
/// Level comes from `RUST_LOG` and defaults to `info`. If the log file cannot be
/// created, logging falls back to stderr only.
pub fn init(logs_dir: &Path) {
    INIT.call_once(|| {
        if let Err(e) = setup_logging(logs_dir) {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(io::stderr)
                .try_init();
            tracing::warn!("Logging: Failed to initialize file logging: {}", e);
        }
    });
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn setup_logging(logs_dir: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    fs::create_dir_all(logs_dir)?;

    rotate_logs(logs_dir, KEEP_LOGS - 1)?;

    let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    let log_file_path = logs_dir.join(format!("{}{}.log", LOG_PREFIX, timestamp));

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)?;

    let writer = io::stderr.and(Mutex::new(log_file));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(writer)
        .try_init()?;

    tracing::info!("Logging: Writing to {}", log_file_path.display());
    Ok(())
}

/// Delete old log files, keeping the most recent `keep` files.
fn rotate_logs(logs_dir: &Path, keep: usize) -> Result<(), io::Error> {
    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();

    for entry in fs::read_dir(logs_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_ours = path.extension().and_then(|e| e.to_str()) == Some("log")
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(LOG_PREFIX))
                .unwrap_or(false);
        if is_ours {
            if let Ok(metadata) = entry.metadata() {
                let modified = metadata.modified().unwrap_or(std::time::UNIX_EPOCH);
                log_files.push((path, modified));
            }
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.iter().skip(keep) {
        let _ = fs::remove_file(path);
    }

    Ok(())
}
