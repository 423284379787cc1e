//! Tracing subscriber setup.
//!
//! The filter is read from `HUD_LOG` (same syntax as `RUST_LOG`). Interactive
//! sessions log to a daily-rolling file because the terminal is owned by the
//! renderer; headless commands log to stderr.

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "HUD_LOG";
const DEFAULT_FILTER: &str = "hud_core=info,hud_tui=info,hud=info";

#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    /// Directory receiving `hud.log.<date>` files.
    File(PathBuf),
}

/// Keeps the background log writer alive; drop it last.
#[must_use = "logs are flushed when the guard is dropped"]
pub struct LogGuard {
    _worker: Option<WorkerGuard>,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber.
///
/// # Errors
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(target: LogTarget) -> Result<LogGuard> {
    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;
            Ok(LogGuard { _worker: None })
        }
        LogTarget::File(dir) => {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(&dir, "hud.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;
            Ok(LogGuard {
                _worker: Some(guard),
            })
        }
    }
}
