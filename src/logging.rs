//! Logging Setup
//!
//! Console logging through `tracing-subscriber`, plus a daily rolling log file
//! when debug mode is on.

use crate::config::phrasebuddy_home;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const LOG_FILE_PREFIX: &str = "phrasebuddy.log";

/// Logging options, built from CLI flags and config.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub debug_mode: bool,
    pub level: String,
    pub log_dir: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            debug_mode: false,
            level: "info".to_string(),
            log_dir: default_log_dir(),
        }
    }

    /// Debug mode raises the level to `debug` and writes log files.
    pub fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = dir;
        self
    }

    /// `RUST_LOG` wins over the configured level.
    fn env_filter(&self) -> EnvFilter {
        let level = if self.debug_mode { "debug" } else { self.level.as_str() };
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{}={},warn", env!("CARGO_CRATE_NAME"), level)))
    }
}

/// Default log directory: `~/.phrasebuddy/logs`
pub fn default_log_dir() -> PathBuf {
    phrasebuddy_home().join("logs")
}

/// Install the global subscriber.
///
/// Returns the file writer guard in debug mode; keep it alive for the whole run
/// or buffered lines are lost.
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>> {
    let console = fmt::layer().with_target(false).with_filter(config.env_filter());

    if !config.debug_mode {
        tracing_subscriber::registry()
            .with(console)
            .try_init()
            .context("Failed to install tracing subscriber")?;
        return Ok(None);
    }

    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", config.log_dir))?;

    let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = fmt::layer()
        .with_ansi(false)
        .with_thread_ids(true)
        .with_writer(writer)
        .with_filter(config.env_filter());

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!("Debug logging to {:?}", config.log_dir);
    Ok(Some(guard))
}

/// Remove log files older than `days` from the default log directory.
pub fn cleanup_old_logs(days: u64) -> Result<usize> {
    cleanup_logs_in(&default_log_dir(), days)
}

/// Remove `phrasebuddy.log*` files in `dir` last modified more than `days` ago.
pub fn cleanup_logs_in(dir: &Path, days: u64) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let max_age = Duration::from_secs(days * 24 * 60 * 60);
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in std::fs::read_dir(dir).with_context(|| format!("Failed to read {:?}", dir))? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX));
        if !is_log || !path.is_file() {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove old log: {:?}", path))?;
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::new()
            .with_debug_mode(true)
            .with_level("warn")
            .with_log_dir(PathBuf::from("/tmp/pb-logs"));
        assert!(config.debug_mode);
        assert_eq!(config.level, "warn");
        assert_eq!(config.log_dir, PathBuf::from("/tmp/pb-logs"));
    }

    #[test]
    fn test_default_log_dir() {
        assert!(default_log_dir().ends_with(".phrasebuddy/logs"));
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let removed = cleanup_logs_in(Path::new("/nonexistent/phrasebuddy/logs"), 7).unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_cleanup_keeps_fresh_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("phrasebuddy.log.2026-10-15"), "fresh").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        assert_eq!(cleanup_logs_in(dir.path(), 7).unwrap(), 0);
        // zero days: every log file is already too old
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cleanup_logs_in(dir.path(), 0).unwrap(), 1);
        assert!(dir.path().join("notes.txt").exists());
    }
}
