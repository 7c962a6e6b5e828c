//! Rolling Logger
//!
//! Logging bootstrap for the app: a `tracing-subscriber` registry with an
//! `EnvFilter`, a plain-text fmt layer writing through a time-rotated
//! `tracing-appender` file, and a ring-buffer layer that keeps recent entries
//! for display. Records emitted through the `log` facade are bridged into the
//! same subscriber.

mod ring;

pub use ring::{LogEntry, RingBuffer, RingLayer};
pub use tracing_appender::rolling::Rotation;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::Subscriber;
use tracing_appender::rolling::{InitError, RollingFileAppender};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Suffix of every log file
pub const LOG_SUFFIX: &str = "log";

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to prepare log directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to open log file: {0}")]
    Appender(#[from] InitError),
    #[error("Invalid log filter: {0}")]
    Filter(String),
    #[error("Logger already initialized")]
    AlreadyInitialized,
    #[error("Logger not initialized")]
    NotInitialized,
}

/// Parse a rotation period name
pub fn parse_rotation(s: &str) -> Option<Rotation> {
    match s.to_lowercase().as_str() {
        "minutely" => Some(Rotation::MINUTELY),
        "hourly" => Some(Rotation::HOURLY),
        "daily" => Some(Rotation::DAILY),
        "never" => Some(Rotation::NEVER),
        _ => None,
    }
}

/// Logger settings
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    /// File name prefix: `<app_name>.<date>.log`
    pub app_name: String,
    /// Entries kept in memory
    pub capacity: usize,
    pub rotation: Rotation,
    /// Rotated files kept; older ones are pruned on rollover
    pub max_files: usize,
    /// `EnvFilter` directives
    pub filter: String,
}

impl LoggerConfig {
    pub fn new(log_dir: impl Into<PathBuf>, app_name: impl Into<String>) -> Self {
        Self {
            log_dir: log_dir.into(),
            app_name: app_name.into(),
            capacity: 500,
            rotation: Rotation::DAILY,
            max_files: 5,
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

/// Access to the in-memory entries and the log directory
#[derive(Clone)]
pub struct LogHandle {
    buffer: RingBuffer,
    log_dir: PathBuf,
    app_name: String,
}

impl LogHandle {
    /// Recent entries, oldest first
    pub fn recent(&self) -> Vec<LogEntry> {
        self.buffer.snapshot()
    }

    pub fn clear(&self) {
        self.buffer.clear();
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Log files written by this logger, oldest name first
    pub fn log_files(&self) -> std::io::Result<Vec<PathBuf>> {
        let prefix = format!("{}.", self.app_name);
        let suffix = format!(".{}", LOG_SUFFIX);
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.log_dir)? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(&suffix));
            if matches {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

static HANDLE: OnceLock<LogHandle> = OnceLock::new();

// ========================
// Setup
// ========================

/// Build the subscriber without installing it
pub fn build_subscriber(
    config: &LoggerConfig,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogHandle), LoggerError> {
    let filter = EnvFilter::try_new(&config.filter).map_err(|e| LoggerError::Filter(e.to_string()))?;

    std::fs::create_dir_all(&config.log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(config.rotation.clone())
        .filename_prefix(config.app_name.as_str())
        .filename_suffix(LOG_SUFFIX)
        .max_log_files(config.max_files.max(1))
        .build(&config.log_dir)?;

    let buffer = RingBuffer::new(config.capacity);
    let file_layer = fmt::layer()
        .with_writer(appender)
        .with_ansi(false)
        .with_target(true);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(RingLayer::new(buffer.clone()));

    let handle = LogHandle {
        buffer,
        log_dir: config.log_dir.clone(),
        app_name: config.app_name.clone(),
    };
    Ok((subscriber, handle))
}

/// Install the global logger with default limits
pub fn init_logger(log_dir: impl Into<PathBuf>, app_name: &str) -> Result<LogHandle, LoggerError> {
    init_with(LoggerConfig::new(log_dir, app_name))
}

/// Install the global logger; fails when one is already installed
pub fn init_with(config: LoggerConfig) -> Result<LogHandle, LoggerError> {
    if HANDLE.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }

    let (subscriber, handle) = build_subscriber(&config)?;
    subscriber.try_init().map_err(|_| LoggerError::AlreadyInitialized)?;
    let _ = HANDLE.set(handle.clone());

    tracing::info!("Logging to {}", handle.log_dir().display());
    Ok(handle)
}

/// Handle of the installed logger
pub fn handle() -> Option<&'static LogHandle> {
    HANDLE.get()
}

// ========================
// Call-site helpers
// ========================

fn installed() -> Result<(), LoggerError> {
    HANDLE.get().map(|_| ()).ok_or(LoggerError::NotInitialized)
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    installed()?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn warn(message: &str) -> Result<(), LoggerError> {
    installed()?;
    tracing::warn!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    installed()?;
    tracing::error!("{}", message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_captures_events() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggerConfig::new(dir.path(), "test-app")
            .with_capacity(10)
            .with_rotation(Rotation::NEVER)
            .with_filter("debug");
        let (subscriber, handle) = build_subscriber(&config).unwrap();

        tracing::subscriber::with_default(subscriber, || {
            tracing::trace!("filtered out");
            tracing::info!("hello");
            tracing::warn!(id = 3, "moved");
        });

        let recent = handle.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].level, "INFO");
        assert_eq!(recent[0].message, "hello");
        assert_eq!(recent[1].level, "WARN");
        assert_eq!(recent[1].message, "moved id=3");

        let files = handle.log_files().unwrap();
        assert_eq!(files, vec![dir.path().join("test-app.log")]);
        let content = std::fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("hello"));
        assert!(!content.contains("filtered out"));
    }

    #[test]
    fn test_daily_files_carry_the_date() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");
        let config = LoggerConfig::new(&logs, "test-app").with_filter("info");
        let (subscriber, handle) = build_subscriber(&config).unwrap();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("dated");
        });

        let files = handle.log_files().unwrap();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_str().unwrap().to_string();
        assert_ne!(name, "test-app.log");
        assert!(name.starts_with("test-app.") && name.ends_with(".log"));
        assert!(std::fs::read_to_string(&files[0]).unwrap().contains("dated"));
    }

    #[test]
    fn test_parse_rotation() {
        assert_eq!(parse_rotation("Hourly"), Some(Rotation::HOURLY));
        assert_eq!(parse_rotation("daily"), Some(Rotation::DAILY));
        assert_eq!(parse_rotation("never"), Some(Rotation::NEVER));
        assert_eq!(parse_rotation("weekly"), None);
    }

    #[test]
    fn test_bad_filter_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggerConfig::new(dir.path(), "test-app").with_filter("launchboard=loud");
        assert!(matches!(build_subscriber(&config), Err(LoggerError::Filter(_))));
    }

    #[test]
    fn test_helpers_require_init() {
        if handle().is_none() {
            assert!(matches!(info("x"), Err(LoggerError::NotInitialized)));
        }
    }
}
