//! Settings
//!
//! Engine settings read from a JSON file. Every field has a default so a
//! missing file, or a file with only some keys, still yields a full config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use rolling_logger::{parse_rotation, LoggerConfig, Rotation};

use crate::domain::{DomainError, DomainResult};

/// Log file stem
pub const APP_NAME: &str = "launchboard";

fn default_db_path() -> PathBuf {
    PathBuf::from("launchboard.db")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_capacity() -> usize {
    500
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

fn default_log_max_files() -> usize {
    5
}

fn default_drag_threshold() -> u32 {
    dragdrop::DRAG_THRESHOLD_PX
}

fn default_persist_timeout() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Entries kept for the log panel
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    /// `minutely`, `hourly`, `daily` or `never`
    #[serde(default = "default_log_rotation")]
    pub log_rotation: String,
    /// Rotated log files kept on disk
    #[serde(default = "default_log_max_files")]
    pub log_max_files: usize,
    /// Pointer travel before a press becomes a drag
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold_px: u32,
    /// Upper bound on a single position submit
    #[serde(default = "default_persist_timeout")]
    pub persist_timeout_ms: u64,
    /// Re-number the former container right after a delete
    #[serde(default = "default_true")]
    pub compact_on_delete: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_dir: default_log_dir(),
            log_capacity: default_log_capacity(),
            log_rotation: default_log_rotation(),
            log_max_files: default_log_max_files(),
            drag_threshold_px: default_drag_threshold(),
            persist_timeout_ms: default_persist_timeout(),
            compact_on_delete: true,
        }
    }
}

impl Settings {
    /// Load settings from `path`; a missing file means defaults
    pub fn load(path: &Path) -> DomainResult<Self> {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Storage(format!("Failed to read settings: {}", e)))?;
        let settings: Settings = serde_json::from_str(&raw)
            .map_err(|e| DomainError::InvalidInput(format!("Malformed settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> DomainResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| DomainError::Storage(format!("Failed to write settings: {}", e)))
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.persist_timeout_ms == 0 {
            return Err(DomainError::InvalidInput(
                "persist_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.log_capacity == 0 || self.log_max_files == 0 {
            return Err(DomainError::InvalidInput(
                "log_capacity and log_max_files must be greater than zero".to_string(),
            ));
        }
        if parse_rotation(&self.log_rotation).is_none() {
            return Err(DomainError::InvalidInput(format!(
                "Unknown log_rotation: {}",
                self.log_rotation
            )));
        }
        Ok(())
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }

    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig::new(self.log_dir.clone(), APP_NAME)
            .with_capacity(self.log_capacity)
            .with_rotation(parse_rotation(&self.log_rotation).unwrap_or(Rotation::DAILY))
            .with_max_files(self.log_max_files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.drag_threshold_px, 8);
        assert_eq!(settings.persist_timeout(), Duration::from_secs(5));
        assert!(settings.compact_on_delete);
        assert!(settings.validate().is_ok());

        let logger = settings.logger_config();
        assert_eq!(logger.capacity, 500);
        assert_eq!(logger.app_name, APP_NAME);
        assert_eq!(logger.log_dir, PathBuf::from("logs"));
        assert_eq!(logger.rotation, Rotation::DAILY);
        assert_eq!(logger.max_files, 5);
    }

    #[test]
    fn test_log_rotation_setting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, r#"{"log_rotation": "Hourly", "log_max_files": 2}"#).unwrap();
        let logger = Settings::load(&path).unwrap().logger_config();
        assert_eq!(logger.rotation, Rotation::HOURLY);
        assert_eq!(logger.max_files, 2);

        std::fs::write(&path, r#"{"log_rotation": "weekly"}"#).unwrap();
        assert!(matches!(Settings::load(&path), Err(DomainError::InvalidInput(_))));

        std::fs::write(&path, r#"{"log_max_files": 0}"#).unwrap();
        assert!(matches!(Settings::load(&path), Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"persist_timeout_ms": 250, "compact_on_delete": false}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.persist_timeout_ms, 250);
        assert!(!settings.compact_on_delete);
        assert_eq!(settings.log_capacity, 500);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            drag_threshold_px: 12,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_rejects_zero_timeout_and_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        std::fs::write(&path, r#"{"persist_timeout_ms": 0}"#).unwrap();
        assert!(matches!(Settings::load(&path), Err(DomainError::InvalidInput(_))));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(DomainError::InvalidInput(_))));
    }
}
