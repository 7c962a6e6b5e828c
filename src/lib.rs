//! Launchboard Positioning Engine
//!
//! Layered architecture:
//! - domain: Items, placements and errors
//! - repository: In-memory item set (single source of truth)
//! - reconciler: Pure move/compaction batch computation
//! - controller: Drag lifecycle with optimistic apply and rollback
//! - gateway: Persistence traits and the SQLite store
//! - commands: Dashboard service used by the application shell
//! - config: Settings file

pub mod commands;
pub mod config;
pub mod controller;
pub mod domain;
pub mod gateway;
pub mod reconciler;
pub mod repository;

use std::path::Path;

pub use commands::{Dashboard, LoadStatus};
pub use config::Settings;
pub use controller::{DragController, DragEvent, DragPhase, DropOutcome};
pub use domain::{DomainError, DomainResult, Item, ItemId, ItemKind, ItemPatch, Placement, PositionUpdate};
pub use reconciler::{DropTarget, MoveBatch, MoveRequest, Reconciliation};
pub use rolling_logger::{LogEntry, LogHandle, LoggerError};

/// Install the global rolling logger described by `settings`
pub fn init_logging(settings: &Settings) -> Result<LogHandle, LoggerError> {
    rolling_logger::init_with(settings.logger_config())
}

/// Load settings, start logging and open the dashboard
pub async fn start(settings_path: &Path) -> DomainResult<Dashboard> {
    let settings = Settings::load(settings_path)?;
    if let Err(e) = init_logging(&settings) {
        eprintln!("Failed to init logger: {}", e);
    }
    Dashboard::open(settings).await
}
