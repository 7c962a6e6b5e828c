//! Repository Layer
//!
//! The in-memory item repository: single source of truth for the
//! dashboard, plus the legacy per-kind projections it republishes.

mod item_repo;
mod item_positioning;
mod projection;


pub use item_repo::ItemRepository;
pub use item_positioning::{PatchEntry, PositionPatch, RevertReport};
pub use projection::{LegacyProjections, ProjectionSink};

/// Repository handle shared between the service and the drag controller.
/// The lock is only held for synchronous sections, never across an await.
pub type SharedRepository = std::sync::Arc<tokio::sync::Mutex<ItemRepository>>;
