//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO storage or runtime dependencies.

mod entity;
mod item;
mod placement;

pub use entity::{Entity, DomainError, DomainResult};
pub use item::{Group, Item, ItemId, ItemKind, Monitor, MonitorStatus, MonitorType, Payload, ScriptType, Trigger};
pub use placement::{ItemPatch, Placement, PositionUpdate};
