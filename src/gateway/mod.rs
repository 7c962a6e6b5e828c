//! Gateway Layer
//!
//! The persistence boundary: the traits the engine consumes and the
//! SQLite-backed store that implements them.

mod traits;
mod db;
mod migration;
mod sqlite_store;


pub use traits::{ContainerScope, ItemStore, PersistenceGateway};
pub use db::{init_db, init_memory_db, DbState};
pub use migration::{is_migration_complete, migrate_to_unified_positions, validate_container_positions};
pub use sqlite_store::SqliteStore;
