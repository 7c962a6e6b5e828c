//! Database Connection and Setup
//!
//! Manages the SQLite connection and schema migrations.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult};
use super::migration::migrate_to_unified_positions;

/// Database state wrapper
#[derive(Clone, Default)]
pub struct DbState {
    pub conn: Arc<Mutex<Option<Connection>>>,
}

impl DbState {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        }
    }
}

/// Initialize database at path
pub async fn init_db(db_path: &Path) -> DomainResult<DbState> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DomainError::Storage(format!("Failed to create db dir: {}", e)))?;
        }
    }

    let conn = Connection::open(db_path)
        .map_err(|e| DomainError::Storage(format!("Failed to open db: {}", e)))?;
    prepare(conn)
}

/// Initialize a throwaway in-memory database
pub fn init_memory_db() -> DomainResult<DbState> {
    let conn = Connection::open_in_memory()
        .map_err(|e| DomainError::Storage(format!("Failed to open db: {}", e)))?;
    prepare(conn)
}

fn prepare(mut conn: Connection) -> DomainResult<DbState> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|e| DomainError::Storage(e.to_string()))?;

    run_migrations(&conn)?;
    if migrate_to_unified_positions(&mut conn)? {
        log::info!("Unified positions migration applied");
    }

    Ok(DbState::with_connection(conn))
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let query = format!("PRAGMA table_info({})", table);
    let Ok(mut stmt) = conn.prepare(&query) else {
        return false;
    };
    let Ok(names) = stmt.query_map([], |row| row.get::<_, String>(1)) else {
        return false;
    };
    let found = names.flatten().any(|name| name == column);
    found
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> DomainResult<()> {
    // Items table - create if not exists
    conn.execute(
        "CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            container_id TEXT,
            position INTEGER NOT NULL DEFAULT 0,
            payload TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| DomainError::Storage(e.to_string()))?;

    // Icons arrived after the first schema
    if !column_exists(conn, "items", "icon") {
        conn.execute("ALTER TABLE items ADD COLUMN icon TEXT", [])
            .map_err(|e| DomainError::Storage(format!("Failed to add icon: {}", e)))?;
    }

    // Create index for container-scoped ordered reads
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_container ON items(container_id, position)",
        [],
    )
    .map_err(|e| DomainError::Storage(e.to_string()))?;

    Ok(())
}
