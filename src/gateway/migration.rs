//! Unified Positions Migration
//!
//! Older databases numbered each kind separately. This one-shot migration
//! assigns unified positions while preserving relative order:
//! - root: monitors first, then groups, then triggers
//! - inside each group: monitors, then triggers
//!
//! Within a kind the previous position (then creation time) decides.

use rusqlite::{params, Connection, Transaction};
use std::collections::HashSet;

use crate::domain::{DomainError, DomainResult};

const MIGRATION_NAME: &str = "unified_positions";

struct Row {
    id: String,
    kind: String,
    container_id: Option<String>,
}

/// Check if the unified position migration has already been completed
pub fn is_migration_complete(conn: &Connection) -> DomainResult<bool> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migration_status (
            migration_name TEXT PRIMARY KEY,
            completed_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| DomainError::Storage(e.to_string()))?;

    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM migration_status WHERE migration_name = ?1",
            params![MIGRATION_NAME],
            |row| row.get(0),
        )
        .map_err(|e| DomainError::Storage(e.to_string()))?;

    Ok(count > 0)
}

/// Run the migration if needed; returns whether it ran
pub fn migrate_to_unified_positions(conn: &mut Connection) -> DomainResult<bool> {
    if is_migration_complete(conn)? {
        return Ok(false);
    }

    let tx = conn
        .transaction()
        .map_err(|e| DomainError::Storage(e.to_string()))?;

    let rows = load_rows(&tx)?;
    let groups: Vec<&Row> = rows.iter().filter(|r| r.kind == "group").collect();

    // Root: monitors, groups, triggers
    let mut position = 0u32;
    for kind in ["monitor", "group", "trigger"] {
        for row in rows.iter().filter(|r| r.kind == kind && r.container_id.is_none()) {
            set_position(&tx, &row.id, position)?;
            position += 1;
        }
    }

    // Each group keeps its own sequence: monitors, triggers
    for group in &groups {
        let mut position = 0u32;
        for kind in ["monitor", "trigger"] {
            for row in rows
                .iter()
                .filter(|r| r.kind == kind && r.container_id.as_deref() == Some(group.id.as_str()))
            {
                set_position(&tx, &row.id, position)?;
                position += 1;
            }
        }
    }

    validate_container_positions(&tx, None)?;
    for group in &groups {
        validate_container_positions(&tx, Some(&group.id))?;
    }

    tx.execute(
        "INSERT INTO migration_status (migration_name, completed_at) VALUES (?1, ?2)",
        params![MIGRATION_NAME, chrono::Utc::now().timestamp()],
    )
    .map_err(|e| DomainError::Storage(e.to_string()))?;

    tx.commit().map_err(|e| DomainError::Storage(e.to_string()))?;
    Ok(true)
}

fn load_rows(tx: &Transaction<'_>) -> DomainResult<Vec<Row>> {
    let mut stmt = tx
        .prepare("SELECT id, kind, container_id FROM items ORDER BY position ASC, created_at ASC, id ASC")
        .map_err(|e| DomainError::Storage(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Row {
                id: row.get(0)?,
                kind: row.get(1)?,
                container_id: row.get(2)?,
            })
        })
        .map_err(|e| DomainError::Storage(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DomainError::Storage(e.to_string()))?;
    Ok(rows)
}

fn set_position(tx: &Transaction<'_>, id: &str, position: u32) -> DomainResult<()> {
    tx.execute(
        "UPDATE items SET position = ?1 WHERE id = ?2",
        params![position, id],
    )
    .map_err(|e| DomainError::Storage(e.to_string()))?;
    Ok(())
}

/// Validate positions in a specific container: unique and consecutive
pub fn validate_container_positions(conn: &Connection, container_id: Option<&str>) -> DomainResult<()> {
    let mut stmt = conn
        .prepare("SELECT position FROM items WHERE container_id IS ?1 ORDER BY position")
        .map_err(|e| DomainError::Storage(e.to_string()))?;
    let positions = stmt
        .query_map(params![container_id], |row| row.get::<_, u32>(0))
        .map_err(|e| DomainError::Storage(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DomainError::Storage(e.to_string()))?;

    let mut seen = HashSet::new();
    for (expected, position) in positions.iter().enumerate() {
        if !seen.insert(*position) {
            return Err(DomainError::InvalidInput(format!(
                "Duplicate position {} found in container {:?}",
                position, container_id
            )));
        }
        if *position != expected as u32 {
            return Err(DomainError::InvalidInput(format!(
                "Gap in positions: expected {} but found {} in container {:?}",
                expected, position, container_id
            )));
        }
    }
    Ok(())
}
