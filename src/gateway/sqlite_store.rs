//! SQLite Item Store
//!
//! `rusqlite`-backed implementation of the persistence gateway. One `items`
//! table holds every kind; kind-specific fields are a JSON payload column.
//! Position batches are written in a single transaction and validated
//! before commit, so a batch either lands completely or not at all.

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{DomainError, DomainResult, Item, ItemId, ItemKind, Payload, PositionUpdate};
use super::db::{init_db, init_memory_db, DbState};
use super::migration::validate_container_positions;
use super::traits::{ContainerScope, ItemStore, PersistenceGateway};

const SELECT_ITEMS: &str =
    "SELECT id, kind, name, icon, container_id, position, payload, created_at, updated_at FROM items";

/// SQLite implementation of the item store
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteStore {
    pub fn new(state: DbState) -> Self {
        Self { conn: state.conn }
    }

    /// Open (and migrate) the database file at `path`
    pub async fn open(path: &Path) -> DomainResult<Self> {
        Ok(Self::new(init_db(path).await?))
    }

    /// Fresh in-memory database, used by tests and previews
    pub fn open_in_memory() -> DomainResult<Self> {
        Ok(Self::new(init_memory_db()?))
    }

    /// Check that the stored positions of `container` are gapless
    pub async fn validate_container(&self, container: Option<&ItemId>) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Storage("Database not initialized".to_string()))?;
        validate_container_positions(conn, container.map(|c| c.as_str()))
    }
}

// ========================
// Row mapping
// ========================

struct ItemRow {
    id: String,
    kind: String,
    name: String,
    icon: Option<String>,
    container_id: Option<String>,
    position: u32,
    payload: String,
    created_at: i64,
    updated_at: i64,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        name: row.get(2)?,
        icon: row.get(3)?,
        container_id: row.get(4)?,
        position: row.get(5)?,
        payload: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl ItemRow {
    fn into_item(self) -> DomainResult<Item> {
        let payload: Payload = serde_json::from_str(&self.payload)
            .map_err(|e| DomainError::Storage(format!("Bad payload for {}: {}", self.id, e)))?;
        if payload.kind().as_str() != self.kind {
            return Err(DomainError::Storage(format!(
                "Item {} is stored as {} but its payload is {}",
                self.id,
                self.kind,
                payload.kind()
            )));
        }

        Ok(Item {
            id: ItemId::new(self.id),
            name: self.name,
            icon: self.icon,
            container: self.container_id.map(ItemId::new),
            position: self.position,
            payload,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn stored_kind(conn: &Connection, id: &str) -> DomainResult<Option<ItemKind>> {
    let kind: Option<String> = conn
        .query_row("SELECT kind FROM items WHERE id = ?1", params![id], |row| row.get(0))
        .optional()
        .map_err(|e| DomainError::Storage(e.to_string()))?;
    Ok(kind.as_deref().and_then(ItemKind::parse))
}

/// A non-group item may only live in an existing group; groups only at root
fn check_container(conn: &Connection, kind: ItemKind, container: Option<&ItemId>) -> DomainResult<()> {
    let Some(container) = container else {
        return Ok(());
    };
    if kind == ItemKind::Group {
        return Err(DomainError::InvalidInput("Groups cannot be nested".to_string()));
    }
    match stored_kind(conn, container.as_str())? {
        Some(ItemKind::Group) => Ok(()),
        _ => Err(DomainError::ContainerNotFound(container.to_string())),
    }
}

fn apply_batch(tx: &Transaction<'_>, batch: &[PositionUpdate]) -> DomainResult<()> {
    let now = chrono::Utc::now().timestamp();
    let mut touched: BTreeSet<Option<String>> = BTreeSet::new();

    for update in batch {
        let previous: Option<Option<String>> = tx
            .query_row(
                "SELECT container_id FROM items WHERE id = ?1 AND kind = ?2",
                params![update.id.as_str(), update.kind.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        let Some(previous) = previous else {
            return Err(DomainError::ItemNotFound(update.id.to_string()));
        };

        check_container(tx, update.kind, update.container.as_ref())?;

        tx.execute(
            "UPDATE items SET position = ?1, container_id = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                update.position,
                update.container.as_ref().map(|c| c.as_str()),
                now,
                update.id.as_str()
            ],
        )
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        touched.insert(previous);
        touched.insert(update.container.as_ref().map(|c| c.to_string()));
    }

    for container in &touched {
        validate_container_positions(tx, container.as_deref())?;
    }
    Ok(())
}

#[async_trait]
impl PersistenceGateway for SqliteStore {
    async fn fetch_all(&self, scope: ContainerScope) -> DomainResult<Vec<Item>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Storage("Database not initialized".to_string()))?;

        let (filter, args): (&str, Vec<String>) = match &scope {
            ContainerScope::All => ("", Vec::new()),
            ContainerScope::Root => (" WHERE container_id IS NULL", Vec::new()),
            ContainerScope::Group(id) => (" WHERE container_id = ?1", vec![id.to_string()]),
        };
        let query = format!(
            "{}{} ORDER BY container_id NULLS FIRST, position ASC",
            SELECT_ITEMS, filter
        );

        let mut stmt = conn.prepare(&query)
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), read_row)
            .map_err(|e| DomainError::Storage(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        rows.into_iter().map(ItemRow::into_item).collect()
    }

    async fn submit_positions(&self, batch: &[PositionUpdate]) -> DomainResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or(DomainError::PersistenceFailure("Database not initialized".to_string()))?;

        let tx = conn
            .transaction()
            .map_err(|e| DomainError::PersistenceFailure(e.to_string()))?;

        // Dropping the transaction on error rolls the whole batch back
        apply_batch(&tx, batch).map_err(DomainError::into_persistence)?;
        tx.commit()
            .map_err(|e| DomainError::PersistenceFailure(e.to_string()))?;

        log::debug!("Persisted {} position updates", batch.len());
        Ok(())
    }
}

#[async_trait]
impl ItemStore for SqliteStore {
    async fn insert_item(&self, item: &Item) -> DomainResult<Item> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Storage("Database not initialized".to_string()))?;

        check_container(conn, item.kind(), item.container.as_ref())?;
        if stored_kind(conn, item.id.as_str())?.is_some() {
            return Err(DomainError::InvalidInput(format!("Duplicate item id {}", item.id)));
        }

        let payload = serde_json::to_string(&item.payload)
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT INTO items (id, kind, name, icon, container_id, position, payload, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                item.id.as_str(),
                item.kind().as_str(),
                item.name,
                item.icon,
                item.container.as_ref().map(|c| c.as_str()),
                item.position,
                payload,
                item.created_at,
                item.updated_at
            ],
        )
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(item.clone())
    }

    async fn update_item(&self, item: &Item) -> DomainResult<Item> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Storage("Database not initialized".to_string()))?;

        match stored_kind(conn, item.id.as_str())? {
            None => return Err(DomainError::ItemNotFound(item.id.to_string())),
            Some(kind) if kind != item.kind() => {
                return Err(DomainError::InvalidInput(format!(
                    "Item {} cannot change kind from {} to {}",
                    item.id,
                    kind,
                    item.kind()
                )))
            }
            Some(_) => {}
        }

        let mut updated = item.clone();
        updated.updated_at = chrono::Utc::now().timestamp();
        let payload = serde_json::to_string(&updated.payload)
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        // Placement columns belong to position batches
        conn.execute(
            "UPDATE items SET name = ?1, icon = ?2, payload = ?3, updated_at = ?4 WHERE id = ?5",
            params![
                updated.name,
                updated.icon,
                payload,
                updated.updated_at,
                updated.id.as_str()
            ],
        )
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(updated)
    }

    async fn delete_item(&self, id: &ItemId) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Storage("Database not initialized".to_string()))?;

        let children: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM items WHERE container_id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        if children > 0 {
            return Err(DomainError::InvalidInput(format!(
                "Group {} still holds {} items",
                id, children
            )));
        }

        let deleted = conn
            .execute("DELETE FROM items WHERE id = ?1", params![id.as_str()])
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        if deleted == 0 {
            return Err(DomainError::ItemNotFound(id.to_string()));
        }
        Ok(())
    }
}
