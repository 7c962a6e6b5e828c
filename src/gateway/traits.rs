//! Gateway Layer - Core Traits
//!
//! Defines the abstract interfaces of the external item store.
//! The engine treats every implementation as a fallible remote dependency.

use async_trait::async_trait;

use crate::domain::{DomainResult, Item, ItemId, PositionUpdate};

/// Which part of the item set a read covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerScope {
    /// Every item, including the contents of groups
    All,
    Root,
    Group(ItemId),
}

/// Position persistence contract consumed by the drag controller
///
/// `submit_positions` is all-or-nothing: any failure is one failure for the
/// whole batch, never a partial write.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Read items for a cold load
    async fn fetch_all(&self, scope: ContainerScope) -> DomainResult<Vec<Item>>;

    /// Atomically persist a position batch
    async fn submit_positions(&self, batch: &[PositionUpdate]) -> DomainResult<()>;
}

/// Extension for stores that also back the create/edit/delete forms
#[async_trait]
pub trait ItemStore: PersistenceGateway {
    /// Create a new item
    async fn insert_item(&self, item: &Item) -> DomainResult<Item>;

    /// Update name, icon and payload of an existing item (kind must not
    /// change; placement is left to `submit_positions`)
    async fn update_item(&self, item: &Item) -> DomainResult<Item>;

    /// Delete item by ID
    async fn delete_item(&self, id: &ItemId) -> DomainResult<()>;
}
