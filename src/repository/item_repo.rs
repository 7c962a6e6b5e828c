//! Item Repository - Core Operations
//!
//! In-memory owner of the canonical item set. Container views are derived
//! on demand and never cached, so they cannot drift from the items.
//! Positioning operations (batch apply/revert) live in `item_positioning`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::domain::{Item, ItemId, ItemPatch, Placement};
use super::projection::{LegacyProjections, ProjectionSink};

/// Canonical item set plus placement ownership stamps
#[derive(Default)]
pub struct ItemRepository {
    pub(super) items: Vec<Item>,
    /// Stamp of the last write to each item's placement
    pub(super) owners: HashMap<ItemId, u64>,
    pub(super) last_stamp: u64,
    projections: LegacyProjections,
    sinks: Vec<Arc<dyn ProjectionSink>>,
}

impl ItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository already holding `items`
    pub fn with_items(items: Vec<Item>) -> Self {
        let mut repo = Self::new();
        repo.replace_all(items);
        repo
    }

    // ========================
    // Queries
    // ========================

    /// Items in `container`, ascending by position (snapshot)
    pub fn get_items_by_container(&self, container: Option<&ItemId>) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .items
            .iter()
            .filter(|item| item.container.as_ref() == container)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        items
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Full flat snapshot
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// id -> placement mapping of every item
    pub fn placements(&self) -> BTreeMap<ItemId, Placement> {
        self.items
            .iter()
            .map(|item| (item.id.clone(), item.placement()))
            .collect()
    }

    /// Current legacy projections
    pub fn projections(&self) -> &LegacyProjections {
        &self.projections
    }

    // ========================
    // Mutations
    // ========================

    /// Append an item. Positions are not validated; callers submit
    /// coherent ones (usually `next_position(container)`).
    pub fn add_item(&mut self, item: Item) {
        let stamp = self.bump_stamp();
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            log::warn!("add_item: replacing existing item {}", item.id);
            *existing = item.clone();
        } else {
            self.items.push(item.clone());
        }
        self.owners.insert(item.id, stamp);
        self.changed();
    }

    /// Merge `patch` into the item; no-op when the id is absent
    pub fn update_item(&mut self, id: &ItemId, patch: ItemPatch) {
        let stamp = if patch.touches_placement() {
            Some(self.bump_stamp())
        } else {
            None
        };

        let Some(item) = self.items.iter_mut().find(|item| &item.id == id) else {
            log::debug!("update_item: {} not present, ignoring", id);
            return;
        };

        patch.apply_to(item);

        if let Some(stamp) = stamp {
            self.owners.insert(id.clone(), stamp);
        }
        self.changed();
    }

    /// Remove the item. Sibling positions are left as they are.
    pub fn delete_item(&mut self, id: &ItemId) -> Option<Item> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        let removed = self.items.remove(index);
        self.owners.remove(id);
        self.changed();
        Some(removed)
    }

    /// Atomic bulk replace after a cold load
    pub fn replace_all(&mut self, items: Vec<Item>) {
        let stamp = self.bump_stamp();
        self.owners = items.iter().map(|item| (item.id.clone(), stamp)).collect();
        self.items = items;
        self.changed();
    }

    /// Register a sink; it immediately receives the current projections
    pub fn subscribe(&mut self, sink: Arc<dyn ProjectionSink>) {
        sink.publish(&self.projections);
        self.sinks.push(sink);
    }

    pub(super) fn bump_stamp(&mut self) -> u64 {
        self.last_stamp += 1;
        self.last_stamp
    }

    /// Post-mutation hook: re-derive and republish projections
    pub(super) fn changed(&mut self) {
        self.projections = LegacyProjections::derive(&self.items);
        for sink in &self.sinks {
            sink.publish(&self.projections);
        }
    }
}

impl std::fmt::Debug for ItemRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemRepository")
            .field("items", &self.items.len())
            .field("last_stamp", &self.last_stamp)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
