//! Item Positioning Operations
//!
//! Two-phase placement writes: `apply_positions` writes a batch and returns
//! the inverse patch, `revert` undoes it for every entry the patch still owns.

use std::collections::HashSet;

use crate::domain::{DomainError, DomainResult, ItemId, Placement, PositionUpdate};
use super::item_repo::ItemRepository;

/// One reversible placement change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchEntry {
    pub id: ItemId,
    pub before: Placement,
    pub after: Placement,
}

/// Inverse of an applied batch, tagged with the stamp that wrote it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionPatch {
    pub stamp: u64,
    pub entries: Vec<PatchEntry>,
}

/// Result of reverting a patch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevertReport {
    pub reverted: usize,
    /// Entries skipped because a later write (or delete) owns them now
    pub stale: usize,
}

impl RevertReport {
    pub fn is_exact(&self) -> bool {
        self.stale == 0
    }
}

impl ItemRepository {
    /// Next free position at the end of `container`
    pub fn next_position(&self, container: Option<&ItemId>) -> u32 {
        self.items
            .iter()
            .filter(|item| item.container.as_ref() == container)
            .map(|item| item.position + 1)
            .max()
            .unwrap_or(0)
    }

    /// Write a position batch. Either every id exists and the whole batch is
    /// applied, or nothing changes.
    pub fn apply_positions(&mut self, batch: &[PositionUpdate]) -> DomainResult<PositionPatch> {
        if let Some(missing) = batch.iter().find(|update| !self.contains(&update.id)) {
            return Err(DomainError::ItemNotFound(missing.id.to_string()));
        }

        let stamp = self.bump_stamp();
        let mut entries = Vec::with_capacity(batch.len());
        for update in batch {
            if let Some(item) = self.items.iter_mut().find(|item| item.id == update.id) {
                let before = item.placement();
                let after = update.placement();
                item.set_placement(after.clone());
                entries.push(PatchEntry {
                    id: update.id.clone(),
                    before,
                    after,
                });
                self.owners.insert(update.id.clone(), stamp);
            }
        }

        self.changed();
        Ok(PositionPatch { stamp, entries })
    }

    /// Undo `patch` for the entries it still owns
    pub fn revert(&mut self, patch: &PositionPatch) -> RevertReport {
        let mut report = RevertReport::default();
        let restore_stamp = self.bump_stamp();

        for entry in &patch.entries {
            if self.owners.get(&entry.id) != Some(&patch.stamp) {
                report.stale += 1;
                continue;
            }
            if let Some(item) = self.items.iter_mut().find(|item| item.id == entry.id) {
                item.set_placement(entry.before.clone());
                self.owners.insert(entry.id.clone(), restore_stamp);
                report.reverted += 1;
            }
        }

        if report.reverted > 0 {
            self.changed();
        }
        report
    }

    /// Check that `container` holds positions `0..n-1` exactly once
    pub fn validate_container(&self, container: Option<&ItemId>) -> DomainResult<()> {
        let items = self.get_items_by_container(container);
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.position) {
                return Err(DomainError::InvalidInput(format!(
                    "Duplicate position {} in container {:?}",
                    item.position, container
                )));
            }
        }
        for (expected, item) in items.iter().enumerate() {
            if item.position != expected as u32 {
                return Err(DomainError::InvalidInput(format!(
                    "Gap in positions: expected {} but found {} in container {:?}",
                    expected, item.position, container
                )));
            }
        }
        Ok(())
    }
}
