//! Position Reconciler
//!
//! Pure computation over an item snapshot: given a move request it returns
//! the full batch of position updates that leaves both the source and the
//! destination container gapless, or reports that the move is a no-op.
//! No I/O; the only failures are `ItemNotFound` and `ContainerNotFound`,
//! and either one aborts the whole batch.

mod drop_rules;

pub use drop_rules::{resolve_drop, DropTarget};

use crate::domain::{DomainError, DomainResult, Item, ItemId, Placement, PositionUpdate};

/// A requested move, in container-local terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub dragged: ItemId,
    /// Destination container (None = root)
    pub target_container: Option<ItemId>,
    /// Insertion index in the destination list without the dragged item;
    /// out-of-range values clamp to the end
    pub target_index: usize,
}

impl MoveRequest {
    pub fn new(dragged: ItemId, target_container: Option<ItemId>, target_index: usize) -> Self {
        Self {
            dragged,
            target_container,
            target_index,
        }
    }
}

/// Computed batch for a move that changes something
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveBatch {
    pub dragged: ItemId,
    pub before: Placement,
    pub after: Placement,
    /// Destination updates followed by source updates
    pub updates: Vec<PositionUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing would change; skip mutate and persist
    NoOp,
    Move(MoveBatch),
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        matches!(self, Reconciliation::NoOp)
    }

    /// Updates to apply (empty for a no-op)
    pub fn updates(&self) -> &[PositionUpdate] {
        match self {
            Reconciliation::NoOp => &[],
            Reconciliation::Move(batch) => &batch.updates,
        }
    }
}

/// Items of `container` ordered by (position, id)
pub(crate) fn container_items<'a>(items: &'a [Item], container: Option<&ItemId>) -> Vec<&'a Item> {
    let mut list: Vec<&Item> = items
        .iter()
        .filter(|item| item.container.as_ref() == container)
        .collect();
    list.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
    list
}

pub(crate) fn find<'a>(items: &'a [Item], id: &ItemId) -> DomainResult<&'a Item> {
    items
        .iter()
        .find(|item| &item.id == id)
        .ok_or_else(|| DomainError::ItemNotFound(id.to_string()))
}

/// The group a container id refers to, or `ContainerNotFound`
pub(crate) fn find_group<'a>(items: &'a [Item], id: &ItemId) -> DomainResult<&'a Item> {
    items
        .iter()
        .find(|item| &item.id == id && item.is_group())
        .ok_or_else(|| DomainError::ContainerNotFound(id.to_string()))
}

/// Index of `id` in the ordered root list
pub(crate) fn root_index(items: &[Item], id: &ItemId) -> usize {
    container_items(items, None)
        .iter()
        .position(|item| &item.id == id)
        .unwrap_or(0)
}

fn renumber(list: &[&Item], container: Option<&ItemId>) -> Vec<PositionUpdate> {
    list.iter()
        .enumerate()
        .map(|(index, item)| PositionUpdate {
            id: item.id.clone(),
            kind: item.kind(),
            position: index as u32,
            container: container.cloned(),
        })
        .collect()
}

/// Compute the update batch for `request` against `items`
pub fn reconcile(items: &[Item], request: &MoveRequest) -> DomainResult<Reconciliation> {
    let dragged = find(items, &request.dragged)?;

    let mut target_container = request.target_container.clone();
    let mut target_index = request.target_index;
    if let Some(container) = &target_container {
        let group = find_group(items, container)?;
        // Groups never nest: a group moved into a group reorders at root,
        // relative to the target group
        if dragged.is_group() {
            target_index = root_index(items, &group.id);
            target_container = None;
        }
    }

    let source_container = dragged.container.clone();

    let mut destination: Vec<&Item> = container_items(items, target_container.as_ref())
        .into_iter()
        .filter(|item| item.id != dragged.id)
        .collect();
    let insert_at = target_index.min(destination.len());
    destination.insert(insert_at, dragged);

    let mut updates = renumber(&destination, target_container.as_ref());

    if source_container != target_container {
        let remaining: Vec<&Item> = container_items(items, source_container.as_ref())
            .into_iter()
            .filter(|item| item.id != dragged.id)
            .collect();
        updates.extend(renumber(&remaining, source_container.as_ref()));
    }

    let unchanged = updates.iter().all(|update| {
        items
            .iter()
            .find(|item| item.id == update.id)
            .map(|item| item.placement() == update.placement())
            .unwrap_or(false)
    });
    if unchanged {
        return Ok(Reconciliation::NoOp);
    }

    Ok(Reconciliation::Move(MoveBatch {
        dragged: dragged.id.clone(),
        before: dragged.placement(),
        after: Placement {
            container: target_container,
            position: insert_at as u32,
        },
        updates,
    }))
}

/// Re-number `container` to `0..n-1`; empty when it is already gapless
pub fn plan_compaction(items: &[Item], container: Option<&ItemId>) -> Vec<PositionUpdate> {
    let list = container_items(items, container);
    let gapless = list
        .iter()
        .enumerate()
        .all(|(index, item)| item.position == index as u32);
    if gapless {
        return Vec::new();
    }
    renumber(&list, container)
}

#[cfg(test)]
mod tests;
