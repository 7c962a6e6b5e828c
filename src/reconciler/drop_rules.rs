//! Drop Target Rules
//!
//! Translates a classified drop target into a container-local move request.
//! What a drop onto a group means depends on the dragged kind: items go to
//! the end of the group, groups reorder at root.

use crate::domain::{DomainResult, Item, ItemId};
use super::{container_items, find, find_group, root_index, MoveRequest};

/// Drop target over dashboard items
pub type DropTarget = dragdrop::DropTarget<ItemId>;

/// Derive `(target container, target index)` for dropping `dragged` on `target`
pub fn resolve_drop(items: &[Item], dragged: &ItemId, target: &DropTarget) -> DomainResult<MoveRequest> {
    let dragged_item = find(items, dragged)?;

    match target {
        DropTarget::RootArea => {
            let end = container_items(items, None)
                .iter()
                .filter(|item| &item.id != dragged)
                .count();
            Ok(MoveRequest::new(dragged.clone(), None, end))
        }
        DropTarget::Group(group_id) => {
            let group = find_group(items, group_id)?;
            Ok(drop_on_group(items, dragged_item, group))
        }
        DropTarget::Item(target_id) => {
            let target_item = find(items, target_id)?;
            if target_item.is_group() {
                return Ok(drop_on_group(items, dragged_item, target_item));
            }

            // A group dropped on an item inside a group reorders at root,
            // relative to that item's group
            if dragged_item.is_group() {
                if let Some(holder) = &target_item.container {
                    return Ok(MoveRequest::new(
                        dragged.clone(),
                        None,
                        root_index(items, holder),
                    ));
                }
            }

            let index = container_items(items, target_item.container.as_ref())
                .iter()
                .position(|item| item.id == target_item.id)
                .unwrap_or(0);
            Ok(MoveRequest::new(
                dragged.clone(),
                target_item.container.clone(),
                index,
            ))
        }
    }
}

fn drop_on_group(items: &[Item], dragged: &Item, group: &Item) -> MoveRequest {
    if dragged.is_group() {
        return MoveRequest::new(dragged.id.clone(), None, root_index(items, &group.id));
    }

    let end = container_items(items, Some(&group.id))
        .iter()
        .filter(|item| item.id != dragged.id)
        .count();
    MoveRequest::new(dragged.id.clone(), Some(group.id.clone()), end)
}
