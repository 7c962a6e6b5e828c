//! Placement Values
//!
//! The kind-agnostic `{container, position}` projection of an item, the
//! position-update batch entries exchanged with the store, and the partial
//! update used for edits.

use serde::{Deserialize, Serialize};

use super::item::{Item, ItemId, ItemKind, Payload};

/// Where an item sits: its container (None = root) and its index there
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub container: Option<ItemId>,
    pub position: u32,
}

impl Placement {
    pub fn root(position: u32) -> Self {
        Self { container: None, position }
    }

    pub fn in_group(group: ItemId, position: u32) -> Self {
        Self { container: Some(group), position }
    }
}

/// One entry of a position batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: ItemId,
    pub kind: ItemKind,
    pub position: u32,
    #[serde(rename = "container_id")]
    pub container: Option<ItemId>,
}

impl PositionUpdate {
    pub fn placement(&self) -> Placement {
        Placement {
            container: self.container.clone(),
            position: self.position,
        }
    }
}

/// Partial item update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
}

impl ItemPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn payload(payload: Payload) -> Self {
        Self {
            payload: Some(payload),
            ..Default::default()
        }
    }

    pub fn touches_placement(&self) -> bool {
        self.placement.is_some()
    }

    /// Merge the set fields into `item` and bump its `updated_at`
    pub fn apply_to(self, item: &mut Item) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(icon) = self.icon {
            item.icon = icon;
        }
        if let Some(payload) = self.payload {
            item.payload = payload;
        }
        if let Some(placement) = self.placement {
            item.set_placement(placement);
        }
        item.updated_at = chrono::Utc::now().timestamp();
    }
}
