//! Legacy Per-Kind Projections
//!
//! Older display surfaces read one collection per kind. The repository
//! re-derives these after every mutation and pushes them to subscribers.

use crate::domain::{Item, ItemKind};

/// Items split by kind, each list ordered by (container, position)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyProjections {
    pub triggers: Vec<Item>,
    pub monitors: Vec<Item>,
    pub groups: Vec<Item>,
}

impl LegacyProjections {
    pub fn derive(items: &[Item]) -> Self {
        let mut sorted: Vec<&Item> = items.iter().collect();
        sorted.sort_by(|a, b| {
            a.container
                .cmp(&b.container)
                .then(a.position.cmp(&b.position))
        });

        let mut projections = Self::default();
        for item in sorted {
            let bucket = match item.kind() {
                ItemKind::Trigger => &mut projections.triggers,
                ItemKind::Monitor => &mut projections.monitors,
                ItemKind::Group => &mut projections.groups,
            };
            bucket.push(item.clone());
        }
        projections
    }
}

/// Receiver of republished projections
pub trait ProjectionSink: Send + Sync {
    fn publish(&self, projections: &LegacyProjections);
}
