//! Dashboard Service
//!
//! Application-facing facade over the item repository, the item store and
//! the drag controller. Item edits go to the store first and reach the
//! repository only once the store accepted them; moves go through the
//! controller's optimistic path. Anything that picks or rewrites positions
//! holds the controller's commit gate, so it never interleaves with a drop.

use std::sync::Arc;
use tokio::sync::Mutex;

use dragdrop::DragTracker;

use crate::config::Settings;
use crate::controller::DragController;
use crate::domain::{DomainError, DomainResult, Item, ItemId, ItemPatch};
use crate::gateway::{ContainerScope, ItemStore, PersistenceGateway, SqliteStore};
use crate::reconciler::plan_compaction;
use crate::repository::{ItemRepository, LegacyProjections, ProjectionSink, SharedRepository};

/// Cold-load status shown by the UI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStatus {
    pub loading: bool,
    pub error: Option<String>,
}

pub struct Dashboard {
    settings: Settings,
    repo: SharedRepository,
    store: Arc<dyn ItemStore>,
    controller: Arc<DragController>,
    status: Mutex<LoadStatus>,
}

impl Dashboard {
    pub fn new<S: ItemStore + 'static>(settings: Settings, store: Arc<S>) -> Self {
        let repo: SharedRepository = Arc::new(Mutex::new(ItemRepository::new()));
        let gateway: Arc<dyn PersistenceGateway> = store.clone();
        let controller = Arc::new(DragController::new(
            repo.clone(),
            gateway,
            settings.persist_timeout(),
        ));

        Self {
            settings,
            repo,
            store,
            controller,
            status: Mutex::new(LoadStatus::default()),
        }
    }

    /// Open the SQLite store named in `settings` and load every item
    pub async fn open(settings: Settings) -> DomainResult<Self> {
        let store = match SqliteStore::open(&settings.db_path).await {
            Ok(store) => store,
            Err(e) => {
                let _ = rolling_logger::error(&format!("DB init failed: {}", e));
                return Err(e);
            }
        };
        let dashboard = Self::new(settings, Arc::new(store));
        dashboard.fetch_all_items().await?;
        Ok(dashboard)
    }

    // ========================
    // Accessors
    // ========================

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn controller(&self) -> &Arc<DragController> {
        &self.controller
    }

    pub fn repository(&self) -> SharedRepository {
        self.repo.clone()
    }

    /// Pointer tracker configured with the drag threshold
    pub fn tracker(&self) -> DragTracker<ItemId> {
        DragTracker::new(self.settings.drag_threshold_px)
    }

    pub async fn status(&self) -> LoadStatus {
        self.status.lock().await.clone()
    }

    /// Latest user-visible failure: a rolled back move, else a failed load
    pub async fn last_error(&self) -> Option<String> {
        match self.controller.last_error().await {
            Some(error) => Some(error),
            None => self.status.lock().await.error.clone(),
        }
    }

    // ========================
    // Queries
    // ========================

    pub async fn items_in(&self, container: Option<&ItemId>) -> Vec<Item> {
        self.repo.lock().await.get_items_by_container(container)
    }

    pub async fn get_item(&self, id: &ItemId) -> Option<Item> {
        self.repo.lock().await.get(id).cloned()
    }

    pub async fn projections(&self) -> LegacyProjections {
        self.repo.lock().await.projections().clone()
    }

    pub async fn subscribe(&self, sink: Arc<dyn ProjectionSink>) {
        self.repo.lock().await.subscribe(sink);
    }

    // ========================
    // Loading
    // ========================

    /// Replace the repository with everything the store holds
    pub async fn fetch_all_items(&self) -> DomainResult<usize> {
        {
            let mut status = self.status.lock().await;
            status.loading = true;
            status.error = None;
        }

        let result = self.store.fetch_all(ContainerScope::All).await;

        let mut status = self.status.lock().await;
        status.loading = false;
        match result {
            Ok(items) => {
                let count = items.len();
                self.repo.lock().await.replace_all(items);
                log::info!("Loaded {} items", count);
                Ok(count)
            }
            Err(e) => {
                log::error!("Failed to load items: {}", e);
                status.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    // ========================
    // Edits
    // ========================

    /// Store a new item at the end of its container
    pub async fn create_item(&self, mut item: Item) -> DomainResult<Item> {
        if item.is_group() && item.container.is_some() {
            return Err(DomainError::InvalidInput("Groups cannot be nested".to_string()));
        }
        let _commit = self.controller.begin_commit().await;
        item.position = self.repo.lock().await.next_position(item.container.as_ref());

        let stored = self.store.insert_item(&item).await?;
        self.repo.lock().await.add_item(stored.clone());
        log::info!("Created {} {}", stored.kind(), stored.id);
        Ok(stored)
    }

    /// Edit name, icon or payload. Placement changes go through the controller.
    pub async fn update_item(&self, id: &ItemId, patch: ItemPatch) -> DomainResult<Item> {
        if patch.touches_placement() {
            return Err(DomainError::InvalidInput(
                "Placement changes must go through a move".to_string(),
            ));
        }

        let mut updated = self
            .get_item(id)
            .await
            .ok_or_else(|| DomainError::ItemNotFound(id.to_string()))?;
        patch.apply_to(&mut updated);

        let stored = self.store.update_item(&updated).await?;
        let merged = ItemPatch {
            name: Some(stored.name.clone()),
            icon: Some(stored.icon.clone()),
            payload: Some(stored.payload.clone()),
            placement: None,
        };
        let mut repo = self.repo.lock().await;
        repo.update_item(id, merged);
        Ok(repo.get(id).cloned().unwrap_or(stored))
    }

    /// Delete an item, then close the gap it left when configured to
    pub async fn delete_item(&self, id: &ItemId) -> DomainResult<Item> {
        let item = self
            .get_item(id)
            .await
            .ok_or_else(|| DomainError::ItemNotFound(id.to_string()))?;

        let _commit = self.controller.begin_commit().await;
        self.store.delete_item(id).await?;
        let removed = self.repo.lock().await.delete_item(id).unwrap_or(item);

        if self.settings.compact_on_delete {
            if let Err(e) = self.compact_held(removed.container.as_ref()).await {
                log::warn!("Compaction after deleting {} failed: {}", removed.id, e);
            }
        }
        Ok(removed)
    }

    /// Renumber `container` to `0..n-1`; returns the number of updates
    pub async fn compact(&self, container: Option<&ItemId>) -> DomainResult<usize> {
        let _commit = self.controller.begin_commit().await;
        self.compact_held(container).await
    }

    async fn compact_held(&self, container: Option<&ItemId>) -> DomainResult<usize> {
        let (updates, patch) = {
            let mut repo = self.repo.lock().await;
            let updates = plan_compaction(repo.items(), container);
            if updates.is_empty() {
                return Ok(0);
            }
            let patch = repo.apply_positions(&updates)?;
            (updates, patch)
        };

        match self.controller.persist_or_rollback(&updates, &patch).await {
            None => Ok(updates.len()),
            Some((error, _)) => Err(error),
        }
    }
}
