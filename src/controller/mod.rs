//! Drag Gesture Controller
//!
//! Drives one drag lifecycle at a time: `Idle -> Dragging -> {Dropped,
//! Cancelled} -> Idle`. A drop is a two-phase commit: the reconciled batch is
//! applied to the repository immediately (optimistic), then submitted to the
//! gateway; if the submit fails the inverse patch is applied.
//!
//! A new drag may start while an earlier submit is still pending, but its
//! drop waits on the commit gate until that submit resolved. Every batch is
//! therefore computed from confirmed (or rolled back) placements and a
//! rollback never races a newer optimistic write. Rollback still only
//! reverts placements the failed batch owns; if anything else touched them
//! the repository is resynced from the gateway.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

use crate::domain::{DomainError, DomainResult, Item, ItemId, PositionUpdate};
use crate::gateway::{ContainerScope, PersistenceGateway};
use crate::reconciler::{reconcile, resolve_drop, DropTarget, MoveBatch, MoveRequest, Reconciliation};
use crate::repository::{PositionPatch, RevertReport, SharedRepository};

/// Gesture events over dashboard items
pub type DragEvent = dragdrop::GestureEvent<ItemId>;

/// Drag lifecycle state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragPhase {
    #[default]
    Idle,
    Dragging {
        /// Item shown as the drag ghost
        active: ItemId,
        /// Target currently under the pointer
        over: Option<DropTarget>,
    },
}

/// Result of a terminal gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing was being dragged, or the drop had no target
    Ignored,
    Cancelled,
    /// The move would not change anything
    NoOp,
    /// Applied locally and confirmed by the gateway
    Committed(MoveBatch),
    /// The gateway rejected the batch and the optimistic update was undone
    RolledBack {
        batch: MoveBatch,
        error: DomainError,
        /// Placements not reverted because something rewrote them since
        stale: usize,
    },
}

pub struct DragController {
    repo: SharedRepository,
    gateway: Arc<dyn PersistenceGateway>,
    persist_timeout: Duration,
    phase: Mutex<DragPhase>,
    last_error: Mutex<Option<String>>,
    in_flight: AtomicUsize,
    /// Held from reconcile until the gateway answered
    commits: Mutex<()>,
}

/// Counts one submit for `pending_persists` until dropped, so an abandoned
/// drop future still releases it
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DragController {
    pub fn new(repo: SharedRepository, gateway: Arc<dyn PersistenceGateway>, persist_timeout: Duration) -> Self {
        Self {
            repo,
            gateway,
            persist_timeout,
            phase: Mutex::new(DragPhase::Idle),
            last_error: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            commits: Mutex::new(()),
        }
    }

    // ========================
    // Gesture state
    // ========================

    pub async fn phase(&self) -> DragPhase {
        self.phase.lock().await.clone()
    }

    /// The item being dragged, for ghost/preview rendering
    pub async fn active_item(&self) -> Option<Item> {
        let active = match &*self.phase.lock().await {
            DragPhase::Dragging { active, .. } => active.clone(),
            DragPhase::Idle => return None,
        };
        self.repo.lock().await.get(&active).cloned()
    }

    /// Message of the most recent failed drop; cleared when the next drop starts
    pub async fn last_error(&self) -> Option<String> {
        self.last_error.lock().await.clone()
    }

    /// Number of submits still awaiting the gateway
    pub fn pending_persists(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until no other placement write is between apply and confirm.
    /// Anything that applies positions to the repository and then persists
    /// them holds this guard across both steps.
    pub(crate) async fn begin_commit(&self) -> MutexGuard<'_, ()> {
        self.commits.lock().await
    }

    pub async fn drag_start(&self, id: ItemId) {
        let mut phase = self.phase.lock().await;
        if let DragPhase::Dragging { active, .. } = &*phase {
            log::debug!("drag_start for {} replaces active drag of {}", id, active);
        }
        *phase = DragPhase::Dragging { active: id, over: None };
    }

    /// Record the hovered target (None when the pointer left it)
    pub async fn drag_over(&self, target: Option<DropTarget>) {
        if let DragPhase::Dragging { over, .. } = &mut *self.phase.lock().await {
            *over = target;
        }
    }

    /// Abort the drag. The repository is never touched.
    pub async fn drag_cancel(&self) -> DropOutcome {
        match std::mem::take(&mut *self.phase.lock().await) {
            DragPhase::Dragging { active, .. } => {
                log::debug!("Drag of {} cancelled", active);
                DropOutcome::Cancelled
            }
            DragPhase::Idle => DropOutcome::Ignored,
        }
    }

    /// Finish the drag on `target`
    pub async fn drag_end(&self, target: Option<DropTarget>) -> DomainResult<DropOutcome> {
        let active = match std::mem::take(&mut *self.phase.lock().await) {
            DragPhase::Dragging { active, .. } => active,
            DragPhase::Idle => return Ok(DropOutcome::Ignored),
        };
        let Some(target) = target else {
            return Ok(DropOutcome::Ignored);
        };
        self.drop_item(&active, &target).await
    }

    /// Dispatch a gesture event; only terminal events produce an outcome
    pub async fn handle_event(&self, event: DragEvent) -> DomainResult<Option<DropOutcome>> {
        match event {
            DragEvent::Start { id } => {
                self.drag_start(id).await;
                Ok(None)
            }
            DragEvent::Move { over, .. } => {
                self.drag_over(over).await;
                Ok(None)
            }
            DragEvent::End { target, .. } => self.drag_end(target).await.map(Some),
            DragEvent::Cancel { .. } => Ok(Some(self.drag_cancel().await)),
        }
    }

    // ========================
    // Moves
    // ========================

    /// Classify `target` for `dragged` and move accordingly
    pub async fn drop_item(&self, dragged: &ItemId, target: &DropTarget) -> DomainResult<DropOutcome> {
        let _commit = self.begin_commit().await;
        let request = {
            let repo = self.repo.lock().await;
            resolve_drop(repo.items(), dragged, target)?
        };
        self.move_held(&request).await
    }

    /// Reconcile `request`, apply it optimistically and persist it
    pub async fn move_item(&self, request: &MoveRequest) -> DomainResult<DropOutcome> {
        let _commit = self.begin_commit().await;
        self.move_held(request).await
    }

    async fn move_held(&self, request: &MoveRequest) -> DomainResult<DropOutcome> {
        *self.last_error.lock().await = None;

        // Phase 1: compute and apply under one lock so the batch matches the
        // snapshot it was computed from
        let (batch, patch) = {
            let mut repo = self.repo.lock().await;
            let batch = match reconcile(repo.items(), request)? {
                Reconciliation::NoOp => return Ok(DropOutcome::NoOp),
                Reconciliation::Move(batch) => batch,
            };
            let patch = repo.apply_positions(&batch.updates)?;
            (batch, patch)
        };

        // Phase 2: remote write
        match self.persist_or_rollback(&batch.updates, &patch).await {
            None => {
                log::info!(
                    "Moved {} to {:?} @ {}",
                    batch.dragged, batch.after.container, batch.after.position
                );
                Ok(DropOutcome::Committed(batch))
            }
            Some((error, report)) => Ok(DropOutcome::RolledBack {
                batch,
                error,
                stale: report.stale,
            }),
        }
    }

    /// Submit an already applied batch; on failure undo `patch`, record the
    /// error and return it with the revert report. Callers hold the guard
    /// from `begin_commit`.
    pub(crate) async fn persist_or_rollback(
        &self,
        updates: &[PositionUpdate],
        patch: &PositionPatch,
    ) -> Option<(DomainError, RevertReport)> {
        let result = {
            let _in_flight = InFlight::enter(&self.in_flight);
            self.persist(updates).await
        };

        let error = result.err()?;
        let report = self.repo.lock().await.revert(patch);
        log::error!("Failed to update item positions: {}", error);
        *self.last_error.lock().await = Some(error.to_string());

        if !report.is_exact() {
            log::warn!(
                "Rollback skipped {} placements changed since the move, resyncing",
                report.stale
            );
            self.resync().await;
        }
        Some((error, report))
    }

    async fn persist(&self, updates: &[PositionUpdate]) -> DomainResult<()> {
        match tokio::time::timeout(self.persist_timeout, self.gateway.submit_positions(updates)).await {
            Ok(result) => result.map_err(DomainError::into_persistence),
            Err(_) => Err(DomainError::PersistenceFailure(format!(
                "Position submit timed out after {:?}",
                self.persist_timeout
            ))),
        }
    }

    /// Replace the repository with the gateway's view
    async fn resync(&self) {
        match self.gateway.fetch_all(ContainerScope::All).await {
            Ok(items) => self.repo.lock().await.replace_all(items),
            Err(e) => log::error!("Resync after partial rollback failed: {}", e),
        }
    }
}
