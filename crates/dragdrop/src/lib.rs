//! DragDrop Utilities
//!
//! Pointer drag tracking independent of any UI framework.
//! Uses a movement threshold to distinguish click from drag, tracks the
//! hovered drop target and turns raw pointer input into gesture events.

/// Drop target types
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropTarget<Id> {
    /// Drop on another item (reorder within that item's container)
    Item(Id),
    /// Drop on a group card
    Group(Id),
    /// Drop on the empty area of the root surface
    RootArea,
}

impl<Id: PartialEq> DropTarget<Id> {
    /// Whether this target is the given item itself
    pub fn is_item(&self, id: &Id) -> bool {
        match self {
            DropTarget::Item(target) | DropTarget::Group(target) => target == id,
            DropTarget::RootArea => false,
        }
    }
}

/// Gesture lifecycle events
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GestureEvent<Id> {
    /// Pointer travelled past the threshold; the drag is live
    Start { id: Id },
    /// Hovered target changed
    Move { id: Id, over: Option<DropTarget<Id>> },
    /// Pointer released while dragging
    End { id: Id, target: Option<DropTarget<Id>> },
    /// Drag aborted (pointer left the window, escape key, ...)
    Cancel { id: Id },
}

/// Movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: u32 = 8;

#[derive(Clone, Debug)]
struct Pending<Id> {
    id: Id,
    start_x: i32,
    start_y: i32,
}

/// Drag state for one pointer
#[derive(Clone, Debug)]
pub struct DragTracker<Id> {
    threshold_px: u32,
    /// Pending item (pointer down but not yet dragging)
    pending: Option<Pending<Id>>,
    dragging: Option<Id>,
    drop_target: Option<DropTarget<Id>>,
}

impl<Id> Default for DragTracker<Id> {
    fn default() -> Self {
        Self::new(DRAG_THRESHOLD_PX)
    }
}

impl<Id> DragTracker<Id> {
    pub fn new(threshold_px: u32) -> Self {
        Self {
            threshold_px,
            pending: None,
            dragging: None,
            drop_target: None,
        }
    }

    pub fn threshold_px(&self) -> u32 {
        self.threshold_px
    }

    pub fn dragging_id(&self) -> Option<&Id> {
        self.dragging.as_ref()
    }

    pub fn drop_target(&self) -> Option<&DropTarget<Id>> {
        self.drop_target.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    fn clear(&mut self) {
        self.pending = None;
        self.dragging = None;
        self.drop_target = None;
    }
}

impl<Id: Clone + PartialEq> DragTracker<Id> {
    /// Primary button pressed on a draggable item
    pub fn pointer_down(&mut self, id: Id, x: i32, y: i32) {
        if self.is_dragging() {
            return;
        }
        self.pending = Some(Pending {
            id,
            start_x: x,
            start_y: y,
        });
    }

    /// Pointer moved; starts the drag once it travelled past the threshold
    pub fn pointer_move(&mut self, x: i32, y: i32) -> Option<GestureEvent<Id>> {
        if self.is_dragging() {
            return None;
        }
        let pending = self.pending.as_ref()?;

        let dx = i64::from(x) - i64::from(pending.start_x);
        let dy = i64::from(y) - i64::from(pending.start_y);
        let threshold = i64::from(self.threshold_px);
        if dx * dx + dy * dy <= threshold * threshold {
            return None;
        }

        let id = pending.id.clone();
        self.dragging = Some(id.clone());
        Some(GestureEvent::Start { id })
    }

    /// Pointer entered a drop target
    pub fn hover(&mut self, target: DropTarget<Id>) -> Option<GestureEvent<Id>> {
        let dragging = self.dragging.clone()?;
        // Don't allow dropping on self
        if target.is_item(&dragging) {
            return self.leave();
        }
        if self.drop_target.as_ref() == Some(&target) {
            return None;
        }
        self.drop_target = Some(target.clone());
        Some(GestureEvent::Move {
            id: dragging,
            over: Some(target),
        })
    }

    /// Pointer left the hovered target
    pub fn leave(&mut self) -> Option<GestureEvent<Id>> {
        let dragging = self.dragging.clone()?;
        self.drop_target.take()?;
        Some(GestureEvent::Move { id: dragging, over: None })
    }

    /// Pointer released. A release without an active drag is a click and
    /// produces no event.
    pub fn pointer_up(&mut self) -> Option<GestureEvent<Id>> {
        let dragging = self.dragging.take();
        let target = self.drop_target.take();
        self.clear();

        dragging.map(|id| GestureEvent::End { id, target })
    }

    /// Abort the gesture
    pub fn cancel(&mut self) -> Option<GestureEvent<Id>> {
        let dragging = self.dragging.take();
        self.clear();
        if let Some(id) = &dragging {
            log::debug!("drag cancelled");
            return Some(GestureEvent::Cancel { id: id.clone() });
        }
        None
    }
}
