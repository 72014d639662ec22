//! Interaction State Machine.
//!
//! Turns pointer events into draw, move and resize gestures on the box
//! collection. All points are in page coordinates. Binding and persistence
//! happen in the caller once a gesture ends.

use deepoverlay_core::constants::{MIN_BOX_SIZE, MIN_RESIZE};
use deepoverlay_core::{BoxId, Point, Rect};

use crate::collection::{BoxCollection, PointerTarget};

/// The active gesture kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    None,
    Draw,
    Move,
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Draw {
        id: BoxId,
        start: Point,
    },
    Move {
        id: BoxId,
        start: Point,
        initial: Point,
    },
    Resize {
        id: BoxId,
        start: Point,
        initial_width: f64,
        initial_height: f64,
    },
}

impl Gesture {
    fn id(&self) -> BoxId {
        match self {
            Gesture::Draw { id, .. } | Gesture::Move { id, .. } | Gesture::Resize { id, .. } => *id,
        }
    }

    fn mode(&self) -> InteractionMode {
        match self {
            Gesture::Draw { .. } => InteractionMode::Draw,
            Gesture::Move { .. } => InteractionMode::Move,
            Gesture::Resize { .. } => InteractionMode::Resize,
        }
    }
}

/// Result of releasing the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// No gesture was active.
    Idle,
    /// A draw below the minimum size; the box was removed.
    Discarded(BoxId),
    /// The gesture finished and the box should be re-bound and saved.
    Committed { id: BoxId, mode: InteractionMode },
}

#[derive(Debug, Clone)]
pub struct InteractionMachine {
    gesture: Option<Gesture>,
    min_box_size: f64,
    min_resize: f64,
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self::new(MIN_BOX_SIZE, MIN_RESIZE)
    }
}

impl InteractionMachine {
    pub fn new(min_box_size: f64, min_resize: f64) -> Self {
        Self {
            gesture: None,
            min_box_size,
            min_resize,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.gesture.map_or(InteractionMode::None, |g| g.mode())
    }

    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// The box being drawn, moved or resized.
    pub fn active_box(&self) -> Option<BoxId> {
        self.gesture.map(|g| g.id())
    }

    /// Starts a gesture. Ignored while another gesture is active.
    pub fn pointer_down(
        &mut self,
        boxes: &mut BoxCollection,
        target: PointerTarget,
        point: Point,
    ) -> InteractionMode {
        if let Some(active) = self.gesture {
            tracing::debug!("Pointer down ignored during {:?}", active.mode());
            return InteractionMode::None;
        }

        self.gesture = match target {
            PointerTarget::ResizeHandle(id) => boxes.get(id).map(|b| Gesture::Resize {
                id,
                start: point,
                initial_width: b.geometry.width,
                initial_height: b.geometry.height,
            }),
            PointerTarget::Box(id) => boxes.get(id).map(|b| Gesture::Move {
                id,
                start: point,
                initial: b.geometry.origin(),
            }),
            PointerTarget::Background => Some(Gesture::Draw {
                id: boxes.insert(Rect::at(point)),
                start: point,
            }),
            PointerTarget::Other => None,
        };

        self.mode()
    }

    /// Updates the active gesture. Returns `false` when nothing is active.
    pub fn pointer_move(&mut self, boxes: &mut BoxCollection, point: Point) -> bool {
        let Some(gesture) = self.gesture else {
            return false;
        };
        let Some(b) = boxes.get_mut(gesture.id()) else {
            self.gesture = None;
            return false;
        };

        match gesture {
            Gesture::Draw { start, .. } => {
                b.geometry = Rect::from_corners(start, point);
            }
            Gesture::Move { start, initial, .. } => {
                let (dx, dy) = point.delta_from(&start);
                let origin = initial.offset(dx, dy);
                b.geometry.left = origin.x;
                b.geometry.top = origin.y;
            }
            Gesture::Resize {
                start,
                initial_width,
                initial_height,
                ..
            } => {
                let (dx, dy) = point.delta_from(&start);
                b.geometry.width = (initial_width + dx).max(self.min_resize);
                b.geometry.height = (initial_height + dy).max(self.min_resize);
            }
        }
        true
    }

    /// Ends the active gesture.
    pub fn pointer_up(&mut self, boxes: &mut BoxCollection) -> GestureOutcome {
        let Some(gesture) = self.gesture.take() else {
            return GestureOutcome::Idle;
        };
        let id = gesture.id();

        if let Gesture::Draw { .. } = gesture {
            let too_small = boxes.get(id).is_none_or(|b| {
                b.geometry.width < self.min_box_size || b.geometry.height < self.min_box_size
            });
            if too_small {
                boxes.remove(id);
                tracing::debug!("Discarded draw {} below minimum size", id);
                return GestureOutcome::Discarded(id);
            }
        }

        if boxes.contains(id) {
            GestureOutcome::Committed {
                id,
                mode: gesture.mode(),
            }
        } else {
            GestureOutcome::Idle
        }
    }

    /// Abandons the active gesture, removing a box still being drawn.
    pub fn cancel(&mut self, boxes: &mut BoxCollection) {
        if let Some(Gesture::Draw { id, .. }) = self.gesture.take() {
            boxes.remove(id);
        }
    }

    /// Forgets the active gesture without touching the collection.
    pub fn reset(&mut self) {
        self.gesture = None;
    }
}
