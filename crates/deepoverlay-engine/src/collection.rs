//! In-memory box collection for the active page.

use deepoverlay_core::{AnnotationBox, BoxId, Point, Rect};

/// Side of the square resize handle in the bottom-right corner of a box.
pub const RESIZE_HANDLE_SIZE: f64 = 10.0;

/// Where a pointer landed on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    ResizeHandle(BoxId),
    Box(BoxId),
    /// The overlay layer itself.
    Background,
    /// Anything else (note editor, toolbar...).
    Other,
}

/// Ordered boxes of one page. Order is paint order and persisted order.
#[derive(Debug, Clone, Default)]
pub struct BoxCollection {
    boxes: Vec<AnnotationBox>,
    next_id: BoxId,
}

impl BoxCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from loaded boxes, assigning fresh ids.
    pub fn from_loaded(boxes: Vec<AnnotationBox>) -> Self {
        let mut collection = Self::new();
        collection.replace_all(boxes);
        collection
    }

    /// Generates a new unique ID.
    pub fn generate_id(&mut self) -> BoxId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Adds a floating box and returns its id.
    pub fn insert(&mut self, geometry: Rect) -> BoxId {
        let id = self.generate_id();
        self.boxes.push(AnnotationBox::new(id, geometry));
        id
    }

    pub fn get(&self, id: BoxId) -> Option<&AnnotationBox> {
        self.boxes.iter().find(|b| b.id == id)
    }

    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut AnnotationBox> {
        self.boxes.iter_mut().find(|b| b.id == id)
    }

    pub fn contains(&self, id: BoxId) -> bool {
        self.get(id).is_some()
    }

    pub fn remove(&mut self, id: BoxId) -> Option<AnnotationBox> {
        let index = self.boxes.iter().position(|b| b.id == id)?;
        Some(self.boxes.remove(index))
    }

    /// Replaces the contents, keeping order but renumbering ids.
    pub fn replace_all(&mut self, boxes: Vec<AnnotationBox>) {
        self.boxes.clear();
        for mut b in boxes {
            b.id = self.generate_id();
            self.boxes.push(b);
        }
    }

    pub fn clear(&mut self) {
        self.boxes.clear();
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnnotationBox> {
        self.boxes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut AnnotationBox> {
        self.boxes.iter_mut()
    }

    pub fn as_slice(&self) -> &[AnnotationBox] {
        &self.boxes
    }

    /// Classifies a page-space point: topmost box first, its resize handle
    /// taking precedence over its body.
    pub fn hit_test(&self, point: Point) -> PointerTarget {
        for b in self.boxes.iter().rev() {
            let g = &b.geometry;
            let handle = Rect::new(
                g.right() - RESIZE_HANDLE_SIZE,
                g.bottom() - RESIZE_HANDLE_SIZE,
                RESIZE_HANDLE_SIZE,
                RESIZE_HANDLE_SIZE,
            );
            if handle.contains(&point) {
                return PointerTarget::ResizeHandle(b.id);
            }
            if g.contains(&point) {
                return PointerTarget::Box(b.id);
            }
        }
        PointerTarget::Background
    }
}
