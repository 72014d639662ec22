//! Host page access.
//!
//! The engine never touches a browser directly. Everything it needs from the
//! page is expressed by [`PageDom`]; [`PageTree`] is an in-memory
//! implementation used by tools and tests.

mod tree;

use std::ops::{Deref, DerefMut};

use deepoverlay_core::{Point, Rect};

pub use tree::{NodeId, PageTree};

/// Read access to the host document plus the one mutation the engine needs:
/// toggling whether the overlay layer takes part in hit testing.
pub trait PageDom {
    /// Element handle. Cheap to copy; stale handles are allowed and simply
    /// stop resolving.
    type Node: Copy + Eq + std::fmt::Debug;

    /// The `<html>` element.
    fn document_element(&self) -> Option<Self::Node>;

    fn body(&self) -> Option<Self::Node>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Element children in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Lowercase tag name.
    fn tag_name(&self, node: Self::Node) -> String;

    /// The `id` attribute, if set.
    fn element_id(&self, node: Self::Node) -> Option<String>;

    /// First attached element with the given id, in document order.
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Border box in viewport coordinates.
    fn bounding_rect(&self, node: Self::Node) -> Rect;

    /// Topmost element at a viewport point, honouring the overlay's hit-test
    /// setting. `None` outside the viewport.
    fn element_from_point(&self, point: Point) -> Option<Self::Node>;

    /// Page scroll offset.
    fn scroll_offset(&self) -> Point;

    /// Visible area `(width, height)`.
    fn viewport_size(&self) -> (f64, f64);

    /// Scrollable document extent `(width, height)`.
    fn document_size(&self) -> (f64, f64);

    fn set_overlay_hit_testing(&mut self, enabled: bool);

    fn is_root_or_body(&self, node: Self::Node) -> bool {
        Some(node) == self.document_element() || Some(node) == self.body()
    }
}

/// Disables overlay hit testing for its lifetime.
///
/// Dereferences to the wrapped DOM so queries can be made through it.
pub struct OverlayPassthrough<'a, D: PageDom> {
    dom: &'a mut D,
}

impl<'a, D: PageDom> OverlayPassthrough<'a, D> {
    pub fn new(dom: &'a mut D) -> Self {
        dom.set_overlay_hit_testing(false);
        Self { dom }
    }
}

impl<D: PageDom> Deref for OverlayPassthrough<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.dom
    }
}

impl<D: PageDom> DerefMut for OverlayPassthrough<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.dom
    }
}

impl<D: PageDom> Drop for OverlayPassthrough<'_, D> {
    fn drop(&mut self) {
        self.dom.set_overlay_hit_testing(true);
    }
}
