//! In-memory page model.

use deepoverlay_core::{Point, Rect};

use super::PageDom;

/// Handle to an element of a [`PageTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    id: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Page coordinates, or viewport coordinates when `fixed`.
    rect: Rect,
    fixed: bool,
}

/// Arena-backed element tree with layout boxes and a scrollable viewport.
///
/// Elements paint in document order, so the last element in a pre-order walk
/// that contains a point is the topmost one there. An optional overlay layer
/// sits above the whole document and covers it entirely.
#[derive(Debug, Clone)]
pub struct PageTree {
    elements: Vec<Element>,
    root: NodeId,
    body: NodeId,
    overlay: Option<NodeId>,
    overlay_visible: bool,
    overlay_hit_testing: bool,
    scroll: Point,
    viewport: (f64, f64),
}

impl PageTree {
    /// Creates `<html><body></body></html>` filling a viewport of the given size.
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        let page = Rect::new(0.0, 0.0, viewport_width, viewport_height);
        let mut tree = Self {
            elements: vec![Element {
                tag: "html".to_string(),
                id: None,
                parent: None,
                children: Vec::new(),
                rect: page,
                fixed: false,
            }],
            root: NodeId(0),
            body: NodeId(0),
            overlay: None,
            overlay_visible: true,
            overlay_hit_testing: true,
            scroll: Point::default(),
            viewport: (viewport_width, viewport_height),
        };
        tree.body = tree.append(tree.root, "body", page);
        tree
    }

    pub fn root_node(&self) -> NodeId {
        self.root
    }

    pub fn body_node(&self) -> NodeId {
        self.body
    }

    /// Appends an element with a page-space layout box.
    pub fn append(&mut self, parent: NodeId, tag: &str, rect: Rect) -> NodeId {
        let index = self.element(parent).map_or(0, |p| p.children.len());
        self.insert(parent, index, tag, rect)
    }

    /// Appends an element carrying an `id` attribute.
    pub fn append_with_id(&mut self, parent: NodeId, tag: &str, id: &str, rect: Rect) -> NodeId {
        let node = self.append(parent, tag, rect);
        self.set_element_id(node, Some(id));
        node
    }

    /// Inserts an element at `index` among `parent`'s children.
    pub fn insert(&mut self, parent: NodeId, index: usize, tag: &str, rect: Rect) -> NodeId {
        let node = NodeId(self.elements.len());
        self.elements.push(Element {
            tag: tag.to_ascii_lowercase(),
            id: None,
            parent: Some(parent),
            children: Vec::new(),
            rect,
            fixed: false,
        });
        if let Some(p) = self.elements.get_mut(parent.0) {
            let index = index.min(p.children.len());
            p.children.insert(index, node);
        }
        node
    }

    pub fn set_element_id(&mut self, node: NodeId, id: Option<&str>) {
        if let Some(e) = self.elements.get_mut(node.0) {
            e.id = id.map(str::to_string);
        }
    }

    /// Moves or resizes an element. For fixed elements `rect` is in viewport
    /// coordinates.
    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(e) = self.elements.get_mut(node.0) {
            e.rect = rect;
        }
    }

    /// Pins an element to the viewport (`position: fixed`).
    pub fn set_fixed(&mut self, node: NodeId, fixed: bool) {
        if let Some(e) = self.elements.get_mut(node.0) {
            e.fixed = fixed;
        }
    }

    /// Removes an element and its subtree from the document. The handle
    /// stays valid but no longer resolves.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.element(node).and_then(|e| e.parent) else {
            return;
        };
        if let Some(p) = self.elements.get_mut(parent.0) {
            p.children.retain(|c| *c != node);
        }
        if let Some(e) = self.elements.get_mut(node.0) {
            e.parent = None;
        }
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.element(current).and_then(|e| e.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn scroll_to(&mut self, offset: Point) {
        self.scroll = offset;
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
    }

    /// Adds the overlay layer as the last child of `<html>`.
    pub fn install_overlay(&mut self) -> NodeId {
        if let Some(existing) = self.overlay {
            return existing;
        }
        let (width, height) = self.document_size();
        let node = self.append(self.root, "div", Rect::new(0.0, 0.0, width, height));
        self.set_element_id(node, Some("deep-overlay-root"));
        self.overlay = Some(node);
        node
    }

    pub fn overlay_node(&self) -> Option<NodeId> {
        self.overlay
    }

    pub fn set_overlay_visible(&mut self, visible: bool) {
        self.overlay_visible = visible;
    }

    pub fn overlay_hit_testing(&self) -> bool {
        self.overlay_hit_testing
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        self.elements.get(node.0)
    }

    fn descendants_preorder(&self, from: NodeId, out: &mut Vec<NodeId>) {
        out.push(from);
        if let Some(e) = self.element(from) {
            for child in &e.children {
                self.descendants_preorder(*child, out);
            }
        }
    }

    fn in_overlay(&self, node: NodeId) -> bool {
        let Some(overlay) = self.overlay else {
            return false;
        };
        let mut current = Some(node);
        while let Some(n) = current {
            if n == overlay {
                return true;
            }
            current = self.element(n).and_then(|e| e.parent);
        }
        false
    }
}

impl PageDom for PageTree {
    type Node = NodeId;

    fn document_element(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn body(&self) -> Option<NodeId> {
        self.is_attached(self.body).then_some(self.body)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.element(node).and_then(|e| e.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.element(node).map(|e| e.children.clone()).unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> String {
        self.element(node).map(|e| e.tag.clone()).unwrap_or_default()
    }

    fn element_id(&self, node: NodeId) -> Option<String> {
        self.element(node).and_then(|e| e.id.clone())
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let mut order = Vec::new();
        self.descendants_preorder(self.root, &mut order);
        order
            .into_iter()
            .find(|n| self.element(*n).and_then(|e| e.id.as_deref()) == Some(id))
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        match self.element(node) {
            Some(e) if e.fixed => e.rect,
            Some(e) => e.rect.to_viewport(self.scroll),
            None => Rect::default(),
        }
    }

    fn element_from_point(&self, point: Point) -> Option<NodeId> {
        let (width, height) = self.viewport;
        if point.x < 0.0 || point.y < 0.0 || point.x >= width || point.y >= height {
            return None;
        }

        let mut order = Vec::new();
        self.descendants_preorder(self.root, &mut order);

        let hit = order.into_iter().rev().find(|n| {
            if self.in_overlay(*n) && !(self.overlay_visible && self.overlay_hit_testing) {
                return false;
            }
            self.bounding_rect(*n).contains(&point)
        });
        hit.or(Some(self.root))
    }

    fn scroll_offset(&self) -> Point {
        self.scroll
    }

    fn viewport_size(&self) -> (f64, f64) {
        self.viewport
    }

    fn document_size(&self) -> (f64, f64) {
        let mut order = Vec::new();
        self.descendants_preorder(self.root, &mut order);

        order
            .into_iter()
            .filter(|n| !self.in_overlay(*n))
            .filter_map(|n| self.element(n))
            .filter(|e| !e.fixed)
            .fold(self.viewport, |(w, h), e| {
                (w.max(e.rect.right()), h.max(e.rect.bottom()))
            })
    }

    fn set_overlay_hit_testing(&mut self, enabled: bool) {
        self.overlay_hit_testing = enabled;
    }
}
