//! Render projection of the session state.
//!
//! Hosts draw exactly what these structs describe; nothing here is read back.

use deepoverlay_core::{BoxId, Rect};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayMode {
    View,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxView {
    pub id: BoxId,
    /// Page coordinates.
    pub geometry: Rect,
    pub note: String,
    pub selected: bool,
    pub anchored: bool,
}

/// The note editor bubble, placed below its box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteEditorView {
    pub box_id: BoxId,
    pub left: f64,
    pub top: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayView {
    pub visible: bool,
    pub mode: OverlayMode,
    /// Overlay layer extent: the larger of the document and the viewport.
    pub layer_width: f64,
    pub layer_height: f64,
    pub blocks_page_clicks: bool,
    pub boxes: Vec<BoxView>,
    pub editor: Option<NoteEditorView>,
}

impl OverlayView {
    pub fn selected_box(&self) -> Option<&BoxView> {
        self.boxes.iter().find(|b| b.selected)
    }
}

/// Editor placement for a box: left-aligned, `offset` below its bottom edge.
pub fn editor_position(geometry: &Rect, offset: f64) -> (f64, f64) {
    (geometry.left, geometry.bottom() + offset)
}
