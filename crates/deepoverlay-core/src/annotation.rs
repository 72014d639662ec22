//! Annotation box data model
//!
//! An annotation box is a user-drawn rectangle with a note. When it is pinned
//! to an element of the page (an *anchor*), its absolute geometry is derived
//! from the anchor's live bounding box and the stored ratio binding; the
//! geometry kept here is only a cache of the last reconciliation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// In-memory identity of a box within one page's collection.
///
/// Not persisted: stored records are identified by their position in the
/// page's sequence.
pub type BoxId = u64;

/// Serializable, re-resolvable description of an element's position in the
/// document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Box geometry expressed proportionally to the anchor's geometry at bind time.
///
/// Offsets are not clamped to `[0, 1]`: a box drawn partly outside its anchor
/// has a negative or greater-than-one offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioBinding {
    /// Left offset as a fraction of the anchor width.
    pub x: f64,
    /// Top offset as a fraction of the anchor height.
    pub y: f64,
    /// Width as a fraction of the anchor width. `None` keeps a fixed size.
    pub width: Option<f64>,
    /// Height as a fraction of the anchor height. `None` keeps a fixed size.
    pub height: Option<f64>,
}

impl RatioBinding {
    /// Offset-only binding; the box keeps its absolute size.
    pub fn offset(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            width: None,
            height: None,
        }
    }

    /// Binding that also scales the box with its anchor.
    pub fn scaled(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: Some(width),
            height: Some(height),
        }
    }

    /// True when every present component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_none_or(f64::is_finite)
            && self.height.is_none_or(f64::is_finite)
    }
}

/// An anchor element locator together with the box's ratios against it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorBinding {
    pub locator: Locator,
    pub ratios: RatioBinding,
}

/// One user-drawn rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationBox {
    pub id: BoxId,
    /// Absolute geometry in page coordinates.
    pub geometry: Rect,
    pub note: String,
    /// `None` means floating: positioned only by `geometry`.
    pub anchor: Option<AnchorBinding>,
}

impl AnnotationBox {
    /// Creates a floating box with an empty note.
    pub fn new(id: BoxId, geometry: Rect) -> Self {
        Self {
            id,
            geometry,
            note: String::new(),
            anchor: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_anchor(mut self, anchor: AnchorBinding) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn is_anchored(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn locator(&self) -> Option<&Locator> {
        self.anchor.as_ref().map(|a| &a.locator)
    }

    /// Drops the anchor, leaving the box floating at its current geometry.
    pub fn clear_anchor(&mut self) -> Option<AnchorBinding> {
        self.anchor.take()
    }
}
