//! # DeepOverlay Engine
//!
//! Anchoring and reconciliation for page annotations:
//! - [`locator`]: stable element locators (Selector Resolver)
//! - [`anchor`]: binding drawn rectangles to page elements (Anchor Calculator)
//! - [`reconcile`]: re-deriving box geometry from anchors (Position Reconciler)
//! - [`interaction`]: draw, move and resize gestures
//! - [`session`]: per-page overlay state and event handling
//!
//! The host page is abstracted by [`dom::PageDom`].

pub mod anchor;
pub mod collection;
pub mod dom;
pub mod error;
pub mod interaction;
pub mod locator;
pub mod reconcile;
pub mod session;
pub mod view;

pub use anchor::{bind_box, compute_anchor, ratios_within};
pub use collection::{BoxCollection, PointerTarget, RESIZE_HANDLE_SIZE};
pub use dom::{NodeId, OverlayPassthrough, PageDom, PageTree};
pub use error::{LocatorParseError, Unanchored};
pub use interaction::{GestureOutcome, InteractionMachine, InteractionMode};
pub use locator::{compute_locator, escape_ident, resolve_locator, LocatorPath, PathStart, PathStep};
pub use reconcile::{
    reconcile_all, reconcile_box, FrameRequest, FrameScheduler, LayoutEvent, ReconcileOutcome,
    ReconcileReport,
};
pub use session::{KeyDisposition, KeyTarget, OverlaySession};
pub use view::{BoxView, NoteEditorView, OverlayMode, OverlayView};
