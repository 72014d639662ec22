//! Position Reconciler.
//!
//! Re-derives the absolute page geometry of anchored boxes from their
//! anchor element's live box. Reconciling is idempotent and each box is
//! handled independently, so the order of boxes does not matter.

use deepoverlay_core::{AnnotationBox, Rect};

use crate::dom::PageDom;
use crate::locator::resolve_locator;

/// What happened to one box during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Geometry re-derived from the anchor.
    Updated,
    /// No anchor; geometry untouched.
    Floating,
    /// Anchor did not resolve this pass; last known geometry kept.
    MissingAnchor,
}

/// Per-pass counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub updated: usize,
    pub floating: usize,
    pub missing: usize,
}

impl ReconcileReport {
    fn record(&mut self, outcome: ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Updated => self.updated += 1,
            ReconcileOutcome::Floating => self.floating += 1,
            ReconcileOutcome::MissingAnchor => self.missing += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.updated + self.floating + self.missing
    }
}

pub fn reconcile_box<D: PageDom>(dom: &D, annotation: &mut AnnotationBox) -> ReconcileOutcome {
    let Some(binding) = &annotation.anchor else {
        return ReconcileOutcome::Floating;
    };

    let Some(element) = resolve_locator(dom, &binding.locator) else {
        tracing::debug!("Anchor {} of box {} not found", binding.locator, annotation.id);
        return ReconcileOutcome::MissingAnchor;
    };

    let anchor = dom.bounding_rect(element);
    let scroll = dom.scroll_offset();
    let ratios = binding.ratios;
    let current = annotation.geometry;

    let next = Rect::new(
        anchor.left + scroll.x + anchor.width * ratios.x,
        anchor.top + scroll.y + anchor.height * ratios.y,
        ratios.width.map_or(current.width, |r| anchor.width * r),
        ratios.height.map_or(current.height, |r| anchor.height * r),
    );

    // a collapsed or hidden anchor must not poison the cached geometry
    let finite = [next.left, next.top, next.width, next.height]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        tracing::debug!("Anchor {} of box {} has no usable geometry", binding.locator, annotation.id);
        return ReconcileOutcome::MissingAnchor;
    }

    annotation.geometry = next;
    ReconcileOutcome::Updated
}

pub fn reconcile_all<'a, D: PageDom>(
    dom: &D,
    boxes: impl IntoIterator<Item = &'a mut AnnotationBox>,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for annotation in boxes {
        report.record(reconcile_box(dom, annotation));
    }
    report
}

/// Reply to a reconcile request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    /// The host must request an animation frame and call
    /// [`FrameScheduler::on_animation_frame`] from it.
    Schedule,
    /// A frame is already pending; nothing to do.
    AlreadyScheduled,
}

/// Layout-affecting events that trigger a reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutEvent {
    Resize,
    /// Scroll of the window or of any element (capture phase).
    Scroll,
    Navigation,
}

/// Coalesces reconcile requests to at most one pass per animation frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameScheduler {
    pending: bool,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self) -> FrameRequest {
        if self.pending {
            FrameRequest::AlreadyScheduled
        } else {
            self.pending = true;
            FrameRequest::Schedule
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Runs the pending pass. Returns `None` when no frame was requested.
    pub fn on_animation_frame<'a, D: PageDom>(
        &mut self,
        dom: &D,
        boxes: impl IntoIterator<Item = &'a mut AnnotationBox>,
    ) -> Option<ReconcileReport> {
        if !self.pending {
            return None;
        }
        self.pending = false;
        Some(reconcile_all(dom, boxes))
    }

    /// Drops a pending request without running it.
    pub fn cancel(&mut self) {
        self.pending = false;
    }
}
