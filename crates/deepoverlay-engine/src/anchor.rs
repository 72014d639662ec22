//! Anchor Calculator.
//!
//! Binds a drawn rectangle to the element under its center and expresses the
//! rectangle as ratios of that element's box, so the rectangle can follow the
//! element when the layout changes.

use deepoverlay_core::{AnchorBinding, AnnotationBox, RatioBinding, Rect};

use crate::dom::{OverlayPassthrough, PageDom};
use crate::error::Unanchored;
use crate::locator::compute_locator;

/// Computes the anchor binding for a rectangle given in viewport coordinates.
pub fn compute_anchor<D: PageDom>(dom: &mut D, rect: Rect) -> Result<AnchorBinding, Unanchored> {
    let center = rect.center();

    let element = {
        let page = OverlayPassthrough::new(dom);
        page.element_from_point(center)
    };

    let element = element.ok_or(Unanchored::NoElement)?;
    if dom.is_root_or_body(element) {
        return Err(Unanchored::DocumentRoot);
    }

    let locator = compute_locator(dom, element).ok_or(Unanchored::NoLocator)?;
    let anchor = dom.bounding_rect(element);
    let ratios = ratios_within(&rect, &anchor)?;

    Ok(AnchorBinding { locator, ratios })
}

/// Expresses `rect` relative to `anchor`. Both must be in the same space.
pub fn ratios_within(rect: &Rect, anchor: &Rect) -> Result<RatioBinding, Unanchored> {
    if anchor.is_degenerate() {
        return Err(Unanchored::DegenerateAnchor);
    }

    let ratios = RatioBinding::scaled(
        (rect.left - anchor.left) / anchor.width,
        (rect.top - anchor.top) / anchor.height,
        rect.width / anchor.width,
        rect.height / anchor.height,
    );

    if ratios.is_finite() {
        Ok(ratios)
    } else {
        Err(Unanchored::DegenerateAnchor)
    }
}

/// Re-binds a box from its current page geometry.
///
/// On failure any previous anchor is dropped and the box floats at its
/// absolute position. Nothing is persisted here.
pub fn bind_box<D: PageDom>(dom: &mut D, annotation: &mut AnnotationBox) -> Result<(), Unanchored> {
    let viewport_rect = annotation.geometry.to_viewport(dom.scroll_offset());
    match compute_anchor(dom, viewport_rect) {
        Ok(binding) => {
            tracing::debug!("Box {} anchored to {}", annotation.id, binding.locator);
            annotation.anchor = Some(binding);
            Ok(())
        }
        Err(reason) => {
            tracing::debug!("Box {} left floating: {}", annotation.id, reason);
            annotation.clear_anchor();
            Err(reason)
        }
    }
}
