//! Geometry primitives.
//!
//! Two coordinate spaces are in play:
//! - **viewport** coordinates: origin at the visible top-left corner. Hosts
//!   report element bounding boxes and perform hit tests in this space.
//! - **page** coordinates: viewport coordinates plus the page scroll offset.
//!   The overlay layer is anchored to the document origin, so box geometry is
//!   kept in this space.

use serde::{Deserialize, Serialize};

/// A point in either coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `(dx, dy)` from `origin` to this point.
    pub fn delta_from(&self, origin: &Point) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }

    /// Returns this point shifted by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle, top-left origin with positive extents.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Creates a new rectangle.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Zero-sized rectangle at `origin`.
    pub fn at(origin: Point) -> Self {
        Self::new(origin.x, origin.y, 0.0, 0.0)
    }

    /// Normalized rectangle spanning two arbitrary corners.
    ///
    /// Works for a drag in any of the four directions.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.left + self.width / 2.0,
            self.top + self.height / 2.0,
        )
    }

    /// Half-open containment test: left/top edges inclusive, right/bottom exclusive.
    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.left && point.x < self.right() && point.y >= self.top && point.y < self.bottom()
    }

    /// Returns this rectangle moved by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.left + dx, self.top + dy, self.width, self.height)
    }

    /// True when the rectangle cannot serve as a ratio reference: a zero,
    /// negative or non-finite extent would produce non-finite ratios.
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }

    /// Converts a page-space rectangle to viewport space.
    pub fn to_viewport(&self, scroll: Point) -> Rect {
        self.translate(-scroll.x, -scroll.y)
    }

    /// Converts a viewport-space rectangle to page space.
    pub fn to_page(&self, scroll: Point) -> Rect {
        self.translate(scroll.x, scroll.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_any_direction() {
        let expected = Rect::new(100.0, 100.0, 200.0, 150.0);
        let a = Point::new(100.0, 100.0);
        let b = Point::new(300.0, 250.0);

        assert_eq!(Rect::from_corners(a, b), expected);
        assert_eq!(Rect::from_corners(b, a), expected);
        assert_eq!(
            Rect::from_corners(Point::new(300.0, 100.0), Point::new(100.0, 250.0)),
            expected
        );
    }

    #[test]
    fn test_center_and_edges() {
        let rect = Rect::new(50.0, 50.0, 500.0, 500.0);
        assert_eq!(rect.center(), Point::new(300.0, 300.0));
        assert_eq!(rect.right(), 550.0);
        assert_eq!(rect.bottom(), 550.0);
    }

    #[test]
    fn test_contains_is_half_open() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(&Point::new(0.0, 0.0)));
        assert!(rect.contains(&Point::new(9.9, 9.9)));
        assert!(!rect.contains(&Point::new(10.0, 5.0)));
        assert!(!rect.contains(&Point::new(5.0, -0.1)));
    }

    #[test]
    fn test_degenerate() {
        assert!(Rect::new(0.0, 0.0, 0.0, 10.0).is_degenerate());
        assert!(Rect::new(0.0, 0.0, 10.0, 0.0).is_degenerate());
        assert!(Rect::new(0.0, 0.0, f64::NAN, 10.0).is_degenerate());
        assert!(Rect::new(0.0, 0.0, -5.0, 10.0).is_degenerate());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_viewport_page_conversion() {
        let scroll = Point::new(0.0, 400.0);
        let page = Rect::new(10.0, 500.0, 30.0, 40.0);
        let viewport = page.to_viewport(scroll);
        assert_eq!(viewport, Rect::new(10.0, 100.0, 30.0, 40.0));
        assert_eq!(viewport.to_page(scroll), page);
    }
}
