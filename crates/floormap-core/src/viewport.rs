//! Screen geometry for the map area: cursor points, bounding rectangles and
//! the pan/zoom transform applied to the floor plan.

use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 3.0;
pub const ZOOM_STEP: f64 = 0.25;

/// A cursor position in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A bounding rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Bounds that can map a cursor to a finite percentage.
    pub fn is_usable(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Position of `point` as percentages of this rectangle.
    ///
    /// Points outside the rectangle yield values outside `[0, 100]`; they are
    /// not clamped. Returns `None` when the result would not be finite.
    pub fn relative_percent(&self, point: Point) -> Option<(f64, f64)> {
        if !self.is_usable() || !point.x.is_finite() || !point.y.is_finite() {
            return None;
        }
        let x = (point.x - self.left) / self.width * 100.0;
        let y = (point.y - self.top) / self.height * 100.0;
        Some((x, y))
    }
}

/// Pan/zoom applied to the floor plan inside its container.
///
/// Scaling is centred on the container; the pan offset is applied after
/// scaling, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        }
    }
}

impl Viewport {
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    /// Set the zoom factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.pan_x += dx;
            self.pan_y += dy;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Rectangle the floor plan occupies on screen for a given container.
    pub fn rendered_bounds(&self, container: Bounds) -> Bounds {
        let width = container.width * self.zoom;
        let height = container.height * self.zoom;
        Bounds {
            left: container.left + (container.width - width) / 2.0 + self.pan_x,
            top: container.top + (container.height - height) / 2.0 + self.pan_y,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_percent() {
        let bounds = Bounds::new(100.0, 50.0, 800.0, 400.0);
        assert_eq!(
            bounds.relative_percent(Point::new(500.0, 250.0)),
            Some((50.0, 50.0))
        );
        assert_eq!(
            bounds.relative_percent(Point::new(100.0, 50.0)),
            Some((0.0, 0.0))
        );
    }

    #[test]
    fn test_relative_percent_outside_is_not_clamped() {
        let bounds = Bounds::new(0.0, 0.0, 200.0, 100.0);
        assert_eq!(
            bounds.relative_percent(Point::new(-20.0, 150.0)),
            Some((-10.0, 150.0))
        );
    }

    #[test]
    fn test_degenerate_bounds() {
        let point = Point::new(1.0, 1.0);
        assert_eq!(Bounds::new(0.0, 0.0, 0.0, 10.0).relative_percent(point), None);
        assert_eq!(Bounds::new(0.0, 0.0, 10.0, -1.0).relative_percent(point), None);
        assert_eq!(
            Bounds::new(0.0, 0.0, f64::INFINITY, 10.0).relative_percent(point),
            None
        );
        assert_eq!(
            Bounds::new(0.0, 0.0, 10.0, 10.0).relative_percent(Point::new(f64::NAN, 1.0)),
            None
        );
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::default();
        for _ in 0..20 {
            viewport.zoom_in();
        }
        assert_eq!(viewport.zoom, MAX_ZOOM);
        for _ in 0..20 {
            viewport.zoom_out();
        }
        assert_eq!(viewport.zoom, MIN_ZOOM);

        viewport.set_zoom(f64::NAN);
        assert_eq!(viewport.zoom, MIN_ZOOM);
    }

    #[test]
    fn test_rendered_bounds() {
        let container = Bounds::new(0.0, 0.0, 400.0, 200.0);
        let mut viewport = Viewport::default();
        assert_eq!(viewport.rendered_bounds(container), container);

        viewport.set_zoom(2.0);
        viewport.pan_by(30.0, -10.0);
        assert_eq!(
            viewport.rendered_bounds(container),
            Bounds::new(-170.0, -110.0, 800.0, 400.0)
        );

        viewport.reset();
        assert_eq!(viewport, Viewport::default());
    }

    #[test]
    fn test_drop_through_zoomed_view_hits_same_spot() {
        let container = Bounds::new(10.0, 20.0, 400.0, 200.0);
        let mut viewport = Viewport::default();
        viewport.set_zoom(1.5);
        let rendered = viewport.rendered_bounds(container);

        // Container centre stays the image centre when only zooming.
        let centre = Point::new(210.0, 120.0);
        assert_eq!(rendered.relative_percent(centre), Some((50.0, 50.0)));
    }
}
