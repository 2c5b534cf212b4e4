//! Stage module: the view transform and where the canvas sits on the page.

use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// The drawing surface's view of the document.
///
/// Canvas (world) coordinates map to stage coordinates through pan and zoom.
/// Stage coordinates are relative to the canvas container; page coordinates
/// add the container's on-page origin, which moves when the window is resized
/// or scrolled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    /// Current translation offset (pan)
    pub offset: Vec2,
    /// Current zoom level (1.0 = 100%)
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Top-left of the canvas container in page coordinates.
    container_origin: Point,
    /// Visible size of the container.
    viewport: Size,
}

impl Default for Stage {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.1,
            max_zoom: 10.0,
            container_origin: Point::ZERO,
            viewport: Size::new(1280.0, 800.0),
        }
    }
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// World to stage transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Stage to world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    /// Convert a stage point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to stage coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Convert a world point to page coordinates.
    pub fn world_to_page(&self, world_point: Point) -> Point {
        self.world_to_screen(world_point) + self.container_origin.to_vec2()
    }

    /// Convert a page point to world coordinates.
    pub fn page_to_world(&self, page_point: Point) -> Point {
        self.screen_to_world(page_point - self.container_origin.to_vec2())
    }

    /// Pan the stage by a delta in stage coordinates. Non-finite deltas are
    /// ignored.
    pub fn pan(&mut self, delta: Vec2) {
        if !delta.is_finite() {
            log::warn!("Ignoring non-finite pan {:?}", delta);
            return;
        }
        self.offset += delta;
    }

    /// Zoom, keeping the given stage point fixed.
    ///
    /// The factor must be finite and positive, and the anchor finite.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 || !screen_point.is_finite() {
            log::warn!("Ignoring zoom by {} at {:?}", factor, screen_point);
            return;
        }
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let world_point = self.screen_to_world(screen_point);
        self.zoom = new_zoom;
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
    }

    pub fn container_origin(&self) -> Point {
        self.container_origin
    }

    /// Record where the container sits on the page after a resize or scroll.
    pub fn set_container_origin(&mut self, origin: Point) {
        self.container_origin = origin;
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_to_world_identity() {
        let stage = Stage::new();
        let world = stage.screen_to_world(Point::new(100.0, 200.0));
        assert!((world.x - 100.0).abs() < f64::EPSILON);
        assert!((world.y - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_round_trip_with_pan_and_zoom() {
        let mut stage = Stage::new();
        stage.offset = Vec2::new(50.0, 100.0);
        stage.zoom = 2.0;

        let screen = stage.world_to_screen(Point::new(10.0, 10.0));
        assert!((screen.x - 70.0).abs() < 1e-9);
        assert!((screen.y - 120.0).abs() < 1e-9);

        let back = stage.screen_to_world(screen);
        assert!((back.x - 10.0).abs() < 1e-9);
        assert!((back.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_page_coordinates_follow_container() {
        let mut stage = Stage::new();
        stage.set_container_origin(Point::new(30.0, 64.0));
        let page = stage.world_to_page(Point::new(10.0, 10.0));
        assert!((page.x - 40.0).abs() < 1e-9);
        assert!((page.y - 74.0).abs() < 1e-9);

        // Scrolling the page moves the container up.
        stage.set_container_origin(Point::new(30.0, 14.0));
        let page = stage.world_to_page(Point::new(10.0, 10.0));
        assert!((page.y - 24.0).abs() < 1e-9);
        let world = stage.page_to_world(page);
        assert!((world.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut stage = Stage::new();
        let anchor = Point::new(200.0, 150.0);
        let before = stage.screen_to_world(anchor);
        stage.zoom_at(anchor, 2.0);
        let after = stage.screen_to_world(anchor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
        assert!((stage.zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_finite_input_leaves_stage_usable() {
        let mut stage = Stage::new();
        stage.zoom_at(Point::new(10.0, 10.0), f64::NAN);
        stage.zoom_at(Point::new(10.0, 10.0), f64::INFINITY);
        stage.zoom_at(Point::new(10.0, 10.0), 0.0);
        stage.zoom_at(Point::new(f64::NAN, 10.0), 2.0);
        stage.pan(Vec2::new(f64::INFINITY, 0.0));
        stage.pan(Vec2::new(0.0, f64::NAN));
        assert!((stage.zoom - 1.0).abs() < f64::EPSILON);
        assert_eq!(stage.offset, Vec2::ZERO);

        stage.zoom_at(Point::new(100.0, 100.0), 2.0);
        let world = stage.screen_to_world(Point::new(40.0, 60.0));
        assert!(world.is_finite());
        assert!((world.x - 70.0).abs() < 1e-9);
        assert!((world.y - 80.0).abs() < 1e-9);
    }
}
