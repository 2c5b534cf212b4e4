//! Rubber-band selection.

use crate::registry::NodeRegistry;
use crate::shapes::ShapeId;
use kurbo::{Point, Rect};

/// What a finished marquee does to the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarqueeOutcome {
    /// Replace the selection with these ids (z-order, possibly empty).
    Select(Vec<ShapeId>),
    /// The drag had zero area: clear the selection.
    Clear,
}

/// An in-progress rubber-band drag in canvas coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Marquee {
    pub start: Point,
    pub current: Point,
}

impl Marquee {
    pub fn begin(start: Point) -> Self {
        Self { start, current: start }
    }

    pub fn update(&mut self, point: Point) {
        self.current = point;
    }

    /// The normalized drag rectangle.
    pub fn rect(&self) -> Rect {
        Rect::from_points(self.start, self.current)
    }

    /// Complete the drag and hit-test it against the mounted nodes.
    pub fn finish(mut self, point: Point, registry: &NodeRegistry) -> MarqueeOutcome {
        self.current = point;
        let area = self.rect();
        if area.width() == 0.0 || area.height() == 0.0 {
            return MarqueeOutcome::Clear;
        }
        MarqueeOutcome::Select(intersecting(area, registry))
    }
}

/// Ids of nodes whose rendered box overlaps `area`, edges included.
///
/// Images still loading (or failed) count with their placeholder box.
pub fn intersecting(area: Rect, registry: &NodeRegistry) -> Vec<ShapeId> {
    registry
        .iter()
        .filter(|node| overlaps(area, node.client_rect()))
        .map(|node| node.id().clone())
        .collect()
}

/// Inclusive rectangle overlap: touching edges count.
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}
