//! Shape definitions for the editing surface.

mod image;
mod style;
mod text;

pub use image::ImageProps;
pub use style::{ShapeStyle, parse_color};
pub use text::{FontStyle, TextAlign, TextProps};

use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for shapes.
///
/// Stored documents may carry ids minted elsewhere, so ids are opaque strings.
/// Shapes created here get a UUID v4.
pub type ShapeId = String;

/// Generate a fresh shape id.
pub fn new_shape_id() -> ShapeId {
    Uuid::new_v4().to_string()
}

/// The variant part of a shape.
///
/// Serialized inline with the shape record, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShapeKind {
    #[serde(rename = "rect")]
    Rect,
    #[serde(rename = "circle", alias = "ellipse")]
    Ellipse,
    #[serde(rename = "triangle")]
    Triangle,
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "image")]
    Image(ImageProps),
    #[serde(rename = "text")]
    Text(TextProps),
}

impl ShapeKind {
    /// Name used in the `type` field of stored records.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rect => "rect",
            ShapeKind::Ellipse => "circle",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Line => "line",
            ShapeKind::Image(_) => "image",
            ShapeKind::Text(_) => "text",
        }
    }

    /// Size given to a freshly added shape of this kind.
    pub fn default_size(&self) -> (f64, f64) {
        match self {
            ShapeKind::Rect => (160.0, 100.0),
            ShapeKind::Ellipse => (120.0, 120.0),
            ShapeKind::Triangle => (120.0, 100.0),
            ShapeKind::Line => (200.0, 0.0),
            ShapeKind::Image(_) | ShapeKind::Text(_) => (240.0, 90.0),
        }
    }
}

/// One addressable drawable unit of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    /// Identifier, immutable after creation.
    pub id: ShapeId,
    /// Variant and variant-only fields.
    #[serde(flatten)]
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation in degrees around the node origin.
    #[serde(default)]
    pub rotation: f64,
    /// Fill, stroke and opacity.
    #[serde(flatten)]
    pub style: ShapeStyle,
    /// Locked shapes are never dragged or transformed.
    #[serde(default)]
    pub locked: bool,
}

impl Shape {
    /// Create a shape of the given kind at `(x, y)` with the kind's default size.
    pub fn new(kind: ShapeKind, x: f64, y: f64) -> Self {
        let (width, height) = kind.default_size();
        Self {
            id: new_shape_id(),
            kind,
            x,
            y,
            width,
            height,
            rotation: 0.0,
            style: ShapeStyle::default(),
            locked: false,
        }
    }

    /// Replace the generated id (used by tests and importers).
    pub fn with_id(mut self, id: impl Into<ShapeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the rotation in degrees.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Node origin in canvas coordinates.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ShapeKind::Text(_))
    }

    pub fn as_text(&self) -> Option<&TextProps> {
        match &self.kind {
            ShapeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextProps> {
        match &mut self.kind {
            ShapeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageProps> {
        match &self.kind {
            ShapeKind::Image(img) => Some(img),
            _ => None,
        }
    }

    /// Bounds in the node's local (unrotated) frame, relative to `(x, y)`.
    ///
    /// Ellipses are drawn around their origin; every other kind hangs off it.
    pub fn local_bounds(&self) -> Rect {
        local_bounds_for(&self.kind, self.width, self.height)
    }

    /// Local-to-canvas transform: translate to the origin, then rotate.
    pub fn node_transform(&self) -> Affine {
        Affine::translate(Vec2::new(self.x, self.y)) * Affine::rotate(self.rotation.to_radians())
    }

    /// Axis-aligned bounding box of the shape as drawn (stroke excluded).
    pub fn bounds(&self) -> Rect {
        match self.kind {
            ShapeKind::Line => {
                let t = self.node_transform();
                Rect::from_points(t * Point::ZERO, t * Point::new(self.width, self.height))
            }
            _ => self.node_transform().transform_rect_bbox(self.local_bounds()),
        }
    }

    /// Check if a canvas-space point hits the drawn shape.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let local = self.node_transform().inverse() * point;
        let bounds = self.local_bounds();
        match &self.kind {
            ShapeKind::Rect | ShapeKind::Image(_) | ShapeKind::Text(_) => {
                bounds.inflate(tolerance, tolerance).contains(local)
            }
            ShapeKind::Ellipse => {
                let rx = bounds.width() / 2.0 + tolerance;
                let ry = bounds.height() / 2.0 + tolerance;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                (local.x / rx).powi(2) + (local.y / ry).powi(2) <= 1.0
            }
            ShapeKind::Triangle => {
                let [apex, left, right] = triangle_points(self.width, self.height);
                point_in_triangle(local, apex, left, right)
                    || point_to_segment_dist(local, apex, left) <= tolerance
                    || point_to_segment_dist(local, left, right) <= tolerance
                    || point_to_segment_dist(local, right, apex) <= tolerance
            }
            ShapeKind::Line => {
                let end = Point::new(self.width, self.height);
                point_to_segment_dist(local, Point::ZERO, end)
                    <= tolerance + self.style.stroke_width / 2.0
            }
        }
    }

    /// Move the node origin by a delta.
    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Clone with a fresh id, offset by `offset`.
    pub fn duplicate(&self, offset: Vec2) -> Self {
        let mut copy = self.clone();
        copy.id = new_shape_id();
        copy.translate(offset);
        copy
    }
}

/// Local bounds for a kind of the given size.
pub(crate) fn local_bounds_for(kind: &ShapeKind, width: f64, height: f64) -> Rect {
    match kind {
        ShapeKind::Ellipse => Rect::new(-width / 2.0, -height / 2.0, width / 2.0, height / 2.0),
        _ => Rect::new(0.0, 0.0, width, height),
    }
}

/// Apex, bottom-left and bottom-right of a triangle in local space.
pub fn triangle_points(width: f64, height: f64) -> [Point; 3] {
    [
        Point::new(width / 2.0, 0.0),
        Point::new(0.0, height),
        Point::new(width, height),
    ]
}

fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let sign = |p1: Point, p2: Point, p3: Point| {
        (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
    };
    let d1 = sign(p, a, b);
    let d2 = sign(p, b, c);
    let d3 = sign(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}
