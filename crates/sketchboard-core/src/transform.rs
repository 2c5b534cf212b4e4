//! Resize and rotate handles for a single selected shape.
//!
//! While an anchor is dragged only the render node changes (position, scale,
//! rotation). [`TransformController::end`] folds the node's scale into the
//! record's size and hands back the geometry to commit.

use crate::registry::{NodeRegistry, ShapeNode};
use crate::selection::Selection;
use crate::shapes::{ShapeId, ShapeKind};
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Handle hit tolerance in canvas units.
pub const HANDLE_HIT_TOLERANCE: f64 = 8.0;

/// Distance from shape edge to rotation handle (in canvas units).
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// Resize anchor positions on the local box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleRight,
    BottomRight,
    BottomCenter,
    BottomLeft,
    MiddleLeft,
}

impl Anchor {
    pub const ALL: [Anchor; 8] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::MiddleRight,
        Anchor::BottomRight,
        Anchor::BottomCenter,
        Anchor::BottomLeft,
        Anchor::MiddleLeft,
    ];

    /// Point of the box this anchor sits on.
    fn on(self, bounds: Rect) -> Point {
        let c = bounds.center();
        match self {
            Anchor::TopLeft => Point::new(bounds.x0, bounds.y0),
            Anchor::TopCenter => Point::new(c.x, bounds.y0),
            Anchor::TopRight => Point::new(bounds.x1, bounds.y0),
            Anchor::MiddleRight => Point::new(bounds.x1, c.y),
            Anchor::BottomRight => Point::new(bounds.x1, bounds.y1),
            Anchor::BottomCenter => Point::new(c.x, bounds.y1),
            Anchor::BottomLeft => Point::new(bounds.x0, bounds.y1),
            Anchor::MiddleLeft => Point::new(bounds.x0, c.y),
        }
    }

    /// Which edges the anchor drags: (left, top, right, bottom).
    fn edges(self) -> (bool, bool, bool, bool) {
        match self {
            Anchor::TopLeft => (true, true, false, false),
            Anchor::TopCenter => (false, true, false, false),
            Anchor::TopRight => (false, true, true, false),
            Anchor::MiddleRight => (false, false, true, false),
            Anchor::BottomRight => (false, false, true, true),
            Anchor::BottomCenter => (false, false, false, true),
            Anchor::BottomLeft => (true, false, false, true),
            Anchor::MiddleLeft => (true, false, false, false),
        }
    }
}

/// Type of transform handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    Resize(Anchor),
    /// Rotation handle (above the top edge).
    Rotate,
}

/// A transform handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in canvas coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a canvas point hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Geometry to write back to the record when a transform ends.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformCommit {
    pub id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

/// Node geometry captured when an anchor is grabbed.
#[derive(Debug, Clone)]
struct ActiveTransform {
    id: ShapeId,
    handle: HandleKind,
    /// Pointer position in the node's unscaled local frame.
    start_local: Point,
    origin: Point,
    rotation: f64,
    local_bounds: Rect,
}

impl ActiveTransform {
    fn frame(&self) -> Affine {
        Affine::translate(self.origin.to_vec2()) * Affine::rotate(self.rotation.to_radians())
    }
}

/// Attaches handles to the selection and drives resize/rotate gestures.
#[derive(Debug, Clone, Default)]
pub struct TransformController {
    attached: Option<ShapeId>,
    active: Option<ActiveTransform>,
}

impl TransformController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-evaluate which shape carries handles.
    ///
    /// Handles attach only to a single selected, unlocked shape that is not
    /// being text-edited and has a mounted node.
    pub fn attach(
        &mut self,
        selection: &Selection,
        registry: &NodeRegistry,
        editing: Option<&str>,
    ) {
        self.attached = selection
            .single()
            .filter(|id| Some(id.as_str()) != editing)
            .filter(|id| registry.get(id).is_some_and(|node| !node.locked()))
            .cloned();
        if self.active.as_ref().is_some_and(|a| Some(&a.id) != self.attached.as_ref()) {
            self.active = None;
        }
    }

    /// The shape currently carrying handles.
    pub fn attached(&self) -> Option<&ShapeId> {
        self.attached.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Handles of the attached shape in canvas coordinates.
    pub fn handles(&self, registry: &NodeRegistry) -> Vec<Handle> {
        let Some(node) = self.attached.as_ref().and_then(|id| registry.get(id)) else {
            return Vec::new();
        };
        let transform = node.transform();
        let bounds = node_local_bounds(node);
        let mut handles: Vec<Handle> = Anchor::ALL
            .iter()
            .map(|anchor| Handle::new(transform * anchor.on(bounds), HandleKind::Resize(*anchor)))
            .collect();
        let top = Anchor::TopCenter.on(bounds);
        let frame = Affine::translate(node.absolute_position().to_vec2())
            * Affine::rotate(node.rotation.to_radians());
        let top_scaled = Point::new(top.x * node.scale.x, top.y * node.scale.y);
        handles.push(Handle::new(
            frame * (top_scaled - Vec2::new(0.0, ROTATE_HANDLE_OFFSET)),
            HandleKind::Rotate,
        ));
        handles
    }

    /// Find which handle (if any) is hit at the given point.
    pub fn hit_test_handles(
        &self,
        registry: &NodeRegistry,
        point: Point,
        tolerance: f64,
    ) -> Option<HandleKind> {
        self.handles(registry)
            .into_iter()
            .find(|handle| handle.hit_test(point, tolerance))
            .map(|handle| handle.kind)
    }

    /// Grab a handle of the attached shape.
    pub fn begin(&mut self, handle: HandleKind, point: Point, registry: &NodeRegistry) -> bool {
        let Some(node) = self.attached.as_ref().and_then(|id| registry.get(id)) else {
            return false;
        };
        let mut active = ActiveTransform {
            id: node.id().clone(),
            handle,
            start_local: Point::ZERO,
            origin: node.absolute_position(),
            rotation: node.rotation,
            local_bounds: node_local_bounds(node),
        };
        active.start_local = active.frame().inverse() * point;
        log::debug!("Transform of {} started with {:?}", active.id, handle);
        self.active = Some(active);
        true
    }

    /// Follow the pointer. `snap` rounds rotation to `snap_degrees` steps.
    pub fn update(
        &mut self,
        point: Point,
        snap: bool,
        snap_degrees: f64,
        registry: &mut NodeRegistry,
    ) {
        let Some(active) = &self.active else {
            return;
        };
        let Some(node) = registry.get_mut(&active.id) else {
            return;
        };
        match active.handle {
            HandleKind::Resize(anchor) => resize_node(active, anchor, point, node),
            HandleKind::Rotate => rotate_node(active, point, snap, snap_degrees, node),
        }
    }

    /// Release the handle: reset the node scale and return what to commit.
    pub fn end(&mut self, registry: &mut NodeRegistry, min_size: f64) -> Option<TransformCommit> {
        let active = self.active.take()?;
        let node = registry.get_mut(&active.id)?;
        let scale = node.scale;
        node.scale = Vec2::new(1.0, 1.0);

        let shape = node.shape();
        let (width, height) = match shape.kind {
            // A line's box may legitimately be flat or mirrored.
            ShapeKind::Line => (shape.width * scale.x, shape.height * scale.y),
            _ => (
                (shape.width * scale.x).max(min_size),
                (shape.height * scale.y).max(min_size),
            ),
        };
        let origin = node.absolute_position();
        Some(TransformCommit {
            id: active.id,
            x: origin.x,
            y: origin.y,
            width,
            height,
            rotation: node.rotation,
        })
    }
}

fn node_local_bounds(node: &ShapeNode) -> Rect {
    node.shape().local_bounds().abs()
}

fn resize_node(active: &ActiveTransform, anchor: Anchor, point: Point, node: &mut ShapeNode) {
    let frame = active.frame();
    let delta = frame.inverse() * point - active.start_local;
    let lb = active.local_bounds;
    let (left, top, right, bottom) = anchor.edges();

    let mut x0 = if left { lb.x0 + delta.x } else { lb.x0 };
    let mut x1 = if right { lb.x1 + delta.x } else { lb.x1 };
    let mut y0 = if top { lb.y0 + delta.y } else { lb.y0 };
    let mut y1 = if bottom { lb.y1 + delta.y } else { lb.y1 };

    // Never flip or collapse: keep at least one unit and pin the fixed edge.
    if x1 - x0 < 1.0 {
        if left { x0 = x1 - 1.0 } else { x1 = x0 + 1.0 }
    }
    if y1 - y0 < 1.0 {
        if top { y0 = y1 - 1.0 } else { y1 = y0 + 1.0 }
    }

    let sx = if lb.width() > f64::EPSILON { (x1 - x0) / lb.width() } else { 1.0 };
    let sy = if lb.height() > f64::EPSILON { (y1 - y0) / lb.height() } else { 1.0 };

    // Keep the new box's top-left where the drag put it.
    let shift = Vec2::new(x0 - sx * lb.x0, y0 - sy * lb.y0);
    let origin = frame * shift.to_point();

    node.scale = Vec2::new(sx, sy);
    node.position = origin;
    node.drag_offset = Vec2::ZERO;
}

fn rotate_node(
    active: &ActiveTransform,
    point: Point,
    snap: bool,
    snap_degrees: f64,
    node: &mut ShapeNode,
) {
    let local_center = active.local_bounds.center();
    let center = active.frame() * local_center;

    let d = point - center;
    let mut degrees = (d.y.atan2(d.x) + std::f64::consts::FRAC_PI_2).to_degrees();
    if snap && snap_degrees > 0.0 {
        degrees = (degrees / snap_degrees).round() * snap_degrees;
    }
    degrees = normalize_degrees(degrees);

    // Pivot about the centre.
    let rotated_center = Affine::rotate(degrees.to_radians()) * local_center;
    node.rotation = degrees;
    node.position = center - rotated_center.to_vec2();
    node.drag_offset = Vec2::ZERO;
}

/// Map an angle to (-180, 180].
fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees.rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::shapes::Shape;

    fn setup(shape: Shape) -> (Document, NodeRegistry, Selection, TransformController) {
        let id = shape.id.clone();
        let document = Document::new().add(shape);
        let mut registry = NodeRegistry::new();
        registry.sync(&document);
        let mut selection = Selection::new();
        selection.click(&id, false);
        let mut controller = TransformController::new();
        controller.attach(&selection, &registry, None);
        (document, registry, selection, controller)
    }

    fn rect() -> Shape {
        Shape::new(ShapeKind::Rect, 100.0, 100.0).with_id("r").with_size(100.0, 50.0)
    }

    #[test]
    fn test_attach_rules() {
        let (document, mut registry, mut selection, mut controller) = setup(rect());
        assert_eq!(controller.attached().map(String::as_str), Some("r"));
        assert_eq!(controller.handles(&registry).len(), 9);

        controller.attach(&selection, &registry, Some("r"));
        assert!(controller.attached().is_none());
        assert!(controller.handles(&registry).is_empty());

        registry.sync(&document.toggle_lock("r"));
        controller.attach(&selection, &registry, None);
        assert!(controller.attached().is_none());

        selection.clear();
        controller.attach(&selection, &registry, None);
        assert!(controller.attached().is_none());
    }

    #[test]
    fn test_handle_positions() {
        let (_, registry, _, controller) = setup(rect());
        let handles = controller.handles(&registry);
        let br = handles
            .iter()
            .find(|h| h.kind == HandleKind::Resize(Anchor::BottomRight))
            .unwrap();
        assert!((br.position.x - 200.0).abs() < 1e-9);
        assert!((br.position.y - 150.0).abs() < 1e-9);

        let rotate = handles.iter().find(|h| h.kind == HandleKind::Rotate).unwrap();
        assert!((rotate.position.x - 150.0).abs() < 1e-9);
        assert!((rotate.position.y - 75.0).abs() < 1e-9);

        assert_eq!(
            controller.hit_test_handles(&registry, Point::new(201.0, 151.0), HANDLE_HIT_TOLERANCE),
            Some(HandleKind::Resize(Anchor::BottomRight))
        );
    }

    #[test]
    fn test_resize_bottom_right_commits_scaled_size() {
        let (_, mut registry, _, mut controller) = setup(rect());
        let bottom_right = HandleKind::Resize(Anchor::BottomRight);
        assert!(controller.begin(bottom_right, Point::new(200.0, 150.0), &registry));
        controller.update(Point::new(300.0, 175.0), false, 15.0, &mut registry);

        let node = registry.get("r").unwrap();
        assert!((node.scale.x - 2.0).abs() < 1e-9);
        assert!((node.scale.y - 1.5).abs() < 1e-9);

        let commit = controller.end(&mut registry, 5.0).unwrap();
        assert!((commit.width - 200.0).abs() < 1e-9);
        assert!((commit.height - 75.0).abs() < 1e-9);
        assert!((commit.x - 100.0).abs() < 1e-9);
        assert!((commit.y - 100.0).abs() < 1e-9);
        assert_eq!(registry.get("r").unwrap().scale, Vec2::new(1.0, 1.0));
        assert!(!controller.is_active());
    }

    #[test]
    fn test_resize_top_left_moves_origin() {
        let (_, mut registry, _, mut controller) = setup(rect());
        controller.begin(HandleKind::Resize(Anchor::TopLeft), Point::new(100.0, 100.0), &registry);
        controller.update(Point::new(150.0, 90.0), false, 15.0, &mut registry);
        let commit = controller.end(&mut registry, 5.0).unwrap();
        assert!((commit.x - 150.0).abs() < 1e-9);
        assert!((commit.y - 90.0).abs() < 1e-9);
        assert!((commit.width - 50.0).abs() < 1e-9);
        assert!((commit.height - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_commit_respects_min_size() {
        let (_, mut registry, _, mut controller) = setup(rect());
        let middle_right = HandleKind::Resize(Anchor::MiddleRight);
        controller.begin(middle_right, Point::new(200.0, 125.0), &registry);
        controller.update(Point::new(0.0, 125.0), false, 15.0, &mut registry);
        let commit = controller.end(&mut registry, 5.0).unwrap();
        assert!((commit.width - 5.0).abs() < 1e-9);
        assert!((commit.height - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_about_center_with_snap() {
        let (_, mut registry, _, mut controller) = setup(rect());
        controller.begin(HandleKind::Rotate, Point::new(150.0, 75.0), &registry);
        // Pointer to the right of the centre (150, 125): a quarter turn, nudged.
        controller.update(Point::new(250.0, 131.0), true, 15.0, &mut registry);
        let commit = controller.end(&mut registry, 5.0).unwrap();
        assert!((commit.rotation - 90.0).abs() < 1e-9);

        let rotated = Shape {
            x: commit.x,
            y: commit.y,
            rotation: commit.rotation,
            ..rect()
        };
        let center = rotated.bounds().center();
        assert!((center.x - 150.0).abs() < 1e-9);
        assert!((center.y - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_without_snap_follows_pointer() {
        let (_, mut registry, _, mut controller) = setup(rect());
        controller.begin(HandleKind::Rotate, Point::new(150.0, 75.0), &registry);
        controller.update(Point::new(250.0, 131.0), false, 15.0, &mut registry);
        let rotation = registry.get("r").unwrap().rotation;
        assert!(rotation > 90.0 && rotation < 95.0);
    }

    #[test]
    fn test_end_without_begin() {
        let (_, mut registry, _, mut controller) = setup(rect());
        assert!(controller.end(&mut registry, 5.0).is_none());
    }
}
