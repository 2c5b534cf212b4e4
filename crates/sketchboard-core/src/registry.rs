//! Live render handles for the shapes of the current document.
//!
//! The registry mirrors the document as a set of [`ShapeNode`]s. Gestures
//! mutate nodes (drag offset, scale, rotation) for live feedback; the document
//! only changes when a gesture commits, after which [`NodeRegistry::sync`]
//! resets every node to its record.

use crate::document::Document;
use crate::shapes::{Shape, ShapeId, ShapeKind};
use crate::stage::Stage;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use peniko::Color;
use std::collections::HashMap;

/// Opacity of a node while its text is being edited in the overlay.
pub const EDITING_OPACITY: f64 = 0.2;

/// Load state of an image node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageStatus {
    /// Waiting for the shell; nothing is drawn.
    Loading,
    /// Raster available at its natural size.
    Loaded(Size),
    /// The reference could not be loaded; nothing is drawn.
    Failed,
}

/// Render handle of one shape.
#[derive(Debug, Clone)]
pub struct ShapeNode {
    /// Record the node was last synced from.
    shape: Shape,
    /// Node origin in canvas coordinates.
    pub position: Point,
    /// Rotation in degrees.
    pub rotation: f64,
    /// In-flight scale of a resize gesture. `(1, 1)` at rest.
    pub scale: Vec2,
    /// In-flight offset of a move gesture.
    pub drag_offset: Vec2,
    /// Draw opacity.
    pub opacity: f64,
    /// Whether the node receives pointer events.
    pub listening: bool,
    /// Set while the node's text is edited in the overlay.
    pub dimmed: bool,
    pub fill: Color,
    pub stroke: Color,
    pub image: Option<ImageStatus>,
}

impl ShapeNode {
    /// Create a node at rest for a shape.
    pub fn new(shape: &Shape) -> Self {
        let image = shape.as_image().map(|_| ImageStatus::Loading);
        let mut node = Self {
            shape: shape.clone(),
            position: shape.position(),
            rotation: shape.rotation,
            scale: Vec2::new(1.0, 1.0),
            drag_offset: Vec2::ZERO,
            opacity: shape.style.opacity,
            listening: true,
            dimmed: false,
            fill: Color::BLACK,
            stroke: Color::BLACK,
            image,
        };
        node.apply_record();
        node
    }

    pub fn id(&self) -> &ShapeId {
        &self.shape.id
    }

    /// The record the node mirrors.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn locked(&self) -> bool {
        self.shape.locked
    }

    /// Whether a move gesture may pick this node up.
    pub fn draggable(&self) -> bool {
        self.listening && !self.shape.locked
    }

    /// Whether anything is drawn for this node.
    pub fn is_visible(&self) -> bool {
        !matches!(self.image, Some(ImageStatus::Loading | ImageStatus::Failed))
    }

    /// Re-sync from a (possibly changed) record, dropping in-flight state.
    fn sync(&mut self, shape: &Shape) {
        let src_changed = self.shape.as_image().map(|i| &i.src) != shape.as_image().map(|i| &i.src);
        self.shape = shape.clone();
        if src_changed {
            self.image = shape.as_image().map(|_| ImageStatus::Loading);
        }
        self.apply_record();
    }

    fn apply_record(&mut self) {
        self.position = self.shape.position();
        self.rotation = self.shape.rotation;
        self.scale = Vec2::new(1.0, 1.0);
        self.drag_offset = Vec2::ZERO;
        self.fill = self.shape.style.fill_with_opacity();
        self.stroke = self.shape.style.stroke_with_opacity();
        self.set_dimmed(self.dimmed);
    }

    /// Dim the node and stop it listening, or undo that.
    pub fn set_dimmed(&mut self, dimmed: bool) {
        self.dimmed = dimmed;
        self.listening = !dimmed;
        self.opacity = if dimmed { EDITING_OPACITY } else { self.shape.style.opacity };
    }

    /// Absolute origin, including any drag offset.
    pub fn absolute_position(&self) -> Point {
        self.position + self.drag_offset
    }

    /// Offset from the origin to the top-left of the local box. Non-zero for
    /// ellipses, which are drawn around their origin.
    pub fn offset(&self) -> Vec2 {
        -self.rendered().local_bounds().origin().to_vec2()
    }

    /// Size as currently drawn, in-flight scale included.
    pub fn rendered_size(&self) -> Size {
        Size::new(
            self.shape.width * self.scale.x.abs(),
            self.shape.height * self.scale.y.abs(),
        )
    }

    /// Local-to-canvas transform as currently drawn.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.absolute_position().to_vec2())
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
    }

    /// Axis-aligned bounding box as currently drawn.
    pub fn client_rect(&self) -> Rect {
        self.rendered().bounds()
    }

    /// Hit-test a canvas point against the node as drawn. Images that are
    /// not loaded are tested against their placeholder box.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.listening && self.rendered().hit_test(point, tolerance)
    }

    /// The record with the node's in-flight geometry folded in.
    fn rendered(&self) -> Shape {
        let size = self.rendered_size();
        let origin = self.absolute_position();
        Shape {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            rotation: self.rotation,
            ..self.shape.clone()
        }
    }
}

/// Map from shape id to its render handle, in document z-order.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: HashMap<ShapeId, ShapeNode>,
    order: Vec<ShapeId>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a node for a shape, replacing an existing one.
    pub fn mount(&mut self, shape: &Shape) {
        if !self.nodes.contains_key(&shape.id) {
            self.order.push(shape.id.clone());
        }
        self.nodes.insert(shape.id.clone(), ShapeNode::new(shape));
    }

    pub fn unmount(&mut self, id: &str) -> Option<ShapeNode> {
        self.order.retain(|o| o != id);
        self.nodes.remove(id)
    }

    /// Bring the registry in line with a document.
    ///
    /// Missing shapes are unmounted, new ones mounted, and existing nodes reset
    /// to their records. Dim state and image load state survive.
    pub fn sync(&mut self, document: &Document) {
        self.nodes.retain(|id, _| document.contains(id));
        for shape in document.iter() {
            match self.nodes.get_mut(&shape.id) {
                Some(node) => node.sync(shape),
                None => {
                    log::trace!("Mounting node for {}", shape.id);
                    self.nodes.insert(shape.id.clone(), ShapeNode::new(shape));
                }
            }
        }
        self.order = document.ids();
    }

    pub fn get(&self, id: &str) -> Option<&ShapeNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ShapeNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes back to front.
    pub fn iter(&self) -> impl Iterator<Item = &ShapeNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Rendered bounding box of a node.
    pub fn client_rect(&self, id: &str) -> Option<Rect> {
        self.get(id).map(ShapeNode::client_rect)
    }

    /// Page position of a node's origin.
    pub fn absolute_position(&self, id: &str, stage: &Stage) -> Option<Point> {
        self.get(id).map(|node| stage.world_to_page(node.absolute_position()))
    }

    /// Top-most listening node under a canvas point.
    pub fn node_at(&self, point: Point, tolerance: f64) -> Option<&ShapeNode> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.nodes.get(id))
            .find(|node| node.hit_test(point, tolerance))
    }

    /// Offset the given nodes for live drag feedback.
    pub fn set_drag_offset(&mut self, ids: &[ShapeId], delta: Vec2) {
        for id in ids {
            if let Some(node) = self.nodes.get_mut(id) {
                node.drag_offset = delta;
            }
        }
    }

    /// Dim exactly one node (or none) for text editing.
    pub fn set_editing(&mut self, id: Option<&str>) {
        for node in self.nodes.values_mut() {
            let dimmed = Some(node.id().as_str()) == id;
            if node.dimmed != dimmed {
                node.set_dimmed(dimmed);
            }
        }
    }

    /// Mark every image node with `src` as loaded. Returns the affected ids.
    pub fn image_loaded(&mut self, src: &str, natural: Size) -> Vec<ShapeId> {
        self.set_image_status(src, ImageStatus::Loaded(natural))
    }

    /// Mark every image node with `src` as failed. Returns the affected ids.
    pub fn image_failed(&mut self, src: &str) -> Vec<ShapeId> {
        log::warn!("Image failed to load: {src}");
        self.set_image_status(src, ImageStatus::Failed)
    }

    fn set_image_status(&mut self, src: &str, status: ImageStatus) -> Vec<ShapeId> {
        let mut affected = Vec::new();
        for id in &self.order {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            if matches!(&node.shape.kind, ShapeKind::Image(img) if img.src == src) {
                node.image = Some(status);
                affected.push(id.clone());
            }
        }
        affected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ImageProps;

    fn rect(id: &str, x: f64, y: f64) -> Shape {
        Shape::new(ShapeKind::Rect, x, y).with_id(id).with_size(100.0, 100.0)
    }

    fn registry_for(doc: &Document) -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.sync(doc);
        registry
    }

    #[test]
    fn test_sync_mounts_and_unmounts() {
        let doc = Document::new().add(rect("a", 0.0, 0.0)).add(rect("b", 0.0, 0.0));
        let mut registry = registry_for(&doc);
        assert_eq!(registry.len(), 2);

        registry.sync(&doc.remove("a"));
        assert!(!registry.contains("a"));
        assert!(registry.contains("b"));
    }

    #[test]
    fn test_node_at_prefers_topmost() {
        let doc = Document::new().add(rect("a", 0.0, 0.0)).add(rect("b", 50.0, 50.0));
        let registry = registry_for(&doc);
        let hit = registry.node_at(Point::new(75.0, 75.0), 0.0).unwrap();
        assert_eq!(hit.id(), "b");
        assert!(registry.node_at(Point::new(500.0, 500.0), 0.0).is_none());
    }

    #[test]
    fn test_dimmed_node_is_not_hit() {
        let doc = Document::new().add(rect("a", 0.0, 0.0)).add(rect("b", 50.0, 50.0));
        let mut registry = registry_for(&doc);
        registry.set_editing(Some("b"));
        let node = registry.get("b").unwrap();
        assert!((node.opacity - EDITING_OPACITY).abs() < f64::EPSILON);
        assert!(!node.listening);
        assert_eq!(registry.node_at(Point::new(75.0, 75.0), 0.0).unwrap().id(), "a");

        registry.set_editing(None);
        assert!(registry.get("b").unwrap().listening);
    }

    #[test]
    fn test_client_rect_includes_scale_and_drag() {
        let doc = Document::new().add(rect("a", 10.0, 10.0));
        let mut registry = registry_for(&doc);
        {
            let node = registry.get_mut("a").unwrap();
            node.scale = Vec2::new(2.0, 0.5);
        }
        registry.set_drag_offset(&["a".to_string()], Vec2::new(5.0, 0.0));
        let rect = registry.client_rect("a").unwrap();
        assert!((rect.x0 - 15.0).abs() < 1e-9);
        assert!((rect.width() - 200.0).abs() < 1e-9);
        assert!((rect.height() - 50.0).abs() < 1e-9);

        registry.sync(&doc);
        let rect = registry.client_rect("a").unwrap();
        assert!((rect.width() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_absolute_position_uses_stage() {
        let doc = Document::new().add(rect("a", 10.0, 20.0));
        let registry = registry_for(&doc);
        let mut stage = Stage::new();
        stage.set_container_origin(Point::new(100.0, 100.0));
        let pos = registry.absolute_position("a", &stage).unwrap();
        assert!((pos.x - 110.0).abs() < 1e-9);
        assert!((pos.y - 120.0).abs() < 1e-9);
        assert!(registry.absolute_position("missing", &stage).is_none());
    }

    #[test]
    fn test_image_lifecycle() {
        let image = Shape::new(ShapeKind::Image(ImageProps::new("cat.png")), 0.0, 0.0)
            .with_id("img");
        let doc = Document::new().add(image);
        let mut registry = registry_for(&doc);
        let node = registry.get("img").unwrap();
        assert_eq!(node.image, Some(ImageStatus::Loading));
        assert!(!node.is_visible());
        // The placeholder box is still hittable.
        assert!(registry.node_at(Point::new(10.0, 10.0), 0.0).is_some());

        let affected = registry.image_loaded("cat.png", Size::new(64.0, 64.0));
        assert_eq!(affected, vec!["img"]);
        assert!(registry.get("img").unwrap().is_visible());

        // Sync keeps the loaded state while the src is unchanged.
        registry.sync(&doc);
        assert!(registry.get("img").unwrap().is_visible());

        registry.image_failed("cat.png");
        assert!(!registry.get("img").unwrap().is_visible());
        assert!(registry.node_at(Point::new(10.0, 10.0), 0.0).is_some());
    }

    #[test]
    fn test_ellipse_offset() {
        let ellipse = Shape::new(ShapeKind::Ellipse, 50.0, 50.0).with_id("e").with_size(40.0, 20.0);
        let registry = registry_for(&Document::new().add(ellipse));
        let offset = registry.get("e").unwrap().offset();
        assert!((offset.x - 20.0).abs() < 1e-9);
        assert!((offset.y - 10.0).abs() < 1e-9);
    }
}
