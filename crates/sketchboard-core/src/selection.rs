//! Selection state and the move gesture.

use crate::document::Document;
use crate::registry::NodeRegistry;
use crate::shapes::ShapeId;
use kurbo::{Point, Rect, Vec2};

/// The set of selected shape ids, in the order they were selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ShapeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a click on a shape.
    ///
    /// Without the multi-select modifier the selection becomes exactly `id`;
    /// with it, `id` is toggled.
    pub fn click(&mut self, id: &str, multi: bool) {
        if multi {
            self.toggle(id);
        } else {
            self.set(vec![id.to_string()]);
        }
    }

    /// Add or remove one id.
    pub fn toggle(&mut self, id: &str) {
        if let Some(index) = self.ids.iter().position(|s| s == id) {
            self.ids.remove(index);
        } else {
            self.ids.push(id.to_string());
        }
    }

    /// Replace the selection.
    pub fn set(&mut self, ids: Vec<ShapeId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Select every shape of the document.
    pub fn select_all(&mut self, document: &Document) {
        self.ids = document.ids();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Drop ids that are no longer in the document.
    pub fn prune(&mut self, document: &Document) {
        self.ids.retain(|id| document.contains(id));
    }

    /// Selected ids present in the document, in z-order.
    pub fn ids_in(&self, document: &Document) -> Vec<ShapeId> {
        document
            .iter()
            .filter(|s| self.is_selected(&s.id))
            .map(|s| s.id.clone())
            .collect()
    }

    /// The selected id when exactly one shape is selected.
    pub fn single(&self) -> Option<&ShapeId> {
        match self.ids.as_slice() {
            [id] => Some(id),
            _ => None,
        }
    }

    /// Union of the rendered boxes of the selected shapes.
    pub fn bounds(&self, registry: &NodeRegistry) -> Option<Rect> {
        self.ids
            .iter()
            .filter_map(|id| registry.client_rect(id))
            .reduce(|acc, r| acc.union(r))
    }
}

/// State for moving the selection with the pointer.
///
/// Only node drag offsets change while the pointer moves; the document is
/// translated once, on release.
#[derive(Debug, Clone)]
pub struct MoveGesture {
    /// Starting point of the drag.
    pub start_point: Point,
    /// Current point of the drag.
    pub current_point: Point,
    /// Draggable shapes being moved.
    ids: Vec<ShapeId>,
}

impl MoveGesture {
    /// Pick up every selected shape whose node is draggable.
    pub fn begin(
        start_point: Point,
        selected: &[ShapeId],
        registry: &NodeRegistry,
    ) -> Option<Self> {
        let ids: Vec<ShapeId> = selected
            .iter()
            .filter(|id| registry.get(id).is_some_and(|node| node.draggable()))
            .cloned()
            .collect();
        if ids.is_empty() {
            return None;
        }
        Some(Self {
            start_point,
            current_point: start_point,
            ids,
        })
    }

    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }

    pub fn shape_ids(&self) -> &[ShapeId] {
        &self.ids
    }

    /// Follow the pointer with the nodes.
    pub fn update(&mut self, point: Point, registry: &mut NodeRegistry) {
        self.current_point = point;
        registry.set_drag_offset(&self.ids, self.delta());
    }

    /// End the drag. Returns the shapes and delta to commit, if it moved.
    pub fn finish(
        mut self,
        point: Point,
        registry: &mut NodeRegistry,
    ) -> Option<(Vec<ShapeId>, Vec2)> {
        self.current_point = point;
        registry.set_drag_offset(&self.ids, Vec2::ZERO);
        let delta = self.delta();
        if delta == Vec2::ZERO {
            return None;
        }
        Some((self.ids, delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Shape, ShapeKind};

    fn doc() -> Document {
        ["a", "b", "c"].iter().fold(Document::new(), |doc, id| {
            doc.add(Shape::new(ShapeKind::Rect, 0.0, 0.0).with_id(*id).with_size(10.0, 10.0))
        })
    }

    #[test]
    fn test_click_replaces_selection() {
        let mut selection = Selection::new();
        selection.click("a", false);
        selection.click("b", false);
        assert!(!selection.is_selected("a"));
        assert!(selection.is_selected("b"));
    }

    #[test]
    fn test_multi_click_toggles() {
        let mut selection = Selection::new();
        selection.click("a", false);
        selection.click("b", true);
        assert_eq!(selection.len(), 2);
        selection.click("a", true);
        assert_eq!(selection.single().map(String::as_str), Some("b"));
    }

    #[test]
    fn test_stale_ids_dropped() {
        let document = doc();
        let mut selection = Selection::new();
        selection.set(vec!["c".into(), "a".into(), "gone".into()]);
        assert_eq!(selection.ids_in(&document), vec!["a", "c"]);

        selection.prune(&document.remove("a"));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_bounds_union() {
        let document = Document::new()
            .add(Shape::new(ShapeKind::Rect, 0.0, 0.0).with_id("a").with_size(10.0, 10.0))
            .add(Shape::new(ShapeKind::Rect, 20.0, 30.0).with_id("b").with_size(10.0, 10.0));
        let mut registry = NodeRegistry::new();
        registry.sync(&document);
        let mut selection = Selection::new();
        assert!(selection.bounds(&registry).is_none());

        selection.select_all(&document);
        let bounds = selection.bounds(&registry).unwrap();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 30.0, 40.0));
    }

    #[test]
    fn test_move_gesture_skips_locked() {
        let document = doc().toggle_lock("b");
        let mut registry = NodeRegistry::new();
        registry.sync(&document);

        let selected = document.ids();
        let mut gesture = MoveGesture::begin(Point::ZERO, &selected, &registry).unwrap();
        assert_eq!(gesture.shape_ids(), ["a", "c"]);

        gesture.update(Point::new(5.0, 5.0), &mut registry);
        assert_eq!(registry.get("a").unwrap().drag_offset, Vec2::new(5.0, 5.0));
        assert_eq!(registry.get("b").unwrap().drag_offset, Vec2::ZERO);

        let (ids, delta) = gesture.finish(Point::new(10.0, 0.0), &mut registry).unwrap();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(delta, Vec2::new(10.0, 0.0));
        assert_eq!(registry.get("a").unwrap().drag_offset, Vec2::ZERO);
    }

    #[test]
    fn test_move_gesture_without_movement() {
        let document = doc();
        let mut registry = NodeRegistry::new();
        registry.sync(&document);
        let gesture = MoveGesture::begin(Point::ZERO, &document.ids(), &registry).unwrap();
        assert!(gesture.finish(Point::ZERO, &mut registry).is_none());
    }

    #[test]
    fn test_move_gesture_needs_a_draggable_node() {
        let document = doc().toggle_lock("a");
        let mut registry = NodeRegistry::new();
        registry.sync(&document);
        assert!(MoveGesture::begin(Point::ZERO, &["a".to_string()], &registry).is_none());
    }
}
