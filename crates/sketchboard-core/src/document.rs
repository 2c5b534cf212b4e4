//! The shape document and its pure mutation operations.
//!
//! A [`Document`] is an ordered list of shapes where list order is z-order
//! (index 0 is back-most). Every mutation takes `&self` and returns a new
//! document, leaving the receiver untouched so it can serve as a history
//! snapshot.

use crate::shapes::{Shape, ShapeId};
use kurbo::Vec2;
use serde::{Deserialize, Serialize};

/// Target of a z-order change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    /// Topmost.
    Front,
    /// Bottommost.
    Back,
}

/// An ordered collection of shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    shapes: Vec<Shape>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from shapes in back-to-front order.
    ///
    /// Later duplicates of an id are dropped.
    pub fn from_shapes(shapes: Vec<Shape>) -> Self {
        let mut unique: Vec<Shape> = Vec::with_capacity(shapes.len());
        for shape in shapes {
            if unique.iter().any(|s| s.id == shape.id) {
                log::warn!("Dropping shape with duplicate id {}", shape.id);
                continue;
            }
            unique.push(shape);
        }
        Self { shapes: unique }
    }

    /// Shapes in z-order (back to front).
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    /// Ids in z-order.
    pub fn ids(&self) -> Vec<ShapeId> {
        self.shapes.iter().map(|s| s.id.clone()).collect()
    }

    /// Get a shape by ID.
    pub fn get(&self, id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Z-index of a shape.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.shapes.iter().position(|s| s.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Append a shape on top. A shape whose id is already present is ignored.
    pub fn add(&self, shape: Shape) -> Self {
        if self.contains(&shape.id) {
            log::warn!("Ignoring add of existing shape {}", shape.id);
            return self.clone();
        }
        let mut shapes = self.shapes.clone();
        shapes.push(shape);
        Self { shapes }
    }

    /// Replace every mutable field of a shape. The id is kept.
    pub fn update(&self, id: &str, new_attrs: Shape) -> Self {
        let shapes = self
            .shapes
            .iter()
            .map(|s| {
                if s.id == id {
                    Shape {
                        id: s.id.clone(),
                        ..new_attrs.clone()
                    }
                } else {
                    s.clone()
                }
            })
            .collect();
        Self { shapes }
    }

    /// Apply an in-place edit to one shape of a copy of the document.
    pub fn update_with(&self, id: &str, edit: impl FnOnce(&mut Shape)) -> Self {
        let mut doc = self.clone();
        if let Some(shape) = doc.shapes.iter_mut().find(|s| s.id == id) {
            let original_id = shape.id.clone();
            edit(shape);
            shape.id = original_id;
        }
        doc
    }

    /// Remove a shape.
    pub fn remove(&self, id: &str) -> Self {
        let shapes = self.shapes.iter().filter(|s| s.id != id).cloned().collect();
        Self { shapes }
    }

    /// Remove several shapes at once.
    pub fn remove_many(&self, ids: &[ShapeId]) -> Self {
        let shapes = self
            .shapes
            .iter()
            .filter(|s| !ids.contains(&s.id))
            .cloned()
            .collect();
        Self { shapes }
    }

    /// Move a shape to the front or back of the z-order.
    pub fn reorder(&self, id: &str, to: ZOrder) -> Self {
        let Some(index) = self.index_of(id) else {
            return self.clone();
        };
        let mut shapes = self.shapes.clone();
        let shape = shapes.remove(index);
        match to {
            ZOrder::Front => shapes.push(shape),
            ZOrder::Back => shapes.insert(0, shape),
        }
        Self { shapes }
    }

    /// Clone a shape with a new id, offset by `offset`, on top of the stack.
    ///
    /// Returns the new document and the id of the copy.
    pub fn duplicate(&self, id: &str, offset: Vec2) -> (Self, Option<ShapeId>) {
        let Some(shape) = self.get(id) else {
            return (self.clone(), None);
        };
        let copy = shape.duplicate(offset);
        let copy_id = copy.id.clone();
        (self.add(copy), Some(copy_id))
    }

    /// Translate the given shapes by the same delta. Locked shapes stay put.
    pub fn translate(&self, ids: &[ShapeId], delta: Vec2) -> Self {
        let shapes = self
            .shapes
            .iter()
            .map(|s| {
                let mut s = s.clone();
                if !s.locked && ids.contains(&s.id) {
                    s.translate(delta);
                }
                s
            })
            .collect();
        Self { shapes }
    }

    /// Flip the lock flag of a shape.
    pub fn toggle_lock(&self, id: &str) -> Self {
        self.update_with(id, |s| s.locked = !s.locked)
    }

    /// An empty document.
    pub fn clear(&self) -> Self {
        Self::new()
    }

    /// Serialize the document to a JSON array of shape records.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize a document from a JSON array of shape records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let shapes: Vec<Shape> = serde_json::from_str(json)?;
        Ok(Self::from_shapes(shapes))
    }
}
