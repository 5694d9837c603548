//! Shape registry: the ordered boxes of one image.
//!
//! Order is z-order. The last shape is drawn on top and is hit-tested first.

use std::collections::HashSet;

use crate::error::EditError;
use crate::geometry::{BoundingBox, Point, VertexIndex};
use crate::model::{Shape, ShapeId};

/// The part of a shape a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragHandle {
    /// A corner, used for resizing.
    Vertex(VertexIndex),
    /// The body of the box, used for moving.
    Whole,
}

/// Result of a hit-test against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub id: ShapeId,
    pub handle: DragHandle,
}

/// Storage for the shapes of a single image.
#[derive(Debug, Clone)]
pub struct ShapeRegistry {
    /// Shapes in z-order (last = topmost).
    shapes: Vec<Shape>,
    /// Counter for generating unique shape IDs.
    next_id: ShapeId,
    /// Dirty flag - set when shapes change, cleared by the renderer.
    dirty: bool,
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeRegistry {
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            next_id: 1,
            // Start dirty so the first frame is drawn
            dirty: true,
        }
    }

    /// Check if the registry has been modified since last clear_dirty().
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag. Call after redrawing.
    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Force a redraw without changing any shape (e.g. visibility toggles).
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Zero-area and non-finite boxes are rejected. Minimum sizes for user
    /// gestures are enforced by the canvas, not here.
    fn check_geometry(bbox: &BoundingBox) -> Result<(), EditError> {
        if bbox.is_degenerate(0.0) {
            Err(EditError::InvalidGeometry {
                width: bbox.width(),
                height: bbox.height(),
            })
        } else {
            Ok(())
        }
    }

    fn position(&self, id: ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| s.id == id)
    }

    /// Add a shape on top of the stack and return its ID.
    pub fn add(&mut self, label: impl Into<String>, bbox: BoundingBox) -> Result<ShapeId, EditError> {
        Self::check_geometry(&bbox)?;
        let id = self.next_id;
        self.next_id += 1;
        self.shapes.push(Shape::new(id, label, bbox));
        self.mark_dirty();
        Ok(id)
    }

    /// Remove a shape by ID.
    pub fn remove(&mut self, id: ShapeId) -> Result<Shape, EditError> {
        let idx = self.position(id).ok_or(EditError::NotFound(id))?;
        self.mark_dirty();
        Ok(self.shapes.remove(idx))
    }

    /// Remove every listed shape in one step.
    ///
    /// IDs that are not present are skipped. Returns the removed shapes with
    /// their former z-index, bottom to top, so the removal can be undone.
    pub fn remove_selected(&mut self, ids: &HashSet<ShapeId>) -> Vec<(usize, Shape)> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.shapes.len());
        for (idx, shape) in std::mem::take(&mut self.shapes).into_iter().enumerate() {
            if ids.contains(&shape.id) {
                removed.push((idx, shape));
            } else {
                kept.push(shape);
            }
        }
        self.shapes = kept;
        if !removed.is_empty() {
            self.mark_dirty();
        }
        removed
    }

    /// Get a shape by ID.
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Change the class label of a shape, returning the previous label.
    pub fn set_class(&mut self, id: ShapeId, label: impl Into<String>) -> Result<String, EditError> {
        let idx = self.position(id).ok_or(EditError::NotFound(id))?;
        let old = std::mem::replace(&mut self.shapes[idx].label, label.into());
        self.mark_dirty();
        Ok(old)
    }

    /// Replace the geometry of a shape, returning the previous geometry.
    pub fn set_geometry(&mut self, id: ShapeId, bbox: BoundingBox) -> Result<BoundingBox, EditError> {
        Self::check_geometry(&bbox)?;
        let idx = self.position(id).ok_or(EditError::NotFound(id))?;
        let old = std::mem::replace(&mut self.shapes[idx].bbox, bbox);
        if old != bbox {
            self.mark_dirty();
        }
        Ok(old)
    }

    /// Bring a shape to the top of the z-order.
    pub fn move_to_front(&mut self, id: ShapeId) -> Result<(), EditError> {
        let idx = self.position(id).ok_or(EditError::NotFound(id))?;
        if idx + 1 != self.shapes.len() {
            let shape = self.shapes.remove(idx);
            self.shapes.push(shape);
            self.mark_dirty();
        }
        Ok(())
    }

    /// Put a previously removed shape back at `index`, keeping its ID.
    ///
    /// Used by undo/redo. A shape whose ID is already present is ignored.
    pub fn restore(&mut self, index: usize, shape: Shape) {
        if self.position(shape.id).is_some() {
            log::warn!("Shape {} already present, not restoring", shape.id);
            return;
        }
        self.next_id = self.next_id.max(shape.id + 1);
        let index = index.min(self.shapes.len());
        self.shapes.insert(index, shape);
        self.mark_dirty();
    }

    /// Get all shapes in z-order.
    pub fn all(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.iter()
    }

    /// IDs in z-order.
    pub fn ids(&self) -> Vec<ShapeId> {
        self.shapes.iter().map(|s| s.id).collect()
    }

    /// Get the number of shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Check if there are no shapes.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Find what is under `point`, topmost shape first.
    ///
    /// Within a shape a corner within `tolerance` beats a body hit. Shapes for
    /// which `visible` returns false are ignored.
    pub fn hit_test(
        &self,
        point: &Point,
        tolerance: f64,
        visible: impl Fn(&Shape) -> bool,
    ) -> Option<Hit> {
        self.shapes
            .iter()
            .rev()
            .filter(|shape| visible(shape))
            .find_map(|shape| {
                if let Some(vertex) = shape.bbox.nearest_vertex(point, tolerance) {
                    Some(Hit {
                        id: shape.id,
                        handle: DragHandle::Vertex(vertex),
                    })
                } else if shape.bbox.contains_point(point, 0.0) {
                    Some(Hit {
                        id: shape.id,
                        handle: DragHandle::Whole,
                    })
                } else {
                    None
                }
            })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: f64, y: f64, w: f64, h: f64) -> BoundingBox {
        BoundingBox::new(x, y, w, h)
    }

    #[test]
    fn test_add_get_remove() {
        let mut registry = ShapeRegistry::new();
        let id1 = registry.add("car", bbox(10.0, 10.0, 50.0, 50.0)).unwrap();
        let id2 = registry.add("person", bbox(100.0, 100.0, 20.0, 40.0)).unwrap();

        assert_eq!(registry.len(), 2);
        assert_ne!(id1, id2);
        assert_eq!(registry.get(id1).unwrap().label, "car");

        registry.remove(id1).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get(id1).is_none());
        assert_eq!(registry.remove(id1), Err(EditError::NotFound(id1)));
    }

    #[test]
    fn test_add_rejects_degenerate() {
        let mut registry = ShapeRegistry::new();
        let err = registry.add("car", bbox(10.0, 10.0, 0.0, 50.0)).unwrap_err();
        assert!(matches!(err, EditError::InvalidGeometry { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut registry = ShapeRegistry::new();
        let id1 = registry.add("a", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();
        registry.remove(id1).unwrap();
        let id2 = registry.add("a", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_set_class_and_geometry() {
        let mut registry = ShapeRegistry::new();
        let id = registry.add("cat", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();

        assert_eq!(registry.set_class(id, "dog").unwrap(), "cat");
        assert_eq!(registry.get(id).unwrap().label, "dog");

        let old = registry.set_geometry(id, bbox(5.0, 5.0, 20.0, 20.0)).unwrap();
        assert_eq!(old, bbox(0.0, 0.0, 10.0, 10.0));
        assert!(registry.set_geometry(id, bbox(5.0, 5.0, 0.0, 20.0)).is_err());
        assert_eq!(registry.get(id).unwrap().bbox, bbox(5.0, 5.0, 20.0, 20.0));
        assert_eq!(registry.set_class(99, "x"), Err(EditError::NotFound(99)));
    }

    #[test]
    fn test_move_to_front() {
        let mut registry = ShapeRegistry::new();
        let a = registry.add("a", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();
        let b = registry.add("b", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();
        let c = registry.add("c", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();

        registry.move_to_front(a).unwrap();
        assert_eq!(registry.ids(), vec![b, c, a]);
        assert!(registry.move_to_front(42).is_err());
    }

    #[test]
    fn test_remove_selected_skips_stale_ids() {
        let mut registry = ShapeRegistry::new();
        let id1 = registry.add("a", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();
        let id2 = registry.add("b", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();
        let id3 = registry.add("c", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!((id1, id2, id3), (1, 2, 3));

        let selection: HashSet<ShapeId> = [2, 5].into_iter().collect();
        let removed = registry.remove_selected(&selection);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].0, 1);
        assert_eq!(removed[0].1.id, 2);
        assert_eq!(registry.ids(), vec![1, 3]);
    }

    #[test]
    fn test_restore_keeps_id_and_position() {
        let mut registry = ShapeRegistry::new();
        registry.add("a", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();
        let b = registry.add("b", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();
        registry.add("c", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();

        let shape = registry.remove(b).unwrap();
        registry.restore(1, shape.clone());
        assert_eq!(registry.ids(), vec![1, 2, 3]);

        // Restoring twice does not duplicate
        registry.restore(0, shape);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_hit_test_topmost_wins() {
        let mut registry = ShapeRegistry::new();
        let a = registry.add("a", bbox(0.0, 0.0, 100.0, 100.0)).unwrap();
        let b = registry.add("b", bbox(50.0, 50.0, 100.0, 100.0)).unwrap();

        let hit = registry.hit_test(&Point::new(75.0, 75.0), 4.0, |_| true).unwrap();
        assert_eq!(hit.id, b);
        assert_eq!(hit.handle, DragHandle::Whole);

        let hit = registry.hit_test(&Point::new(20.0, 20.0), 4.0, |_| true).unwrap();
        assert_eq!(hit.id, a);
        assert!(registry.hit_test(&Point::new(300.0, 300.0), 4.0, |_| true).is_none());
    }

    #[test]
    fn test_hit_test_vertex_beats_body() {
        let mut registry = ShapeRegistry::new();
        let a = registry.add("a", bbox(0.0, 0.0, 100.0, 100.0)).unwrap();

        let hit = registry.hit_test(&Point::new(98.0, 97.0), 4.0, |_| true).unwrap();
        assert_eq!(hit.id, a);
        assert_eq!(hit.handle, DragHandle::Vertex(VertexIndex::BottomRight));

        // Slightly outside the box but within tolerance of a corner
        let hit = registry.hit_test(&Point::new(-2.0, -2.0), 4.0, |_| true).unwrap();
        assert_eq!(hit.handle, DragHandle::Vertex(VertexIndex::TopLeft));
    }

    #[test]
    fn test_hit_test_skips_hidden() {
        let mut registry = ShapeRegistry::new();
        let a = registry.add("a", bbox(0.0, 0.0, 100.0, 100.0)).unwrap();
        registry.add("b", bbox(0.0, 0.0, 100.0, 100.0)).unwrap();

        let hit = registry
            .hit_test(&Point::new(50.0, 50.0), 4.0, |s| s.label != "b")
            .unwrap();
        assert_eq!(hit.id, a);
    }

    #[test]
    fn test_dirty_flag() {
        let mut registry = ShapeRegistry::new();
        assert!(registry.is_dirty());
        registry.clear_dirty();
        let id = registry.add("a", bbox(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert!(registry.is_dirty());
        registry.clear_dirty();
        registry.move_to_front(id).unwrap();
        assert!(!registry.is_dirty());
    }
}
