//! Labeled box shapes owned by a registry.

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// Unique identifier for a shape within one registry.
pub type ShapeId = u64;

/// Minimum size (width/height) for a valid bounding box, in image pixels.
pub const MIN_BBOX_SIZE: f64 = 1.0;

/// Radius around a corner that still grabs it for resizing (in image pixels).
pub const HANDLE_HIT_RADIUS: f64 = 8.0;

/// A box annotation with its class label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Stable identifier, never reused within a registry.
    pub id: ShapeId,
    /// Class name; must exist in the class table when saved.
    pub label: String,
    /// Geometry in image pixels.
    pub bbox: BoundingBox,
}

impl Shape {
    /// Create a new shape with the given id, label and geometry.
    pub fn new(id: ShapeId, label: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            id,
            label: label.into(),
            bbox,
        }
    }

    /// Same label and geometry, ignoring identity.
    pub fn same_content(&self, other: &Shape) -> bool {
        self.label == other.label && self.bbox.approx_eq(&other.bbox, 1e-6)
    }
}
