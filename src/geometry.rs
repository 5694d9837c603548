//! Bounding box geometry.
//!
//! All coordinates are image pixels. Every operation here is pure: edits return a
//! new [`BoundingBox`] and leave the input untouched, so the canvas can compute a
//! candidate geometry, inspect it, and only then write it back to the registry.

use serde::{Deserialize, Serialize};

// ============================================================================
// Point
// ============================================================================

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Component-wise difference `self - other`.
    pub fn offset_from(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    /// Clamp into the rectangle `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: f64, height: f64) -> Point {
        Point::new(self.x.clamp(0.0, width), self.y.clamp(0.0, height))
    }
}

// ============================================================================
// Vertex handles
// ============================================================================

/// One of the four corners of a box, in fixed winding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VertexIndex {
    TopLeft = 0,
    TopRight = 1,
    BottomRight = 2,
    BottomLeft = 3,
}

impl VertexIndex {
    /// All vertices in winding order.
    pub const ALL: [VertexIndex; 4] = [
        VertexIndex::TopLeft,
        VertexIndex::TopRight,
        VertexIndex::BottomRight,
        VertexIndex::BottomLeft,
    ];

    /// Position in the winding order (0..4).
    pub fn index(self) -> usize {
        self as usize
    }

    /// The diagonally opposite corner, which stays fixed during a resize.
    pub fn opposite(self) -> VertexIndex {
        VertexIndex::ALL[(self.index() + 2) % 4]
    }

    fn is_left(self) -> bool {
        matches!(self, VertexIndex::TopLeft | VertexIndex::BottomLeft)
    }

    fn is_top(self) -> bool {
        matches!(self, VertexIndex::TopLeft | VertexIndex::TopRight)
    }
}

// ============================================================================
// BoundingBox
// ============================================================================

/// An axis-aligned bounding box stored as its top-left and bottom-right corners.
///
/// Construction always normalizes the corners, so `min.x <= max.x` and
/// `min.y <= max.y` hold for every value of this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    min: Point,
    max: Point,
}

impl BoundingBox {
    /// Create a box from its top-left corner and size. Negative sizes are flipped.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_corners(Point::new(x, y), Point::new(x + width, y + height))
    }

    /// Create a bounding box from two opposite corner points, in any order.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self {
            min: Point::new(p1.x.min(p2.x), p1.y.min(p2.y)),
            max: Point::new(p1.x.max(p2.x), p1.y.max(p2.y)),
        }
    }

    /// Create a box from its center point and size.
    pub fn from_center_size(center: Point, width: f64, height: f64) -> Self {
        let hw = width.abs() / 2.0;
        let hh = height.abs() / 2.0;
        Self {
            min: Point::new(center.x - hw, center.y - hh),
            max: Point::new(center.x + hw, center.y + hh),
        }
    }

    pub fn top_left(&self) -> Point {
        self.min
    }

    pub fn bottom_right(&self) -> Point {
        self.max
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Get the center point of the box.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Position of a single corner.
    pub fn vertex(&self, vertex: VertexIndex) -> Point {
        match vertex {
            VertexIndex::TopLeft => self.min,
            VertexIndex::TopRight => Point::new(self.max.x, self.min.y),
            VertexIndex::BottomRight => self.max,
            VertexIndex::BottomLeft => Point::new(self.min.x, self.max.y),
        }
    }

    /// The four corners in winding order: TL, TR, BR, BL.
    pub fn corners(&self) -> [Point; 4] {
        VertexIndex::ALL.map(|v| self.vertex(v))
    }

    /// Get the area of the box.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// True when either side is shorter than `min_size` or the area is zero.
    pub fn is_degenerate(&self, min_size: f64) -> bool {
        let w = self.width();
        let h = self.height();
        !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 || w < min_size || h < min_size
    }

    /// Check if a point is inside the box, grown by `tolerance` on every side.
    pub fn contains_point(&self, point: &Point, tolerance: f64) -> bool {
        point.x >= self.min.x - tolerance
            && point.x <= self.max.x + tolerance
            && point.y >= self.min.y - tolerance
            && point.y <= self.max.y + tolerance
    }

    /// Closest corner within `tolerance` pixels of `point`.
    ///
    /// Equidistant corners resolve to the smallest [`VertexIndex`].
    pub fn nearest_vertex(&self, point: &Point, tolerance: f64) -> Option<VertexIndex> {
        let mut best: Option<(VertexIndex, f64)> = None;
        for vertex in VertexIndex::ALL {
            let d = self.vertex(vertex).distance_to(point);
            if d > tolerance {
                continue;
            }
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((vertex, d)),
            }
        }
        best.map(|(v, _)| v)
    }

    /// Shift the whole box by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> BoundingBox {
        Self {
            min: Point::new(self.min.x + dx, self.min.y + dy),
            max: Point::new(self.max.x + dx, self.max.y + dy),
        }
    }

    /// Shift the box by `(dx, dy)`, reducing the shift so the box stays inside
    /// `[0, width] x [0, height]`. A box larger than the bounds is pinned to the
    /// top-left edge.
    pub fn translate_within(&self, dx: f64, dy: f64, width: f64, height: f64) -> BoundingBox {
        let dx = dx.clamp(-self.min.x, (width - self.max.x).max(-self.min.x));
        let dy = dy.clamp(-self.min.y, (height - self.max.y).max(-self.min.y));
        self.translate(dx, dy)
    }

    /// Move `vertex` to `(new_x, new_y)` keeping the opposite corner fixed.
    ///
    /// The moved corner is clamped so neither side drops below `min_size`; it can
    /// never cross over the fixed corner. If the result would still be degenerate
    /// the original box is returned unchanged.
    pub fn resize_corner(
        &self,
        vertex: VertexIndex,
        new_x: f64,
        new_y: f64,
        min_size: f64,
    ) -> BoundingBox {
        if !(new_x.is_finite() && new_y.is_finite()) {
            return *self;
        }
        let anchor = self.vertex(vertex.opposite());
        let min_size = min_size.max(0.0);

        let x = if vertex.is_left() {
            new_x.min(anchor.x - min_size)
        } else {
            new_x.max(anchor.x + min_size)
        };
        let y = if vertex.is_top() {
            new_y.min(anchor.y - min_size)
        } else {
            new_y.max(anchor.y + min_size)
        };

        let resized = BoundingBox::from_corners(anchor, Point::new(x, y));
        // Clamping above lands exactly on min_size up to rounding.
        if resized.is_degenerate(min_size * (1.0 - 1e-9)) {
            *self
        } else {
            resized
        }
    }

    /// Intersect with `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: f64, height: f64) -> BoundingBox {
        Self {
            min: self.min.clamp_to(width, height),
            max: self.max.clamp_to(width, height),
        }
    }

    /// Equality within `epsilon` on every coordinate.
    pub fn approx_eq(&self, other: &BoundingBox, epsilon: f64) -> bool {
        (self.min.x - other.min.x).abs() <= epsilon
            && (self.min.y - other.min.y).abs() <= epsilon
            && (self.max.x - other.max.x).abs() <= epsilon
            && (self.max.y - other.max.y).abs() <= epsilon
    }
}

// ============================================================================
// Tests
// ============================================================================
