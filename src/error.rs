//! Errors for in-memory shape edits.

use thiserror::Error;

use crate::model::ShapeId;

/// Errors raised by registry mutations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    /// Box has zero area or non-finite coordinates
    #[error("Invalid geometry: box is degenerate ({width:.2} x {height:.2})")]
    InvalidGeometry {
        /// Width of the rejected box
        width: f64,
        /// Height of the rejected box
        height: f64,
    },

    /// No shape with this id in the registry
    #[error("Shape not found: {0}")]
    NotFound(ShapeId),
}
