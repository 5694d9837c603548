//! bboxed - bounding-box annotation engine
//!
//! The core of an interactive box-labeling tool for object-detection training
//! data. A GUI shell translates device input into image pixel coordinates and
//! feeds [`CanvasEvent`]s to an [`AnnotationDocument`]; the document keeps the
//! shapes of one image, records undo history and returns a [`Frame`] of
//! colored boxes to paint. Labels are stored in the normalized YOLO text
//! format next to each image.

pub mod canvas;
pub mod color_utils;
pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod geometry;
pub mod model;
pub mod palette;
pub mod registry;
pub mod undo;

pub use canvas::{Canvas, CanvasEvent, CanvasSettings, InteractionState, Modifiers};
pub use config::{ConfigError, EngineConfig};
pub use document::{AnnotationDocument, Clipboard, Frame, RenderItem};
pub use error::EditError;
pub use format::FormatError;
pub use geometry::{BoundingBox, Point, VertexIndex};
pub use model::{ClassTable, Shape, ShapeId};
pub use palette::{Palette, Rgb};
pub use registry::{DragHandle, Hit, ShapeRegistry};
pub use undo::{Command, UndoStack};
