//! Data models for labeled shapes and the class table.

mod class_table;
mod shape;

pub use class_table::ClassTable;
pub use shape::{HANDLE_HIT_RADIUS, MIN_BBOX_SIZE, Shape, ShapeId};
