//! Label persistence.
//!
//! Shapes are edited in pixel coordinates and stored in the normalized,
//! resolution-independent YOLO text format:
//!
//! ```text
//! <class index> <center x> <center y> <width> <height>
//! ```
//!
//! with the four coordinates divided by the image width/height and written
//! with six decimal places. `classes.txt` in the same directory maps class
//! indices to names.

mod error;
pub mod formats;

pub use error::FormatError;
pub use formats::yolo::{
    CLASSES_FILENAME, COORD_PRECISION, label_path_for, load, read_classes, read_label_file, save,
    write_label_file,
};
