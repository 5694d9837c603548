//! Error types for label persistence.

use thiserror::Error;

/// Errors that can occur while reading or writing label files.
///
/// Any of these aborts the whole load or save; no partial result is produced.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image header could not be read to obtain pixel dimensions
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// A shape's class label is not in the class table
    #[error("Unknown class '{label}': not present in the class table")]
    UnknownClass {
        /// The label that could not be mapped to an index
        label: String,
    },

    /// A label line refers to a class index past the end of the table
    #[error("Line {line}: class index {index} out of range for {len} class(es)")]
    ClassIndexOutOfRange {
        /// 1-based line number
        line: usize,
        /// The offending class index
        index: usize,
        /// Number of entries in the class table
        len: usize,
    },

    /// A label line could not be parsed
    #[error("Line {line}: malformed label '{content}': {reason}")]
    MalformedLine {
        /// 1-based line number
        line: usize,
        /// The raw line text
        content: String,
        /// What was wrong with it
        reason: String,
    },

    /// Image dimensions must be positive to (de)normalize coordinates
    #[error("Invalid image dimensions {width}x{height}")]
    InvalidDimensions {
        /// Image width in pixels
        width: u32,
        /// Image height in pixels
        height: u32,
    },
}

impl FormatError {
    /// Create a malformed line error.
    pub fn malformed(line: usize, content: &str, reason: impl Into<String>) -> Self {
        Self::MalformedLine {
            line,
            content: content.to_string(),
            reason: reason.into(),
        }
    }
}
