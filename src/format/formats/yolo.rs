//! YOLO TXT format implementation.
//!
//! One text file per image, same basename, one box per line:
//! `<class index> <cx> <cy> <w> <h>` with coordinates normalized by the image
//! size. Class indices refer to the ordered `classes.txt` table.

use std::path::{Path, PathBuf};

use crate::format::error::FormatError;
use crate::geometry::{BoundingBox, Point};
use crate::model::ClassTable;
use crate::registry::ShapeRegistry;

/// Name of the class table file that sits next to the images.
pub const CLASSES_FILENAME: &str = "classes.txt";

/// Decimal places written for each normalized coordinate.
pub const COORD_PRECISION: usize = 6;

fn check_dimensions(width: u32, height: u32) -> Result<(f64, f64), FormatError> {
    if width == 0 || height == 0 {
        return Err(FormatError::InvalidDimensions { width, height });
    }
    Ok((width as f64, height as f64))
}

/// Serialize every shape in z-order.
///
/// Fails with [`FormatError::UnknownClass`] on the first shape whose label is
/// not in `classes`; nothing is produced in that case.
pub fn save(
    registry: &ShapeRegistry,
    classes: &ClassTable,
    image_width: u32,
    image_height: u32,
) -> Result<String, FormatError> {
    let (width, height) = check_dimensions(image_width, image_height)?;

    let mut lines = Vec::with_capacity(registry.len());
    for shape in registry.all() {
        let class_idx = classes
            .index_of(&shape.label)
            .ok_or_else(|| FormatError::UnknownClass {
                label: shape.label.clone(),
            })?;

        // YOLO uses center coordinates, normalized to [0, 1]
        let center = shape.bbox.center();
        let cx = center.x / width;
        let cy = center.y / height;
        let nw = shape.bbox.width() / width;
        let nh = shape.bbox.height() / height;

        lines.push(format!(
            "{} {:.prec$} {:.prec$} {:.prec$} {:.prec$}",
            class_idx,
            cx,
            cy,
            nw,
            nh,
            prec = COORD_PRECISION
        ));
    }

    log::info!(
        "Encoded {} box(es) for a {}x{} image",
        lines.len(),
        image_width,
        image_height
    );

    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    Ok(text)
}

/// Parse label text into a fresh registry, ids assigned in line order.
///
/// All-or-nothing: the first bad line aborts with an error that names it.
/// Blank lines are ignored. Coordinates that fall outside the image are
/// clamped back into it.
pub fn load(
    text: &str,
    classes: &ClassTable,
    image_width: u32,
    image_height: u32,
) -> Result<ShapeRegistry, FormatError> {
    let (width, height) = check_dimensions(image_width, image_height)?;

    let mut registry = ShapeRegistry::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let parsed = parse_yolo_line(line, line_no)?;
        let label = classes
            .name(parsed.class_idx)
            .ok_or(FormatError::ClassIndexOutOfRange {
                line: line_no,
                index: parsed.class_idx,
                len: classes.len(),
            })?;

        let center = Point::new(parsed.cx * width, parsed.cy * height);
        let bbox = BoundingBox::from_center_size(center, parsed.w * width, parsed.h * height)
            .clamp_to(width, height);

        registry
            .add(label, bbox)
            .map_err(|e| FormatError::malformed(line_no, line, e.to_string()))?;
    }

    log::info!(
        "Decoded {} box(es) for a {}x{} image",
        registry.len(),
        image_width,
        image_height
    );

    Ok(registry)
}

/// One parsed label line, still normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
struct YoloLine {
    class_idx: usize,
    cx: f64,
    cy: f64,
    w: f64,
    h: f64,
}

/// Parse a single YOLO annotation line.
fn parse_yolo_line(line: &str, line_no: usize) -> Result<YoloLine, FormatError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 5 {
        return Err(FormatError::malformed(
            line_no,
            line,
            format!("expected 5 fields, found {}", parts.len()),
        ));
    }

    let class_idx: usize = parts[0].parse().map_err(|_| {
        FormatError::malformed(line_no, line, format!("invalid class index '{}'", parts[0]))
    })?;

    let mut coords = [0.0f64; 4];
    for (slot, part) in coords.iter_mut().zip(&parts[1..]) {
        let value: f64 = part.parse().map_err(|_| {
            FormatError::malformed(line_no, line, format!("invalid number '{}'", part))
        })?;
        if !value.is_finite() {
            return Err(FormatError::malformed(
                line_no,
                line,
                format!("non-finite value '{}'", part),
            ));
        }
        *slot = value;
    }
    let [cx, cy, w, h] = coords;

    Ok(YoloLine {
        class_idx,
        cx,
        cy,
        w,
        h,
    })
}

// ============================================================================
// File Helpers
// ============================================================================

/// Label file path for an image: same directory, same stem, `.txt`.
pub fn label_path_for(image_path: &Path) -> PathBuf {
    image_path.with_extension("txt")
}

/// Read a class table file.
pub fn read_classes(path: &Path) -> Result<ClassTable, FormatError> {
    let content = std::fs::read_to_string(path)?;
    let table = ClassTable::parse(&content);
    log::debug!("Read {} class(es) from {:?}", table.len(), path);
    Ok(table)
}

/// Load the label file at `path`. A missing file yields an empty registry.
pub fn read_label_file(
    path: &Path,
    classes: &ClassTable,
    image_width: u32,
    image_height: u32,
) -> Result<ShapeRegistry, FormatError> {
    if !path.exists() {
        log::debug!("No label file at {:?}", path);
        check_dimensions(image_width, image_height)?;
        return Ok(ShapeRegistry::new());
    }
    let content = std::fs::read_to_string(path)?;
    load(&content, classes, image_width, image_height)
}

/// Encode `registry` and write it to `path`.
///
/// Encoding happens before the file is touched, so an encoding failure
/// leaves any existing file intact.
pub fn write_label_file(
    path: &Path,
    registry: &ShapeRegistry,
    classes: &ClassTable,
    image_width: u32,
    image_height: u32,
) -> Result<(), FormatError> {
    let text = save(registry, classes, image_width, image_height)?;
    std::fs::write(path, text)?;
    log::info!("Saved {} box(es) to {:?}", registry.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yolo_line() {
        let parsed = parse_yolo_line("0 0.5 0.5 0.2 0.3", 1).unwrap();
        assert_eq!(parsed.class_idx, 0);
        assert!((parsed.cx - 0.5).abs() < 1e-12);
        assert!((parsed.w - 0.2).abs() < 1e-12);
        assert!((parsed.h - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_parse_yolo_line_rejects_bad_input() {
        let bad = [
            "0 0.5 0.5 0.2",
            "0 0.5 0.5 0.2 0.3 0.1",
            "x 0.5 0.5 0.2 0.3",
            "-1 0.5 0.5 0.2 0.3",
            "0 0.5 abc 0.2 0.3",
            "0 NaN 0.5 0.2 0.3",
        ];
        for line in bad {
            let result = parse_yolo_line(line, 3);
            assert!(
                matches!(result, Err(FormatError::MalformedLine { line: 3, .. })),
                "accepted '{}'",
                line
            );
        }
    }

    #[test]
    fn test_label_path_for() {
        assert_eq!(
            label_path_for(Path::new("/data/img/photo001.jpg")),
            PathBuf::from("/data/img/photo001.txt")
        );
    }
}
