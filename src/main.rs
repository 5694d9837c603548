//! `bboxed-check`: validate the label files of an image directory.
//!
//! Usage: `bboxed-check <image-dir> [classes.txt]`
//!
//! Every image in the directory is opened to read its size, its label file
//! (same stem, `.txt`) is parsed against the class table, and a one-line
//! summary is printed per image. Exits non-zero if any label file fails.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bboxed::config::EngineConfig;
use bboxed::format::{self, CLASSES_FILENAME, FormatError};
use bboxed::model::ClassTable;
use bboxed::palette;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif", "webp"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, FormatError> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    images.sort();
    Ok(images)
}

/// Check one image. Returns the number of boxes, or None when it has no label file.
fn check_image(image: &Path, classes: &ClassTable) -> Result<Option<usize>, FormatError> {
    let label_path = format::label_path_for(image);
    if !label_path.exists() {
        return Ok(None);
    }
    let (width, height) = image::image_dimensions(image)?;
    let registry = format::read_label_file(&label_path, classes, width, height)?;
    Ok(Some(registry.len()))
}

fn run(dir: &Path, classes_path: &Path) -> Result<bool, FormatError> {
    let classes = format::read_classes(classes_path)?;
    println!("{} class(es) from {}", classes.len(), classes_path.display());
    {
        let mut palette = palette::global().lock();
        for (index, name) in classes.names().iter().enumerate() {
            let [r, g, b] = palette.color_for(name);
            println!("  {:>3} {:<24} #{:02x}{:02x}{:02x}", index, name, r, g, b);
        }
    }

    let images = list_images(dir)?;
    let mut failures = 0usize;
    let mut boxes = 0usize;
    for image in &images {
        let name = image.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        match check_image(image, &classes) {
            Ok(Some(count)) => {
                boxes += count;
                println!("ok      {} ({} box(es))", name, count);
            }
            Ok(None) => println!("missing {}", name),
            Err(e) => {
                failures += 1;
                println!("FAILED  {}: {}", name, e);
            }
        }
    }

    println!(
        "{} image(s), {} box(es), {} failure(s)",
        images.len(),
        boxes,
        failures
    );
    Ok(failures == 0)
}

fn main() -> ExitCode {
    let config = EngineConfig::load_from_default_path().unwrap_or_default();

    // RUST_LOG overrides the configured level
    env_logger::Builder::new()
        .filter_level(config.preferences.log_level.to_level_filter())
        .parse_default_env()
        .init();

    config.apply_class_colors(&mut palette::global().lock());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(dir) = args.first().map(PathBuf::from) else {
        eprintln!("Usage: bboxed-check <image-dir> [classes.txt]");
        return ExitCode::from(2);
    };
    let classes_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| dir.join(CLASSES_FILENAME));

    match run(&dir, &classes_path) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("Check failed: {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
