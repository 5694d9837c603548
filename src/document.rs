//! One open image with its annotations.
//!
//! [`AnnotationDocument`] ties the pieces together for the shell: the shape
//! registry of the current image, the interaction state machine, undo history,
//! the class table and the label file on disk. The shell feeds events in and
//! asks for a [`Frame`] to paint.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::canvas::{Canvas, CanvasEvent, InteractionState};
use crate::config::EngineConfig;
use crate::format::{self, FormatError};
use crate::geometry::BoundingBox;
use crate::model::{ClassTable, Shape, ShapeId};
use crate::palette::{Palette, Rgb};
use crate::registry::ShapeRegistry;
use crate::undo::{Command, UndoStack};

static NEXT_DOCUMENT: AtomicU64 = AtomicU64::new(1);

/// Shapes copied from a document, ready to paste.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    shapes: Vec<Shape>,
    source_path: Option<PathBuf>,
    source_document: u64,
}

impl Clipboard {
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }
}

/// A shape as the shell should paint it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    pub id: ShapeId,
    pub bbox: BoundingBox,
    pub label: String,
    pub color: Rgb,
    pub selected: bool,
}

/// Everything visible on the canvas, bottom to top.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub items: Vec<RenderItem>,
    /// Box being drawn, in the active class color.
    pub preview: Option<(BoundingBox, Rgb)>,
}

/// Annotation state for a single image.
#[derive(Debug)]
pub struct AnnotationDocument {
    image_path: Option<PathBuf>,
    document_id: u64,
    width: u32,
    height: u32,
    classes: ClassTable,
    registry: ShapeRegistry,
    canvas: Canvas,
    undo: UndoStack,
    paste_offset: f64,
    /// Unsaved edits since the last load or save.
    modified: bool,
}

impl AnnotationDocument {
    /// Create an empty document for an image of the given size.
    pub fn new(
        width: u32,
        height: u32,
        classes: ClassTable,
        config: &EngineConfig,
    ) -> Result<Self, FormatError> {
        if width == 0 || height == 0 {
            return Err(FormatError::InvalidDimensions { width, height });
        }
        Ok(Self {
            image_path: None,
            document_id: NEXT_DOCUMENT.fetch_add(1, Ordering::Relaxed),
            width,
            height,
            classes,
            registry: ShapeRegistry::new(),
            canvas: Canvas::new(width, height, config.canvas.settings()),
            undo: UndoStack::with_config(config.undo.undo_config()),
            paste_offset: config.canvas.paste_offset,
            modified: false,
        })
    }

    /// Open an image: read its pixel size and any existing label file.
    pub fn open(
        image_path: &Path,
        classes: ClassTable,
        config: &EngineConfig,
    ) -> Result<Self, FormatError> {
        let (width, height) = image::image_dimensions(image_path)?;
        let mut doc = Self::new(width, height, classes, config)?;

        let label_path = format::label_path_for(image_path);
        doc.registry = format::read_label_file(&label_path, &doc.classes, width, height)?;
        doc.image_path = Some(image_path.to_path_buf());
        log::info!(
            "Opened {:?} ({}x{}, {} box(es))",
            image_path,
            width,
            height,
            doc.registry.len()
        );
        Ok(doc)
    }

    pub fn image_path(&self) -> Option<&Path> {
        self.image_path.as_deref()
    }

    /// Label file next to the image, if the document has one.
    pub fn label_path(&self) -> Option<PathBuf> {
        self.image_path.as_deref().map(format::label_path_for)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn classes(&self) -> &ClassTable {
        &self.classes
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    pub fn state(&self) -> &InteractionState {
        self.canvas.state()
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    /// True when there are edits not yet written to the label file.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// True when the shapes changed since the last [`frame`](Self::frame).
    pub fn needs_redraw(&self) -> bool {
        self.registry.is_dirty()
    }

    fn record(&mut self, command: Command) {
        self.undo.push(command);
        self.modified = true;
    }

    /// Feed one input event. Returns true if an edit was committed.
    pub fn handle_event(&mut self, event: CanvasEvent) -> bool {
        match self.canvas.handle_event(&mut self.registry, event) {
            Some(command) => {
                self.record(command);
                true
            }
            None => false,
        }
    }

    /// Abandon any gesture in progress and drop ids that no longer exist
    /// from the selection.
    fn settle_selection(&mut self) {
        if matches!(
            self.canvas.state(),
            InteractionState::Creating { .. } | InteractionState::Dragging { .. }
        ) {
            self.canvas.handle_event(&mut self.registry, CanvasEvent::Escape);
        }
        let ids: Vec<ShapeId> = self
            .canvas
            .selected_ids()
            .into_iter()
            .filter(|id| self.registry.get(*id).is_some())
            .collect();
        self.canvas.select(ids);
    }

    pub fn undo(&mut self) -> bool {
        self.settle_selection();
        let changed = self.undo.undo(&mut self.registry);
        if changed {
            self.modified = true;
            self.settle_selection();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        self.settle_selection();
        let changed = self.undo.redo(&mut self.registry);
        if changed {
            self.modified = true;
            self.settle_selection();
        }
        changed
    }

    /// Replace all shapes with the contents of a label file.
    ///
    /// All-or-nothing: on error the current shapes, selection and history are
    /// left exactly as they were.
    pub fn load_labels(&mut self, text: &str) -> Result<(), FormatError> {
        let registry = format::load(text, &self.classes, self.width, self.height)?;
        self.registry = registry;
        self.canvas.select(Vec::new());
        self.undo.clear();
        self.modified = false;
        Ok(())
    }

    /// Serialize the current shapes.
    pub fn to_label_text(&self) -> Result<String, FormatError> {
        format::save(&self.registry, &self.classes, self.width, self.height)
    }

    /// Write the label file next to the image.
    pub fn save(&mut self) -> Result<PathBuf, FormatError> {
        let path = self.label_path().ok_or_else(|| {
            FormatError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "document has no image path",
            ))
        })?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write the label file to an explicit path.
    pub fn save_to(&mut self, path: &Path) -> Result<(), FormatError> {
        format::write_label_file(path, &self.registry, &self.classes, self.width, self.height)?;
        self.modified = false;
        Ok(())
    }

    /// Resolve a label against the class table.
    fn known_class(&self, label: &str) -> Result<(usize, String), FormatError> {
        let label = label.trim();
        self.classes
            .index_of(label)
            .map(|index| (index, label.to_string()))
            .ok_or_else(|| FormatError::UnknownClass {
                label: label.to_string(),
            })
    }

    /// Append a class to the in-memory table and return its index.
    ///
    /// The shell calls this once the user confirms a new class, and is then
    /// responsible for writing the grown table to `classes.txt`; label files
    /// saved afterwards refer to the new index.
    pub fn add_class(&mut self, label: &str) -> Option<usize> {
        let before = self.classes.len();
        let index = self.classes.push(label)?;
        if self.classes.len() > before {
            log::info!("Added class '{}' at index {}", label.trim(), index);
        }
        Some(index)
    }

    /// Choose the class for new boxes. Fails with
    /// [`FormatError::UnknownClass`] if the label is not in the class table.
    pub fn set_active_class(&mut self, label: &str) -> Result<usize, FormatError> {
        let (index, name) = self.known_class(label)?;
        log::debug!("Active class: '{}' ({})", name, index);
        self.canvas.set_active_class(name);
        Ok(index)
    }

    /// Show or hide every shape of a class.
    pub fn set_class_visible(&mut self, label: &str, visible: bool) {
        self.canvas.set_class_visible(&self.registry, label, visible);
        self.registry.mark_dirty();
    }

    /// Change the class of every selected shape as one undo step.
    /// Returns the number of shapes changed; an unknown label changes nothing.
    pub fn relabel_selected(&mut self, label: &str) -> Result<usize, FormatError> {
        let (_, label) = self.known_class(label)?;

        let mut commands = Vec::new();
        for id in self.canvas.selected_ids() {
            match self.registry.set_class(id, label.clone()) {
                Ok(old_label) if old_label != label => commands.push(Command::SetClass {
                    id,
                    old_label,
                    new_label: label.clone(),
                }),
                Ok(_) => {}
                Err(e) => log::warn!("Relabel skipped: {}", e),
            }
        }

        let count = commands.len();
        if let Some(command) = batch(format!("Change {} box(es) to '{}'", count, label), commands) {
            self.record(command);
        }
        Ok(count)
    }

    fn source_matches(&self, clipboard: &Clipboard) -> bool {
        match (&clipboard.source_path, &self.image_path) {
            (Some(a), Some(b)) => a == b,
            _ => clipboard.source_document == self.document_id,
        }
    }

    /// Copy the selected shapes, in z-order.
    pub fn copy_selected(&self) -> Clipboard {
        let shapes: Vec<Shape> = self
            .registry
            .all()
            .filter(|s| self.canvas.is_selected(s.id))
            .cloned()
            .collect();
        log::debug!("Copied {} box(es)", shapes.len());
        Clipboard {
            shapes,
            source_path: self.image_path.clone(),
            source_document: self.document_id,
        }
    }

    /// Paste shapes as one undo step and select them.
    ///
    /// On the image they came from, copies are shifted by the paste offset and
    /// the clipboard then holds the new copies, so repeated pastes cascade. On
    /// another image shapes keep their position (clipped to the image) and
    /// ones identical to an existing shape are skipped.
    pub fn paste(&mut self, clipboard: &mut Clipboard) -> Vec<ShapeId> {
        if clipboard.is_empty() {
            return Vec::new();
        }
        self.settle_selection();

        let same_image = self.source_matches(clipboard);
        let (w, h) = (f64::from(self.width), f64::from(self.height));
        let clamp = self.canvas.settings().clamp_to_image;

        let mut commands = Vec::new();
        let mut pasted = Vec::new();
        for shape in &clipboard.shapes {
            let bbox = if same_image {
                let offset = self.paste_offset;
                if clamp {
                    shape.bbox.translate_within(offset, offset, w, h)
                } else {
                    shape.bbox.translate(offset, offset)
                }
            } else {
                if self.registry.all().any(|s| s.same_content(shape)) {
                    log::debug!("Paste: skipped duplicate of box {}", shape.id);
                    continue;
                }
                if clamp {
                    shape.bbox.clamp_to(w, h)
                } else {
                    shape.bbox
                }
            };

            match self.registry.add(shape.label.clone(), bbox) {
                Ok(id) => {
                    if let Some(new_shape) = self.registry.get(id) {
                        pasted.push(new_shape.clone());
                        commands.push(Command::AddShape {
                            shape: new_shape.clone(),
                        });
                    }
                }
                Err(e) => log::warn!("Paste: box {} skipped: {}", shape.id, e),
            }
        }

        let ids: Vec<ShapeId> = pasted.iter().map(|s| s.id).collect();
        log::info!("Pasted {} box(es)", ids.len());
        if let Some(command) = batch(format!("Paste {} box(es)", ids.len()), commands) {
            self.record(command);
        }
        if same_image && !pasted.is_empty() {
            clipboard.shapes = pasted;
        }
        self.canvas.select(ids.clone());
        ids
    }

    /// Copy and paste the selection in place (shifted by the paste offset).
    pub fn duplicate_selected(&mut self) -> Vec<ShapeId> {
        let mut clipboard = self.copy_selected();
        self.paste(&mut clipboard)
    }

    /// Everything to draw, with colors from `palette`. Clears the redraw flag.
    pub fn frame(&mut self, palette: &mut Palette) -> Frame {
        let items = self
            .registry
            .all()
            .filter(|s| self.canvas.is_visible(s))
            .map(|s| RenderItem {
                id: s.id,
                bbox: s.bbox,
                label: s.label.clone(),
                color: palette.color_for(&s.label),
                selected: self.canvas.is_selected(s.id),
            })
            .collect();
        let preview = self.canvas.preview().and_then(|bbox| {
            self.canvas
                .active_class()
                .map(|label| (bbox, palette.color_for(label)))
        });
        self.registry.clear_dirty();
        Frame { items, preview }
    }
}

/// Wrap commands as one undo step. A lone command is returned unwrapped.
fn batch(description: String, mut commands: Vec<Command>) -> Option<Command> {
    match commands.len() {
        0 => None,
        1 => commands.pop(),
        _ => Some(Command::Batch {
            description,
            commands,
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
