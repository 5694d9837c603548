//! Pointer/keyboard interaction state machine.
//!
//! The canvas turns a stream of [`CanvasEvent`]s into registry edits: drawing
//! new boxes, selecting, moving, resizing and deleting. Events are plain values
//! in image pixel coordinates, so any sequence can be replayed in a test.
//!
//! Live edits during a drag are written to the registry on every pointer move so
//! the shell always draws the current state. A single [`Command`] is emitted when
//! a gesture commits, for the caller to record in its undo history.

use std::collections::HashSet;

use crate::geometry::{BoundingBox, Point};
use crate::model::{HANDLE_HIT_RADIUS, MIN_BBOX_SIZE, Shape, ShapeId};
use crate::registry::{DragHandle, Hit, ShapeRegistry};
use crate::undo::Command;

/// Modifier keys held during a pointer press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Toggle the hit shape in the selection instead of replacing it (Ctrl).
    pub additive: bool,
}

/// Input events, already translated into image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasEvent {
    PointerDown { pos: Point, modifiers: Modifiers },
    PointerMove { pos: Point },
    PointerUp { pos: Point },
    /// Quick-delete key.
    Delete,
    /// Cancel the current gesture and clear the selection.
    Escape,
    /// The shell lost pointer capture mid-gesture.
    CaptureLost,
    SelectAll,
}

/// Interaction state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    /// Nothing selected, no gesture in progress.
    #[default]
    Idle,
    /// Drawing a new box: `anchor` is fixed, `current` follows the pointer.
    Creating { anchor: Point, current: Point },
    /// One or more shapes selected.
    Selected { ids: Vec<ShapeId> },
    /// Moving or resizing a shape.
    Dragging {
        id: ShapeId,
        handle: DragHandle,
        /// Pointer position minus the grabbed point at press time.
        anchor_offset: Point,
        /// Geometry at press time, restored if the drag is cancelled.
        original: BoundingBox,
    },
}

/// Tunables for hit-testing and editing.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasSettings {
    /// Corner grab radius in image pixels.
    pub hit_tolerance: f64,
    /// Smallest allowed box side in image pixels.
    pub min_box_size: f64,
    /// Keep pointer positions and moved boxes inside the image.
    pub clamp_to_image: bool,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            hit_tolerance: HANDLE_HIT_RADIUS,
            min_box_size: MIN_BBOX_SIZE,
            clamp_to_image: true,
        }
    }
}

/// The interaction state machine for one image.
#[derive(Debug, Clone)]
pub struct Canvas {
    state: InteractionState,
    settings: CanvasSettings,
    /// Image size in pixels, used for clamping.
    image_size: (f64, f64),
    /// Label given to newly drawn boxes.
    active_class: Option<String>,
    /// Classes whose shapes are not drawn and cannot be picked.
    hidden_classes: HashSet<String>,
}

impl Canvas {
    pub fn new(image_width: u32, image_height: u32, settings: CanvasSettings) -> Self {
        Self {
            state: InteractionState::Idle,
            settings,
            image_size: (f64::from(image_width), f64::from(image_height)),
            active_class: None,
            hidden_classes: HashSet::new(),
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn settings(&self) -> &CanvasSettings {
        &self.settings
    }

    pub fn active_class(&self) -> Option<&str> {
        self.active_class.as_deref()
    }

    /// Set the label for boxes drawn from now on.
    pub fn set_active_class(&mut self, label: impl Into<String>) {
        self.active_class = Some(label.into());
    }

    /// Show or hide every shape of a class. Hidden shapes are dropped from the
    /// selection.
    pub fn set_class_visible(&mut self, registry: &ShapeRegistry, label: &str, visible: bool) {
        if visible {
            self.hidden_classes.remove(label);
        } else {
            self.hidden_classes.insert(label.to_string());
            if let InteractionState::Selected { ids } = &mut self.state {
                ids.retain(|id| {
                    registry
                        .get(*id)
                        .is_some_and(|shape| shape.label != label)
                });
                if ids.is_empty() {
                    self.state = InteractionState::Idle;
                }
            }
        }
    }

    pub fn is_visible(&self, shape: &Shape) -> bool {
        !self.hidden_classes.contains(&shape.label)
    }

    /// IDs currently selected (the dragged shape counts as selected).
    pub fn selected_ids(&self) -> Vec<ShapeId> {
        match &self.state {
            InteractionState::Selected { ids } => ids.clone(),
            InteractionState::Dragging { id, .. } => vec![*id],
            _ => Vec::new(),
        }
    }

    pub fn is_selected(&self, id: ShapeId) -> bool {
        match &self.state {
            InteractionState::Selected { ids } => ids.contains(&id),
            InteractionState::Dragging { id: dragged, .. } => *dragged == id,
            _ => false,
        }
    }

    /// Replace the selection. An empty list returns to `Idle`.
    pub fn select(&mut self, ids: Vec<ShapeId>) {
        self.state = if ids.is_empty() {
            InteractionState::Idle
        } else {
            InteractionState::Selected { ids }
        };
    }

    /// The box being drawn, if a `Creating` gesture is in progress.
    pub fn preview(&self) -> Option<BoundingBox> {
        match &self.state {
            InteractionState::Creating { anchor, current } => {
                Some(BoundingBox::from_corners(*anchor, *current))
            }
            _ => None,
        }
    }

    fn clamp(&self, pos: Point) -> Point {
        if self.settings.clamp_to_image {
            pos.clamp_to(self.image_size.0, self.image_size.1)
        } else {
            pos
        }
    }

    /// Feed one event through the state machine.
    ///
    /// Returns the command for a committed edit, if any. Recoverable problems
    /// (degenerate boxes, stale ids) are logged and never returned as errors.
    pub fn handle_event(
        &mut self,
        registry: &mut ShapeRegistry,
        event: CanvasEvent,
    ) -> Option<Command> {
        match event {
            CanvasEvent::PointerDown { pos, modifiers } => {
                self.pointer_down(registry, self.clamp(pos), modifiers);
                None
            }
            CanvasEvent::PointerMove { pos } => {
                log::trace!("Canvas: move to ({:.1}, {:.1})", pos.x, pos.y);
                self.pointer_move(registry, self.clamp(pos));
                None
            }
            CanvasEvent::PointerUp { pos } => self.pointer_up(registry, self.clamp(pos)),
            CanvasEvent::Delete => self.delete_selected(registry),
            CanvasEvent::Escape | CanvasEvent::CaptureLost => {
                self.cancel(registry);
                None
            }
            CanvasEvent::SelectAll => {
                let ids: Vec<ShapeId> = registry
                    .all()
                    .filter(|s| self.is_visible(s))
                    .map(|s| s.id)
                    .collect();
                if !matches!(
                    self.state,
                    InteractionState::Creating { .. } | InteractionState::Dragging { .. }
                ) {
                    self.select(ids);
                }
                None
            }
        }
    }

    fn pointer_down(&mut self, registry: &mut ShapeRegistry, pos: Point, modifiers: Modifiers) {
        match &self.state {
            InteractionState::Creating { .. } | InteractionState::Dragging { .. } => {
                log::debug!("Canvas: pointer down ignored during {:?}", self.state);
                return;
            }
            InteractionState::Idle | InteractionState::Selected { .. } => {}
        }

        let hit = registry.hit_test(&pos, self.settings.hit_tolerance, |s| self.is_visible(s));

        if modifiers.additive {
            if let Some(Hit { id, .. }) = hit {
                let mut ids = self.selected_ids();
                if let Some(idx) = ids.iter().position(|&s| s == id) {
                    ids.remove(idx);
                } else {
                    ids.push(id);
                }
                log::debug!("Canvas: selection toggled {}, now {:?}", id, ids);
                self.select(ids);
            }
            return;
        }

        match hit {
            Some(Hit { id, handle }) => {
                let Some(shape) = registry.get(id) else {
                    return;
                };
                let original = shape.bbox;
                let grabbed = match handle {
                    DragHandle::Vertex(vertex) => original.vertex(vertex),
                    DragHandle::Whole => original.top_left(),
                };
                if registry.move_to_front(id).is_err() {
                    return;
                }
                log::debug!("Canvas: drag start on {} ({:?})", id, handle);
                self.state = InteractionState::Dragging {
                    id,
                    handle,
                    anchor_offset: pos.offset_from(&grabbed),
                    original,
                };
            }
            None => {
                if self.active_class.is_none() {
                    log::warn!("Canvas: no active class, not starting a box");
                    self.state = InteractionState::Idle;
                    return;
                }
                log::debug!("Canvas: creating at ({:.1}, {:.1})", pos.x, pos.y);
                self.state = InteractionState::Creating {
                    anchor: pos,
                    current: pos,
                };
            }
        }
    }

    fn pointer_move(&mut self, registry: &mut ShapeRegistry, pos: Point) {
        match &mut self.state {
            InteractionState::Creating { current, .. } => {
                *current = pos;
            }
            InteractionState::Dragging {
                id,
                handle,
                anchor_offset,
                original,
            } => {
                let target = Point::new(pos.x - anchor_offset.x, pos.y - anchor_offset.y);
                let updated = match handle {
                    DragHandle::Whole => {
                        let dx = target.x - original.top_left().x;
                        let dy = target.y - original.top_left().y;
                        if self.settings.clamp_to_image {
                            original.translate_within(dx, dy, self.image_size.0, self.image_size.1)
                        } else {
                            original.translate(dx, dy)
                        }
                    }
                    DragHandle::Vertex(vertex) => {
                        let (w, h) = self.image_size;
                        if !self.settings.clamp_to_image {
                            original.resize_corner(
                                *vertex,
                                target.x,
                                target.y,
                                self.settings.min_box_size,
                            )
                        } else {
                            let target = target.clamp_to(w, h);
                            let resized = original.resize_corner(
                                *vertex,
                                target.x,
                                target.y,
                                self.settings.min_box_size,
                            );
                            // The minimum size can still push the corner past an edge
                            if resized.clamp_to(w, h) != resized {
                                log::trace!("Canvas: resize of {} would leave the image", id);
                                return;
                            }
                            resized
                        }
                    }
                };
                if let Err(e) = registry.set_geometry(*id, updated) {
                    log::warn!("Canvas: drag update on {} rejected: {}", id, e);
                }
            }
            InteractionState::Idle | InteractionState::Selected { .. } => {}
        }
    }

    fn pointer_up(&mut self, registry: &mut ShapeRegistry, pos: Point) -> Option<Command> {
        match std::mem::take(&mut self.state) {
            InteractionState::Creating { anchor, .. } => {
                let bbox = BoundingBox::from_corners(anchor, pos);
                let label = self.active_class.clone()?;
                if bbox.is_degenerate(self.settings.min_box_size) {
                    log::debug!("Canvas: discarded degenerate box {:?}", bbox);
                    return None;
                }
                match registry.add(label, bbox) {
                    Ok(id) => {
                        log::info!("Created box {} (total: {})", id, registry.len());
                        self.select(vec![id]);
                        registry.get(id).map(|shape| Command::AddShape {
                            shape: shape.clone(),
                        })
                    }
                    Err(e) => {
                        log::warn!("Canvas: box discarded: {}", e);
                        None
                    }
                }
            }
            InteractionState::Dragging { id, original, .. } => {
                self.select(vec![id]);
                let current = registry.get(id)?.bbox;
                if current == original {
                    return None;
                }
                log::info!("Finished editing box {}", id);
                Some(Command::ModifyGeometry {
                    id,
                    old: original,
                    new: current,
                })
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    fn delete_selected(&mut self, registry: &mut ShapeRegistry) -> Option<Command> {
        let InteractionState::Selected { ids } = &self.state else {
            return None;
        };
        let removed = if let [id] = ids.as_slice() {
            let index = registry.all().position(|s| s.id == *id);
            match registry.remove(*id) {
                Ok(shape) => vec![(index.unwrap_or_default(), shape)],
                Err(e) => {
                    log::warn!("Canvas: delete skipped: {}", e);
                    Vec::new()
                }
            }
        } else {
            let selection: HashSet<ShapeId> = ids.iter().copied().collect();
            registry.remove_selected(&selection)
        };
        self.state = InteractionState::Idle;
        if removed.is_empty() {
            return None;
        }
        log::info!("Deleted {} box(es)", removed.len());
        Some(Command::RemoveShapes { removed })
    }

    /// Abandon any gesture. A cancelled drag puts the original geometry back.
    fn cancel(&mut self, registry: &mut ShapeRegistry) {
        if let InteractionState::Dragging { id, original, .. } = &self.state {
            if let Err(e) = registry.set_geometry(*id, *original) {
                log::warn!("Canvas: could not revert drag on {}: {}", id, e);
            }
        }
        log::debug!("Canvas: cancel from {:?}", self.state);
        self.state = InteractionState::Idle;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::VertexIndex;

    fn down(x: f64, y: f64) -> CanvasEvent {
        CanvasEvent::PointerDown {
            pos: Point::new(x, y),
            modifiers: Modifiers::default(),
        }
    }

    fn ctrl_down(x: f64, y: f64) -> CanvasEvent {
        CanvasEvent::PointerDown {
            pos: Point::new(x, y),
            modifiers: Modifiers { additive: true },
        }
    }

    fn mv(x: f64, y: f64) -> CanvasEvent {
        CanvasEvent::PointerMove {
            pos: Point::new(x, y),
        }
    }

    fn up(x: f64, y: f64) -> CanvasEvent {
        CanvasEvent::PointerUp {
            pos: Point::new(x, y),
        }
    }

    fn setup() -> (Canvas, ShapeRegistry) {
        let mut canvas = Canvas::new(640, 480, CanvasSettings::default());
        canvas.set_active_class("cat");
        (canvas, ShapeRegistry::new())
    }

    /// Replay events, collecting emitted commands.
    fn replay(canvas: &mut Canvas, registry: &mut ShapeRegistry, events: &[CanvasEvent]) -> Vec<Command> {
        events
            .iter()
            .filter_map(|e| canvas.handle_event(registry, *e))
            .collect()
    }

    #[test]
    fn test_create_box() {
        let (mut canvas, mut registry) = setup();
        let commands = replay(
            &mut canvas,
            &mut registry,
            &[down(100.0, 100.0), mv(150.0, 150.0), mv(200.0, 180.0)],
        );
        assert!(commands.is_empty());
        assert!(registry.is_empty(), "no mutation before pointer up");
        assert_eq!(
            canvas.preview(),
            Some(BoundingBox::new(100.0, 100.0, 100.0, 80.0))
        );

        let cmd = canvas.handle_event(&mut registry, up(200.0, 180.0));
        assert!(matches!(cmd, Some(Command::AddShape { .. })));
        assert_eq!(registry.len(), 1);
        let shape = registry.all().next().unwrap();
        assert_eq!(shape.label, "cat");
        assert_eq!(shape.bbox, BoundingBox::new(100.0, 100.0, 100.0, 80.0));
        assert_eq!(
            canvas.state(),
            &InteractionState::Selected {
                ids: vec![shape.id]
            }
        );
    }

    #[test]
    fn test_create_dragging_up_left_normalizes() {
        let (mut canvas, mut registry) = setup();
        replay(
            &mut canvas,
            &mut registry,
            &[down(200.0, 180.0), mv(100.0, 100.0), up(100.0, 100.0)],
        );
        let shape = registry.all().next().unwrap();
        assert_eq!(shape.bbox.top_left(), Point::new(100.0, 100.0));
    }

    #[test]
    fn test_degenerate_box_discarded() {
        let (mut canvas, mut registry) = setup();
        let commands = replay(
            &mut canvas,
            &mut registry,
            &[down(100.0, 100.0), up(100.0, 150.0)],
        );
        assert!(commands.is_empty());
        assert!(registry.is_empty());
        assert_eq!(canvas.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_no_active_class_does_not_create() {
        let mut canvas = Canvas::new(640, 480, CanvasSettings::default());
        let mut registry = ShapeRegistry::new();
        replay(
            &mut canvas,
            &mut registry,
            &[down(10.0, 10.0), mv(50.0, 50.0), up(50.0, 50.0)],
        );
        assert!(registry.is_empty());
        assert_eq!(canvas.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_escape_discards_creation() {
        let (mut canvas, mut registry) = setup();
        replay(
            &mut canvas,
            &mut registry,
            &[down(10.0, 10.0), mv(50.0, 50.0), CanvasEvent::Escape, up(50.0, 50.0)],
        );
        assert!(registry.is_empty());
        assert_eq!(canvas.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_click_overlap_selects_topmost() {
        let (mut canvas, mut registry) = setup();
        let a = registry.add("cat", BoundingBox::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let b = registry.add("cat", BoundingBox::new(50.0, 50.0, 100.0, 100.0)).unwrap();

        replay(&mut canvas, &mut registry, &[down(75.0, 75.0), up(75.0, 75.0)]);
        assert_eq!(canvas.selected_ids(), vec![b]);

        // Clicking A's exclusive area selects A and raises it
        replay(&mut canvas, &mut registry, &[down(20.0, 20.0), up(20.0, 20.0)]);
        assert_eq!(canvas.selected_ids(), vec![a]);
        assert_eq!(registry.ids(), vec![b, a]);
    }

    #[test]
    fn test_move_whole_shape() {
        let (mut canvas, mut registry) = setup();
        let id = registry.add("cat", BoundingBox::new(100.0, 100.0, 50.0, 50.0)).unwrap();

        canvas.handle_event(&mut registry, down(120.0, 120.0));
        assert!(matches!(
            canvas.state(),
            InteractionState::Dragging {
                handle: DragHandle::Whole,
                ..
            }
        ));
        canvas.handle_event(&mut registry, mv(130.0, 140.0));
        // Live update written back immediately
        assert_eq!(registry.get(id).unwrap().bbox.top_left(), Point::new(110.0, 120.0));

        let cmd = canvas.handle_event(&mut registry, up(130.0, 140.0));
        assert_eq!(
            cmd,
            Some(Command::ModifyGeometry {
                id,
                old: BoundingBox::new(100.0, 100.0, 50.0, 50.0),
                new: BoundingBox::new(110.0, 120.0, 50.0, 50.0),
            })
        );
        assert_eq!(canvas.state(), &InteractionState::Selected { ids: vec![id] });
    }

    #[test]
    fn test_move_is_bounded_by_image() {
        let (mut canvas, mut registry) = setup();
        let id = registry.add("cat", BoundingBox::new(10.0, 10.0, 50.0, 50.0)).unwrap();
        replay(
            &mut canvas,
            &mut registry,
            &[down(20.0, 20.0), mv(-100.0, -100.0), up(-100.0, -100.0)],
        );
        assert_eq!(registry.get(id).unwrap().bbox.top_left(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_resize_vertex() {
        let (mut canvas, mut registry) = setup();
        let id = registry.add("cat", BoundingBox::new(100.0, 100.0, 50.0, 50.0)).unwrap();

        canvas.handle_event(&mut registry, down(151.0, 149.0));
        assert!(matches!(
            canvas.state(),
            InteractionState::Dragging {
                handle: DragHandle::Vertex(VertexIndex::BottomRight),
                ..
            }
        ));
        canvas.handle_event(&mut registry, mv(201.0, 179.0));
        let bbox = registry.get(id).unwrap().bbox;
        assert_eq!(bbox.top_left(), Point::new(100.0, 100.0));
        assert_eq!(bbox.bottom_right(), Point::new(200.0, 180.0));
    }

    #[test]
    fn test_resize_off_canvas_stays_in_image() {
        let (mut canvas, mut registry) = setup();
        let id = registry.add("cat", BoundingBox::new(600.0, 400.0, 30.0, 30.0)).unwrap();

        // Grab the bottom-right corner a few pixels inside it
        canvas.handle_event(&mut registry, down(626.0, 426.0));
        assert!(matches!(
            canvas.state(),
            InteractionState::Dragging {
                handle: DragHandle::Vertex(VertexIndex::BottomRight),
                ..
            }
        ));
        canvas.handle_event(&mut registry, mv(900.0, 900.0));
        canvas.handle_event(&mut registry, up(900.0, 900.0));

        let bbox = registry.get(id).unwrap().bbox;
        assert_eq!(bbox.top_left(), Point::new(600.0, 400.0));
        assert_eq!(bbox.bottom_right(), Point::new(640.0, 480.0));
        assert_eq!(bbox.clamp_to(640.0, 480.0), bbox);
    }

    #[test]
    fn test_resize_min_size_at_edge_keeps_geometry() {
        let (mut canvas, mut registry) = setup();
        let original = BoundingBox::new(639.5, 100.0, 0.5, 20.0);
        let id = registry.add("cat", original).unwrap();

        // Dragging the right edge across the fixed corner would need 1px past the image
        replay(
            &mut canvas,
            &mut registry,
            &[down(640.0, 120.0), mv(0.0, 120.0), up(0.0, 120.0)],
        );
        assert_eq!(registry.get(id).unwrap().bbox, original);
    }

    #[test]
    fn test_resize_past_opposite_corner_clamps() {
        let (mut canvas, mut registry) = setup();
        let id = registry.add("cat", BoundingBox::new(100.0, 100.0, 50.0, 50.0)).unwrap();
        replay(
            &mut canvas,
            &mut registry,
            &[down(150.0, 150.0), mv(20.0, 20.0), up(20.0, 20.0)],
        );
        let bbox = registry.get(id).unwrap().bbox;
        assert_eq!(bbox.top_left(), Point::new(100.0, 100.0));
        assert!((bbox.width() - MIN_BBOX_SIZE).abs() < 1e-9);
        assert!((bbox.height() - MIN_BBOX_SIZE).abs() < 1e-9);
    }

    #[test]
    fn test_escape_reverts_drag() {
        let (mut canvas, mut registry) = setup();
        let original = BoundingBox::new(100.0, 100.0, 50.0, 50.0);
        let id = registry.add("cat", original).unwrap();
        let commands = replay(
            &mut canvas,
            &mut registry,
            &[down(120.0, 120.0), mv(300.0, 300.0), CanvasEvent::CaptureLost],
        );
        assert!(commands.is_empty());
        assert_eq!(registry.get(id).unwrap().bbox, original);
        assert_eq!(canvas.state(), &InteractionState::Idle);
    }

    #[test]
    fn test_click_without_move_emits_nothing() {
        let (mut canvas, mut registry) = setup();
        registry.add("cat", BoundingBox::new(100.0, 100.0, 50.0, 50.0)).unwrap();
        let commands = replay(&mut canvas, &mut registry, &[down(120.0, 120.0), up(120.0, 120.0)]);
        assert!(commands.is_empty());
    }

    #[test]
    fn test_delete_selected() {
        let (mut canvas, mut registry) = setup();
        let a = registry.add("cat", BoundingBox::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        let b = registry.add("cat", BoundingBox::new(100.0, 100.0, 50.0, 50.0)).unwrap();

        replay(&mut canvas, &mut registry, &[down(10.0, 10.0), up(10.0, 10.0)]);
        let cmd = canvas.handle_event(&mut registry, CanvasEvent::Delete);
        assert!(matches!(cmd, Some(Command::RemoveShapes { ref removed }) if removed.len() == 1));
        assert_eq!(registry.ids(), vec![b]);
        assert!(registry.get(a).is_none());
        assert_eq!(canvas.state(), &InteractionState::Idle);

        // Nothing selected: delete is a no-op
        assert!(canvas.handle_event(&mut registry, CanvasEvent::Delete).is_none());
    }

    #[test]
    fn test_multi_select_delete_skips_stale() {
        let (mut canvas, mut registry) = setup();
        for i in 0..3 {
            let x = i as f64 * 100.0;
            registry.add("cat", BoundingBox::new(x, 0.0, 50.0, 50.0)).unwrap();
        }
        canvas.select(vec![2, 5]);
        let cmd = canvas.handle_event(&mut registry, CanvasEvent::Delete);
        assert!(matches!(cmd, Some(Command::RemoveShapes { ref removed }) if removed.len() == 1));
        assert_eq!(registry.ids(), vec![1, 3]);
    }

    #[test]
    fn test_additive_click_toggles_selection() {
        let (mut canvas, mut registry) = setup();
        let a = registry.add("cat", BoundingBox::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        let b = registry.add("cat", BoundingBox::new(100.0, 100.0, 50.0, 50.0)).unwrap();

        replay(
            &mut canvas,
            &mut registry,
            &[ctrl_down(20.0, 20.0), up(20.0, 20.0), ctrl_down(120.0, 120.0), up(120.0, 120.0)],
        );
        assert_eq!(canvas.selected_ids(), vec![a, b]);

        canvas.handle_event(&mut registry, ctrl_down(20.0, 20.0));
        assert_eq!(canvas.selected_ids(), vec![b]);
    }

    #[test]
    fn test_select_all_respects_visibility() {
        let (mut canvas, mut registry) = setup();
        let a = registry.add("cat", BoundingBox::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        registry.add("dog", BoundingBox::new(100.0, 100.0, 50.0, 50.0)).unwrap();

        canvas.set_class_visible(&registry, "dog", false);
        canvas.handle_event(&mut registry, CanvasEvent::SelectAll);
        assert_eq!(canvas.selected_ids(), vec![a]);

        // Hidden shapes cannot be picked; pressing on one starts a new box
        canvas.handle_event(&mut registry, down(120.0, 120.0));
        assert!(matches!(canvas.state(), InteractionState::Creating { .. }));
    }

    #[test]
    fn test_pointer_clamped_to_image() {
        let (mut canvas, mut registry) = setup();
        replay(
            &mut canvas,
            &mut registry,
            &[down(600.0, 400.0), mv(900.0, 900.0), up(900.0, 900.0)],
        );
        let shape = registry.all().next().unwrap();
        assert_eq!(shape.bbox.bottom_right(), Point::new(640.0, 480.0));
    }
}
