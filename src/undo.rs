//! Undo/Redo system for shape edits.
//!
//! Each committed edit is recorded as a [`Command`] holding enough information
//! to reverse itself. Commands are recorded after the registry has already been
//! changed; undo and redo then replay them against the registry.

use std::collections::HashSet;

use crate::geometry::BoundingBox;
use crate::model::{Shape, ShapeId};
use crate::registry::ShapeRegistry;

// ============================================================================
// Command Types
// ============================================================================

/// A command that can be undone and redone.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A shape was added on top of the stack
    AddShape {
        /// The shape that was added
        shape: Shape,
    },
    /// Shapes were removed in one step
    RemoveShapes {
        /// Removed shapes with their former z-index, bottom to top
        removed: Vec<(usize, Shape)>,
    },
    /// A shape was moved or resized
    ModifyGeometry {
        /// The shape ID
        id: ShapeId,
        /// The geometry before modification
        old: BoundingBox,
        /// The geometry after modification
        new: BoundingBox,
    },
    /// A shape's class label changed
    SetClass {
        /// The shape ID
        id: ShapeId,
        /// The label before modification
        old_label: String,
        /// The label after modification
        new_label: String,
    },
    /// Batch command - groups multiple commands into one undo step
    Batch {
        /// Description of the batch operation
        description: String,
        /// The commands in this batch
        commands: Vec<Command>,
    },
}

impl Command {
    /// Get a human-readable description of this command
    pub fn description(&self) -> String {
        match self {
            Command::AddShape { .. } => "Add box".to_string(),
            Command::RemoveShapes { removed } if removed.len() == 1 => "Delete box".to_string(),
            Command::RemoveShapes { removed } => format!("Delete {} boxes", removed.len()),
            Command::ModifyGeometry { .. } => "Move/resize box".to_string(),
            Command::SetClass { new_label, .. } => format!("Change class to '{}'", new_label),
            Command::Batch { description, .. } => description.clone(),
        }
    }
}

// ============================================================================
// Undo Stack
// ============================================================================

/// Configuration for the undo stack
#[derive(Debug, Clone)]
pub struct UndoConfig {
    /// Maximum number of commands to keep in history
    pub max_history: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self { max_history: 100 }
    }
}

/// The undo/redo history stack.
///
/// When a new command is pushed the redo stack is cleared. Undo moves the
/// most recent command to the redo stack and redo moves it back.
#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    /// Stack of commands that can be undone
    undo_stack: Vec<Command>,
    /// Stack of commands that can be redone
    redo_stack: Vec<Command>,
    /// Configuration
    config: UndoConfig,
}

impl UndoStack {
    /// Create a new empty undo stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: UndoConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Push a command to the undo stack.
    /// This clears the redo stack (can't redo after a new action).
    pub fn push(&mut self, command: Command) {
        log::debug!("Undo: pushed '{}'", command.description());
        self.undo_stack.push(command);
        self.redo_stack.clear();

        if self.undo_stack.len() > self.config.max_history {
            let excess = self.undo_stack.len() - self.config.max_history;
            self.undo_stack.drain(..excess);
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn pop_undo(&mut self) -> Option<Command> {
        let cmd = self.undo_stack.pop()?;
        log::debug!("Undo: '{}'", cmd.description());
        self.redo_stack.push(cmd.clone());
        Some(cmd)
    }

    fn pop_redo(&mut self) -> Option<Command> {
        let cmd = self.redo_stack.pop()?;
        log::debug!("Redo: '{}'", cmd.description());
        self.undo_stack.push(cmd.clone());
        Some(cmd)
    }

    /// Undo the most recent command against `registry`.
    /// Returns false if there was nothing to undo.
    pub fn undo(&mut self, registry: &mut ShapeRegistry) -> bool {
        let Some(cmd) = self.pop_undo() else {
            return false;
        };
        apply_undo(&cmd, registry);
        true
    }

    /// Redo the most recently undone command against `registry`.
    /// Returns false if there was nothing to redo.
    pub fn redo(&mut self, registry: &mut ShapeRegistry) -> bool {
        let Some(cmd) = self.pop_redo() else {
            return false;
        };
        apply_redo(&cmd, registry);
        true
    }

    /// Get the description of the command that would be undone
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|c| c.description())
    }

    /// Get the description of the command that would be redone
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|c| c.description())
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::debug!("Undo history cleared");
    }

    /// Get the number of commands in undo history
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of commands in redo history
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}

// ============================================================================
// Undo/Redo Execution
// ============================================================================

fn apply_undo(cmd: &Command, registry: &mut ShapeRegistry) {
    match cmd {
        Command::AddShape { shape } => {
            if registry.remove(shape.id).is_err() {
                log::warn!("Undo add: shape {} already gone", shape.id);
            }
        }
        Command::RemoveShapes { removed } => {
            // Ascending original indices, so each insert lands where it was
            for (index, shape) in removed {
                registry.restore(*index, shape.clone());
            }
        }
        Command::ModifyGeometry { id, old, .. } => {
            if let Err(e) = registry.set_geometry(*id, *old) {
                log::warn!("Undo move/resize on {}: {}", id, e);
            }
        }
        Command::SetClass { id, old_label, .. } => {
            if let Err(e) = registry.set_class(*id, old_label.clone()) {
                log::warn!("Undo class change on {}: {}", id, e);
            }
        }
        Command::Batch { commands, .. } => {
            for cmd in commands.iter().rev() {
                apply_undo(cmd, registry);
            }
        }
    }
}

fn apply_redo(cmd: &Command, registry: &mut ShapeRegistry) {
    match cmd {
        Command::AddShape { shape } => {
            let top = registry.len();
            registry.restore(top, shape.clone());
        }
        Command::RemoveShapes { removed } => {
            let ids: HashSet<ShapeId> = removed.iter().map(|(_, s)| s.id).collect();
            registry.remove_selected(&ids);
        }
        Command::ModifyGeometry { id, new, .. } => {
            if let Err(e) = registry.set_geometry(*id, *new) {
                log::warn!("Redo move/resize on {}: {}", id, e);
            }
        }
        Command::SetClass { id, new_label, .. } => {
            if let Err(e) = registry.set_class(*id, new_label.clone()) {
                log::warn!("Redo class change on {}: {}", id, e);
            }
        }
        Command::Batch { commands, .. } => {
            for cmd in commands {
                apply_redo(cmd, registry);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: f64) -> BoundingBox {
        BoundingBox::new(x, x, 10.0, 10.0)
    }

    #[test]
    fn test_undo_stack_basic() {
        let mut registry = ShapeRegistry::new();
        let mut stack = UndoStack::new();
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());

        let id = registry.add("cat", bbox(0.0)).unwrap();
        stack.push(Command::AddShape {
            shape: registry.get(id).unwrap().clone(),
        });
        assert!(stack.can_undo());

        assert!(stack.undo(&mut registry));
        assert!(registry.is_empty());
        assert!(stack.can_redo());

        assert!(stack.redo(&mut registry));
        assert_eq!(registry.ids(), vec![id]);
        assert!(!stack.redo(&mut registry));
    }

    #[test]
    fn test_push_clears_redo() {
        let mut registry = ShapeRegistry::new();
        let mut stack = UndoStack::new();
        let id = registry.add("cat", bbox(0.0)).unwrap();
        stack.push(Command::AddShape {
            shape: registry.get(id).unwrap().clone(),
        });
        stack.undo(&mut registry);
        assert!(stack.can_redo());

        stack.push(Command::SetClass {
            id,
            old_label: "cat".into(),
            new_label: "dog".into(),
        });
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_max_history() {
        let mut stack = UndoStack::with_config(UndoConfig { max_history: 3 });
        for i in 0..5 {
            stack.push(Command::ModifyGeometry {
                id: i,
                old: bbox(0.0),
                new: bbox(1.0),
            });
        }
        assert_eq!(stack.undo_count(), 3);
    }

    #[test]
    fn test_undo_multi_delete_restores_order() {
        let mut registry = ShapeRegistry::new();
        let mut stack = UndoStack::new();
        for i in 0..4 {
            registry.add("a", bbox(i as f64)).unwrap();
        }
        let selection: HashSet<ShapeId> = [1, 3].into_iter().collect();
        let removed = registry.remove_selected(&selection);
        stack.push(Command::RemoveShapes { removed });
        assert_eq!(registry.ids(), vec![2, 4]);

        stack.undo(&mut registry);
        assert_eq!(registry.ids(), vec![1, 2, 3, 4]);

        stack.redo(&mut registry);
        assert_eq!(registry.ids(), vec![2, 4]);
    }

    #[test]
    fn test_undo_geometry_and_class() {
        let mut registry = ShapeRegistry::new();
        let mut stack = UndoStack::new();
        let id = registry.add("cat", bbox(0.0)).unwrap();

        registry.set_geometry(id, bbox(5.0)).unwrap();
        registry.set_class(id, "dog").unwrap();
        stack.push(Command::Batch {
            description: "Edit".into(),
            commands: vec![
                Command::ModifyGeometry {
                    id,
                    old: bbox(0.0),
                    new: bbox(5.0),
                },
                Command::SetClass {
                    id,
                    old_label: "cat".into(),
                    new_label: "dog".into(),
                },
            ],
        });

        stack.undo(&mut registry);
        let shape = registry.get(id).unwrap();
        assert_eq!(shape.bbox, bbox(0.0));
        assert_eq!(shape.label, "cat");
    }

    #[test]
    fn test_command_descriptions() {
        let shape = Shape::new(1, "cat", bbox(0.0));
        assert_eq!(
            Command::AddShape {
                shape: shape.clone()
            }
            .description(),
            "Add box"
        );
        assert_eq!(
            Command::RemoveShapes {
                removed: vec![(0, shape.clone())]
            }
            .description(),
            "Delete box"
        );
        assert_eq!(
            Command::RemoveShapes {
                removed: vec![(0, shape.clone()), (1, shape)]
            }
            .description(),
            "Delete 2 boxes"
        );
    }
}
