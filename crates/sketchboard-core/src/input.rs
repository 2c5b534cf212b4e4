//! Pointer and keyboard input, and the keyboard shortcut table.

use crate::command::Command;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    /// Ctrl on Windows/Linux, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Modifier that toggles selection membership and snaps rotation.
    pub fn multi_select(&self) -> bool {
        self.shift || self.command()
    }
}

/// Pointer event in stage coordinates (relative to the canvas container).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    Move {
        position: Point,
        modifiers: Modifiers,
    },
    Up {
        position: Point,
    },
    DoubleClick {
        position: Point,
    },
}

/// A key press with the modifiers held at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPress {
    /// Key name, e.g. `"z"`, `"Delete"`, `"Escape"`, `"Enter"`.
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }
}

/// Where keyboard focus is when a key is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    /// The canvas or page body.
    #[default]
    Canvas,
    /// The overlay text editor.
    TextEditor,
    /// Any other text input (toolbar fields, dialogs).
    TextInput,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    /// Requires Ctrl (or Cmd).
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
    pub command: Command,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
        command: Command,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
            command,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    fn matches(&self, press: &KeyPress) -> bool {
        self.key.eq_ignore_ascii_case(&press.key)
            && self.ctrl == press.modifiers.command()
            && self.shift == press.modifiers.shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Shortcuts active while the canvas has focus.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, false, "Undo", Command::Undo),
            Shortcut::new("Z", true, true, "Redo", Command::Redo),
            Shortcut::new("Y", true, false, "Redo", Command::Redo),
            Shortcut::new("D", true, false, "Duplicate selection", Command::DuplicateSelection),
            Shortcut::new("A", true, false, "Select all shapes", Command::SelectAll),
            Shortcut::new(
                "Delete",
                false,
                false,
                "Delete selected shapes",
                Command::DeleteSelection,
            ),
            Shortcut::new(
                "Backspace",
                false,
                false,
                "Delete selected shapes",
                Command::DeleteSelection,
            ),
            Shortcut::new("Escape", false, false, "Cancel text editing", Command::CancelTextEdit),
        ]
    }

    /// Shortcuts active inside the overlay text editor.
    pub fn text_editor() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Enter", true, false, "Commit text", Command::CommitTextEdit),
            Shortcut::new("Escape", false, false, "Cancel text editing", Command::CancelTextEdit),
        ]
    }

    /// Map a key press to a command.
    ///
    /// Canvas shortcuts are ignored while focus is in a text input.
    pub fn resolve(press: &KeyPress, focus: Focus) -> Option<Command> {
        let table = match focus {
            Focus::Canvas => Self::all(),
            Focus::TextEditor => Self::text_editor(),
            Focus::TextInput => return None,
        };
        table.into_iter().find(|s| s.matches(press)).map(|s| s.command)
    }

    /// Human-readable shortcut list.
    pub fn describe() -> Vec<String> {
        Self::all()
            .iter()
            .chain(Self::text_editor().iter())
            .map(|s| format!("{:20} {}", s.format(), s.description))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(key: &str, modifiers: Modifiers) -> KeyPress {
        KeyPress::new(key, modifiers)
    }

    fn on_canvas(key: &str, modifiers: Modifiers) -> Option<Command> {
        ShortcutRegistry::resolve(&press(key, modifiers), Focus::Canvas)
    }

    fn in_editor(key: &str, modifiers: Modifiers) -> Option<Command> {
        ShortcutRegistry::resolve(&press(key, modifiers), Focus::TextEditor)
    }

    #[test]
    fn test_undo_redo_bindings() {
        let ctrl_shift = Modifiers {
            shift: true,
            ..Modifiers::CTRL
        };
        let meta = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert_eq!(on_canvas("z", Modifiers::CTRL), Some(Command::Undo));
        assert_eq!(on_canvas("z", meta), Some(Command::Undo));
        assert_eq!(on_canvas("Z", ctrl_shift), Some(Command::Redo));
        assert_eq!(on_canvas("y", Modifiers::CTRL), Some(Command::Redo));
        assert_eq!(on_canvas("z", Modifiers::NONE), None);
    }

    #[test]
    fn test_delete_and_duplicate() {
        assert_eq!(
            ShortcutRegistry::resolve(&press("Backspace", Modifiers::NONE), Focus::Canvas),
            Some(Command::DeleteSelection)
        );
        assert_eq!(
            ShortcutRegistry::resolve(&press("d", Modifiers::CTRL), Focus::Canvas),
            Some(Command::DuplicateSelection)
        );
    }

    #[test]
    fn test_ignored_in_text_inputs() {
        assert_eq!(ShortcutRegistry::resolve(&press("z", Modifiers::CTRL), Focus::TextInput), None);
        assert_eq!(in_editor("Delete", Modifiers::NONE), None);
    }

    #[test]
    fn test_text_editor_keys() {
        assert_eq!(
            ShortcutRegistry::resolve(&press("Enter", Modifiers::CTRL), Focus::TextEditor),
            Some(Command::CommitTextEdit)
        );
        assert_eq!(in_editor("Enter", Modifiers::NONE), None);
        assert_eq!(
            ShortcutRegistry::resolve(&press("Escape", Modifiers::NONE), Focus::TextEditor),
            Some(Command::CancelTextEdit)
        );
    }

    #[test]
    fn test_multi_select_modifier() {
        assert!(Modifiers::SHIFT.multi_select());
        assert!(Modifiers::CTRL.multi_select());
        assert!(!Modifiers::NONE.multi_select());
    }

    #[test]
    fn test_format() {
        let redo = Shortcut::new("Z", true, true, "Redo", Command::Redo);
        assert_eq!(redo.format(), "Ctrl+Shift+Z");
    }
}
