//! Toolbar, context-menu and keyboard commands.

/// Stroke width range of the style menu.
pub const STROKE_WIDTH_RANGE: (f64, f64) = (0.0, 12.0);

/// Opacity range of the style menu.
pub const OPACITY_RANGE: (f64, f64) = (0.1, 1.0);

/// Font size range of the style menu.
pub const FONT_SIZE_RANGE: (f64, f64) = crate::text_edit::FONT_SIZE_RANGE;

/// An editor command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Undo,
    Redo,
    AddRect,
    AddEllipse,
    AddTriangle,
    AddLine,
    AddText,
    /// Add one image shape per reference.
    AddImages(Vec<String>),
    DuplicateSelection,
    BringToFront,
    SendToBack,
    DeleteSelection,
    ToggleLockSelection,
    SelectAll,
    SaveSnapshot,
    LoadSnapshot,
    ClearDocument,
    /// Style edits apply to every selected shape, locked ones included.
    SetFill(String),
    SetStroke(String),
    SetStrokeWidth(f64),
    SetOpacity(f64),
    /// Applies to selected text shapes only.
    SetFontSize(f64),
    CommitTextEdit,
    CancelTextEdit,
}

impl Command {
    /// Whether the command needs a user confirmation before it acts.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Command::LoadSnapshot | Command::ClearDocument)
    }
}

/// Clamp a value into an inclusive range.
pub fn clamp_to(value: f64, range: (f64, f64)) -> f64 {
    if value.is_nan() {
        return range.0;
    }
    value.clamp(range.0, range.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps() {
        assert!((clamp_to(20.0, STROKE_WIDTH_RANGE) - 12.0).abs() < f64::EPSILON);
        assert!((clamp_to(0.0, OPACITY_RANGE) - 0.1).abs() < f64::EPSILON);
        assert!((clamp_to(4.0, FONT_SIZE_RANGE) - 10.0).abs() < f64::EPSILON);
        assert!((clamp_to(f64::NAN, OPACITY_RANGE) - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_destructive_commands() {
        assert!(Command::ClearDocument.is_destructive());
        assert!(!Command::SaveSnapshot.is_destructive());
    }
}
