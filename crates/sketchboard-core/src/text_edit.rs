//! In-place text editing.
//!
//! A [`TextEditSession`] buffers the text and font adjustments made in an
//! overlay editor laid over a text shape. The session itself never touches
//! the document; the editor applies [`TextEditSession::preview`] without
//! history while typing and [`TextEditSession::committed`] as one tracked
//! update.

use crate::registry::NodeRegistry;
use crate::shapes::{FontStyle, Shape, ShapeId, TextAlign, TextProps};
use crate::stage::Stage;

/// Font size range accepted by the editor.
pub const FONT_SIZE_RANGE: (f64, f64) = (10.0, 96.0);

/// Screen box of the overlay editor, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    /// Minimum height; grows with the content.
    pub height: f64,
    /// Rotation in degrees about `(offset_x, offset_y)`.
    pub rotation: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Stage zoom, for scaling font metrics in the overlay.
    pub zoom: f64,
}

/// An open text edit on one shape.
#[derive(Debug, Clone)]
pub struct TextEditSession {
    target: ShapeId,
    /// The shape as it was when the session opened.
    original: Shape,
    overlay: OverlayBox,
    /// Buffered text.
    pub value: String,
    pub font_size: f64,
    pub font_family: String,
    pub bold: bool,
    pub italic: bool,
    pub align: TextAlign,
    pub letter_spacing: f64,
    pub line_height: f64,
    pub padding: f64,
    pub width: f64,
    /// Fill colour of the text.
    pub color: String,
}

impl TextEditSession {
    /// Open a session over a text shape.
    ///
    /// Returns `None` for non-text shapes and shapes without a mounted node.
    pub fn open(shape: &Shape, registry: &NodeRegistry, stage: &Stage) -> Option<Self> {
        let text = shape.as_text()?;
        if !registry.contains(&shape.id) {
            log::debug!("No node mounted for {}, not editing", shape.id);
            return None;
        }
        let mut session = Self {
            target: shape.id.clone(),
            original: shape.clone(),
            overlay: OverlayBox::default(),
            value: text.text.clone(),
            font_size: text.font_size,
            font_family: text.font_family.clone(),
            bold: text.font_style.is_bold(),
            italic: text.font_style.is_italic(),
            align: text.align,
            letter_spacing: text.letter_spacing,
            line_height: text.line_height,
            padding: text.padding,
            width: shape.width,
            color: shape.style.fill.clone(),
        };
        session.resync(registry, stage);
        log::debug!("Text edit opened on {}", session.target);
        Some(session)
    }

    pub fn target(&self) -> &ShapeId {
        &self.target
    }

    pub fn original(&self) -> &Shape {
        &self.original
    }

    pub fn overlay(&self) -> OverlayBox {
        self.overlay
    }

    /// Recompute the overlay box from the node, e.g. after a window resize
    /// or scroll. Returns `false` if the node is gone.
    pub fn resync(&mut self, registry: &NodeRegistry, stage: &Stage) -> bool {
        let Some(node) = registry.get(&self.target) else {
            return false;
        };
        let origin = stage.world_to_page(node.absolute_position());
        let size = node.rendered_size();
        let offset = node.offset();
        let zoom = stage.zoom;
        self.overlay = OverlayBox {
            left: origin.x,
            top: origin.y,
            width: self.width * zoom,
            height: size.height * zoom,
            rotation: node.rotation,
            offset_x: offset.x * zoom,
            offset_y: offset.y * zoom,
            zoom,
        };
        self.grow();
        true
    }

    /// Replace the buffered text.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.grow();
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.font_size = size.clamp(FONT_SIZE_RANGE.0, FONT_SIZE_RANGE.1);
        self.grow();
    }

    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.font_family = family.into();
    }

    pub fn toggle_bold(&mut self) {
        self.bold = !self.bold;
    }

    pub fn toggle_italic(&mut self) {
        self.italic = !self.italic;
    }

    pub fn set_align(&mut self, align: TextAlign) {
        self.align = align;
    }

    pub fn set_letter_spacing(&mut self, spacing: f64) {
        self.letter_spacing = spacing;
    }

    pub fn set_line_height(&mut self, line_height: f64) {
        self.line_height = line_height.max(0.1);
        self.grow();
    }

    pub fn set_padding(&mut self, padding: f64) {
        self.padding = padding.max(0.0);
        self.grow();
    }

    pub fn set_width(&mut self, width: f64) {
        self.width = width.max(1.0);
        self.overlay.width = self.width * self.overlay.zoom;
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.color = color.into();
    }

    /// The target with only the buffered text applied (live preview).
    pub fn preview(&self, current: &Shape) -> Shape {
        let mut shape = current.clone();
        if let Some(text) = shape.as_text_mut() {
            text.text = self.value.clone();
        }
        shape
    }

    /// The original shape with every buffered adjustment folded in.
    pub fn committed(&self) -> Shape {
        let mut shape = self.original.clone();
        shape.width = self.width;
        shape.style.fill = self.color.clone();
        if let Some(text) = shape.as_text_mut() {
            *text = self.text_props();
        }
        shape
    }

    fn text_props(&self) -> TextProps {
        TextProps {
            text: self.value.clone(),
            font_size: self.font_size,
            font_family: self.font_family.clone(),
            font_style: FontStyle::compose(self.bold, self.italic),
            align: self.align,
            letter_spacing: self.letter_spacing,
            line_height: self.line_height,
            padding: self.padding,
        }
    }

    /// Grow the overlay to fit the buffered content.
    fn grow(&mut self) {
        let needed = self.text_props().content_height() * self.overlay.zoom;
        if needed > self.overlay.height {
            self.overlay.height = needed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::shapes::ShapeKind;
    use kurbo::Point;

    fn text_shape() -> Shape {
        Shape::new(ShapeKind::Text(TextProps::new("Hello")), 40.0, 60.0).with_id("t")
    }

    fn mounted(shape: &Shape) -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.sync(&Document::new().add(shape.clone()));
        registry
    }

    #[test]
    fn test_open_computes_overlay() {
        let shape = text_shape();
        let registry = mounted(&shape);
        let mut stage = Stage::new();
        stage.set_container_origin(Point::new(10.0, 80.0));

        let session = TextEditSession::open(&shape, &registry, &stage).unwrap();
        let overlay = session.overlay();
        assert!((overlay.left - 50.0).abs() < 1e-9);
        assert!((overlay.top - 140.0).abs() < 1e-9);
        assert!((overlay.width - 240.0).abs() < 1e-9);
        assert!((overlay.height - 90.0).abs() < 1e-9);
        assert_eq!(session.value, "Hello");
    }

    #[test]
    fn test_open_requires_text_and_node() {
        let rect = Shape::new(ShapeKind::Rect, 0.0, 0.0);
        let registry = mounted(&rect);
        assert!(TextEditSession::open(&rect, &registry, &Stage::new()).is_none());

        let shape = text_shape();
        assert!(TextEditSession::open(&shape, &NodeRegistry::new(), &Stage::new()).is_none());
    }

    #[test]
    fn test_resync_follows_scroll() {
        let shape = text_shape();
        let registry = mounted(&shape);
        let mut stage = Stage::new();
        let mut session = TextEditSession::open(&shape, &registry, &stage).unwrap();

        stage.set_container_origin(Point::new(0.0, -100.0));
        assert!(session.resync(&registry, &stage));
        assert!((session.overlay().top - -40.0).abs() < 1e-9);

        assert!(!session.resync(&NodeRegistry::new(), &stage));
    }

    #[test]
    fn test_committed_folds_adjustments() {
        let shape = text_shape();
        let registry = mounted(&shape);
        let mut session = TextEditSession::open(&shape, &registry, &Stage::new()).unwrap();
        session.set_value("Bye");
        session.set_font_size(200.0);
        session.toggle_bold();
        session.toggle_italic();
        session.set_width(300.0);
        session.set_color("#f00");
        session.set_align(TextAlign::Center);

        let committed = session.committed();
        let text = committed.as_text().unwrap();
        assert_eq!(text.text, "Bye");
        assert!((text.font_size - 96.0).abs() < f64::EPSILON);
        assert_eq!(text.font_style.as_str(), "bold italic");
        assert_eq!(text.align, TextAlign::Center);
        assert!((committed.width - 300.0).abs() < f64::EPSILON);
        assert_eq!(committed.style.fill, "#f00");
        assert_eq!(committed.id, "t");
    }

    #[test]
    fn test_preview_only_changes_text() {
        let shape = text_shape();
        let registry = mounted(&shape);
        let mut session = TextEditSession::open(&shape, &registry, &Stage::new()).unwrap();
        session.set_value("Typing");
        session.set_font_size(40.0);
        let preview = session.preview(&shape);
        let text = preview.as_text().unwrap();
        assert_eq!(text.text, "Typing");
        assert!((text.font_size - 22.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overlay_grows_with_content() {
        let shape = text_shape();
        let registry = mounted(&shape);
        let mut session = TextEditSession::open(&shape, &registry, &Stage::new()).unwrap();
        session.set_value("1\n2\n3\n4\n5");
        // 5 lines * 22 * 1.2
        assert!((session.overlay().height - 132.0).abs() < 1e-9);
    }
}
