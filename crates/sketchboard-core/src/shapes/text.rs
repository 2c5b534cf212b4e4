//! Text shape attributes.

use serde::{Deserialize, Serialize};

/// Font stack used when a record carries no family.
pub const DEFAULT_FONT_FAMILY: &str =
    "Inter, system-ui, -apple-system, Segoe UI, Roboto, sans-serif";

fn default_text() -> String {
    "Double-click to edit".to_string()
}

fn default_font_size() -> f64 {
    TextProps::DEFAULT_FONT_SIZE
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn default_line_height() -> f64 {
    1.2
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// CSS-like font style string such as `"normal"`, `"bold"` or `"bold italic"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontStyle(String);

impl Default for FontStyle {
    fn default() -> Self {
        Self("normal".to_string())
    }
}

impl FontStyle {
    /// Compose a style string from weight and slant flags.
    pub fn compose(bold: bool, italic: bool) -> Self {
        let style = match (bold, italic) {
            (true, true) => "bold italic",
            (true, false) => "bold",
            (false, true) => "italic",
            (false, false) => "normal",
        };
        Self(style.to_string())
    }

    pub fn is_bold(&self) -> bool {
        self.0.to_lowercase().contains("bold")
    }

    pub fn is_italic(&self) -> bool {
        self.0.to_lowercase().contains("italic")
    }

    /// CSS font weight for the overlay editor.
    pub fn weight(&self) -> u16 {
        if self.is_bold() { 700 } else { 400 }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Variant fields of a text shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextProps {
    /// The text content.
    #[serde(default = "default_text")]
    pub text: String,
    /// Font size in pixels.
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub align: TextAlign,
    /// Extra spacing between characters in pixels.
    #[serde(default)]
    pub letter_spacing: f64,
    /// Line height as a multiple of the font size.
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    /// Inner padding in pixels.
    #[serde(default)]
    pub padding: f64,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            text: default_text(),
            font_size: default_font_size(),
            font_family: default_font_family(),
            font_style: FontStyle::default(),
            align: TextAlign::default(),
            letter_spacing: 0.0,
            line_height: default_line_height(),
            padding: 0.0,
        }
    }
}

impl TextProps {
    /// Default font size.
    pub const DEFAULT_FONT_SIZE: f64 = 22.0;

    /// Create text props with the given content and default font attributes.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Number of laid-out lines, counting a trailing newline.
    pub fn line_count(&self) -> usize {
        let lines = self.text.lines().count().max(1);
        if self.text.ends_with('\n') { lines + 1 } else { lines }
    }

    /// Height the content needs, used to grow the overlay editor.
    pub fn content_height(&self) -> f64 {
        self.line_count() as f64 * self.font_size * self.line_height + self.padding * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_style_flags() {
        assert!(!FontStyle::default().is_bold());
        assert!(FontStyle::compose(true, false).is_bold());
        assert!(FontStyle::compose(false, true).is_italic());
        assert_eq!(FontStyle::compose(true, true).as_str(), "bold italic");
        assert_eq!(FontStyle::compose(true, false).weight(), 700);
    }

    #[test]
    fn test_content_height() {
        let mut props = TextProps::new("one\ntwo");
        props.font_size = 10.0;
        props.line_height = 1.5;
        props.padding = 2.0;
        assert!((props.content_height() - 34.0).abs() < 1e-9);

        props.text = "trailing\n".to_string();
        assert_eq!(props.line_count(), 2);
    }
}
