//! Paint properties shared by every shape kind.

use peniko::Color;
use serde::{Deserialize, Serialize};

fn default_fill() -> String {
    "#111".to_string()
}

fn default_stroke() -> String {
    "#000".to_string()
}

fn default_stroke_width() -> f64 {
    1.0
}

fn default_opacity() -> f64 {
    1.0
}

/// Style properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    /// Fill color as a CSS-like color string.
    #[serde(default = "default_fill")]
    pub fill: String,
    /// Stroke color as a CSS-like color string.
    #[serde(default = "default_stroke")]
    pub stroke: String,
    /// Stroke width.
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: default_fill(),
            stroke: default_stroke(),
            stroke_width: default_stroke_width(),
            opacity: default_opacity(),
        }
    }
}

impl ShapeStyle {
    /// Get the fill color with opacity applied.
    pub fn fill_with_opacity(&self) -> Color {
        with_opacity(parse_color(&self.fill).unwrap_or(Color::BLACK), self.opacity)
    }

    /// Get the stroke color with opacity applied.
    pub fn stroke_with_opacity(&self) -> Color {
        with_opacity(parse_color(&self.stroke).unwrap_or(Color::BLACK), self.opacity)
    }
}

fn with_opacity(color: Color, opacity: f64) -> Color {
    let rgba = color.to_rgba8();
    let alpha = (rgba.a as f64 * opacity.clamp(0.0, 1.0)) as u8;
    Color::from_rgba8(rgba.r, rgba.g, rgba.b, alpha)
}

/// Parse a `#rgb`, `#rrggbb`, `#rrggbbaa` or `transparent` color string.
pub fn parse_color(color: &str) -> Option<Color> {
    let color = color.trim();
    if color.eq_ignore_ascii_case("transparent") {
        return Some(Color::from_rgba8(0, 0, 0, 0));
    }

    let hex = color.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            // #rgb -> #rrggbb
            let r = channel(&hex[0..1])? * 17;
            let g = channel(&hex[1..2])? * 17;
            let b = channel(&hex[2..3])? * 17;
            Some(Color::from_rgba8(r, g, b, 255))
        }
        6 => Some(Color::from_rgba8(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            255,
        )),
        8 => Some(Color::from_rgba8(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_hex() {
        let color = parse_color("#111").unwrap().to_rgba8();
        assert_eq!((color.r, color.g, color.b, color.a), (17, 17, 17, 255));
    }

    #[test]
    fn test_parse_long_hex_and_alpha() {
        let color = parse_color("#ff8000").unwrap().to_rgba8();
        assert_eq!((color.r, color.g, color.b, color.a), (255, 128, 0, 255));

        let color = parse_color("#00000080").unwrap().to_rgba8();
        assert_eq!(color.a, 128);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_color("red").is_none());
        assert!(parse_color("#12").is_none());
        assert!(parse_color("#zzzzzz").is_none());
    }

    #[test]
    fn test_opacity_applied() {
        let style = ShapeStyle {
            opacity: 0.5,
            ..ShapeStyle::default()
        };
        assert_eq!(style.fill_with_opacity().to_rgba8().a, 127);
    }
}
