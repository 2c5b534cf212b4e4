//! Image shape attributes.

use serde::{Deserialize, Serialize};

/// Variant fields of an image shape.
///
/// The raster itself is never stored in the document; `src` is a reference
/// (URL) the shell resolves and loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageProps {
    /// Image reference.
    pub src: String,
}

impl ImageProps {
    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into() }
    }

    /// Fit a natural size into `max_width` × `max_height`, preserving aspect
    /// ratio and never upscaling.
    pub fn fit_within(
        natural_width: f64,
        natural_height: f64,
        max_width: f64,
        max_height: f64,
    ) -> (f64, f64) {
        if natural_width <= 0.0 || natural_height <= 0.0 {
            return (max_width, max_height);
        }
        let scale = (max_width / natural_width).min(max_height / natural_height).min(1.0);
        (natural_width * scale, natural_height * scale)
    }
}
