//! Image decoding utilities.

use std::path::Path;

use crate::error::{Error, Result};

use super::{ColorSpace, RasterImage};

/// File extensions accepted as colorization input.
///
/// Front-ends building open-dialog filters should use this set; anything
/// else is rejected before decoding is attempted.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

/// Whether the path carries one of the accepted input extensions.
#[must_use]
pub fn is_supported_input<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Decode an image file into an RGB [`RasterImage`].
///
/// Grayscale and paletted sources are widened to three channels during
/// decoding, so every loaded buffer is `ColorSpace::Rgb` with samples in
/// `[0, 255]`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a recognized
/// raster format.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<RasterImage> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let samples = rgb.as_raw().iter().map(|&v| f32::from(v)).collect();

    RasterImage::from_samples(width, height, ColorSpace::Rgb, samples)
}
