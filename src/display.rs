//! Display-layer contract: viewport fitting and preview renditions.
//!
//! Consumers hold the last received [`ColorizationResult`] and re-render
//! from it on every viewport resize; the pipeline is never re-run just to
//! redraw.
//!
//! [`ColorizationResult`]: crate::pipeline::ColorizationResult

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::Result;
use crate::image::RasterImage;

/// Scaled dimensions for an image inside a viewport.
///
/// Both axes are scaled by the same uniform factor,
/// `min(viewport_w / w, viewport_h / h)`, preserving aspect ratio; small
/// images may scale up. Scaled dimensions never collapse below one pixel.
/// Returns `None` when either the image or the viewport has a zero
/// dimension.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn fit_to_viewport(image: (u32, u32), viewport: (u32, u32)) -> Option<(u32, u32)> {
    let (width, height) = image;
    let (viewport_w, viewport_h) = viewport;
    if width == 0 || height == 0 || viewport_w == 0 || viewport_h == 0 {
        return None;
    }

    let ratio = (viewport_w as f32 / width as f32).min(viewport_h as f32 / height as f32);

    // Safe: ratio is positive; truncation here is the fit rule, with a
    // one-pixel floor
    let scaled = |dim: u32| ((dim as f32 * ratio) as u32).max(1);
    Some((scaled(width), scaled(height)))
}

/// Render an 8-bit preview of a display-range buffer, fitted to the
/// viewport with Lanczos resampling.
///
/// Returns `Ok(None)` for a degenerate viewport; callers simply skip the
/// redraw in that case.
///
/// # Errors
///
/// Returns an error if the buffer is not displayable.
pub fn render_preview(image: &RasterImage, viewport: (u32, u32)) -> Result<Option<RgbImage>> {
    let Some((width, height)) = fit_to_viewport(image.dimensions(), viewport) else {
        return Ok(None);
    };

    let rgb = image.to_rgb8()?;
    if (width, height) == image.dimensions() {
        return Ok(Some(rgb));
    }
    Ok(Some(imageops::resize(
        &rgb,
        width,
        height,
        FilterType::Lanczos3,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::image::ColorSpace;

    #[test]
    fn test_fit_uses_the_smaller_ratio() {
        assert_eq!(fit_to_viewport((400, 300), (200, 200)), Some((200, 150)));
        assert_eq!(fit_to_viewport((300, 400), (200, 200)), Some((150, 200)));
    }

    #[test]
    fn test_fit_may_upscale() {
        assert_eq!(fit_to_viewport((10, 10), (100, 50)), Some((50, 50)));
    }

    #[test]
    fn test_fit_never_collapses_to_zero() {
        assert_eq!(fit_to_viewport((1000, 1), (10, 10)), Some((10, 1)));
    }

    #[test]
    fn test_fit_rejects_degenerate_inputs() {
        assert_eq!(fit_to_viewport((0, 100), (50, 50)), None);
        assert_eq!(fit_to_viewport((100, 100), (0, 50)), None);
    }

    #[test]
    fn test_preview_is_fitted() {
        let image =
            RasterImage::from_samples(8, 4, ColorSpace::Gray, vec![100.0; 32]).unwrap();
        let preview = render_preview(&image, (4, 4)).unwrap().unwrap();
        assert_eq!(preview.dimensions(), (4, 2));
    }

    #[test]
    fn test_preview_skips_degenerate_viewport() {
        let image = RasterImage::from_samples(8, 4, ColorSpace::Gray, vec![100.0; 32]).unwrap();
        assert!(render_preview(&image, (0, 4)).unwrap().is_none());
    }

    #[test]
    fn test_preview_rejects_lab() {
        let image =
            RasterImage::from_samples(1, 1, ColorSpace::Lab, vec![50.0, 0.0, 0.0]).unwrap();
        assert!(render_preview(&image, (10, 10)).is_err());
    }
}
