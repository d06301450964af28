//! Color-space transforms for the colorization pipeline.
//!
//! Pure functions over [`RasterImage`] buffers. The LAB conversion is the
//! sRGB-referenced CIELAB path (transfer-function decode to linear RGB,
//! then the D65 matrix and cube-root lightness), which is the convention
//! the predictor was calibrated against.

use palette::{FromColor, IntoColor, Lab, LinSrgb, Srgb};

use crate::error::{Error, Result};
use crate::image::{ColorSpace, RasterImage};
use crate::model::{LightnessPlane, PredictedChannels, INPUT_SIZE, LIGHTNESS_OFFSET};

/// Rec.601 luma weights.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// Convert an image to its luma rendition, replicated to three channels
/// for display.
///
/// # Errors
///
/// Returns an error for `Lab` buffers.
pub fn to_grayscale_display(image: &RasterImage) -> Result<RasterImage> {
    let mut samples = Vec::with_capacity(image.samples().len() / image.channels() * 3);

    match image.color_space() {
        ColorSpace::Gray => {
            for &v in image.samples() {
                samples.extend_from_slice(&[v, v, v]);
            }
        }
        ColorSpace::Rgb | ColorSpace::Bgr => {
            let (ri, gi, bi) = rgb_order(image.color_space())?;
            for px in image.samples().chunks_exact(3) {
                let luma = LUMA_B.mul_add(px[bi], LUMA_R.mul_add(px[ri], LUMA_G * px[gi]));
                samples.extend_from_slice(&[luma, luma, luma]);
            }
        }
        ColorSpace::Lab => {
            return Err(Error::UnsupportedColorSpace {
                expected: "Gray, Rgb or Bgr",
                actual: ColorSpace::Lab,
            })
        }
    }

    RasterImage::from_samples(image.width(), image.height(), ColorSpace::Rgb, samples)
}

/// Derive the predictor input from a color image.
///
/// Normalizes samples to `[0, 1]`, converts to LAB, resizes the lightness
/// channel to 224x224 and shifts it by the calibration offset. Returns the
/// plane together with the full-resolution LAB buffer, whose lightness
/// channel is reused unresized during reconstruction.
///
/// # Errors
///
/// Returns an error unless the input is an `Rgb` or `Bgr` buffer.
pub fn extract_lightness_plane(image: &RasterImage) -> Result<(LightnessPlane, RasterImage)> {
    let full_lab = to_lab(image)?;

    let lightness: Vec<f32> = full_lab
        .samples()
        .chunks_exact(3)
        .map(|px| px[0])
        .collect();

    let resized = resize_bilinear(
        &lightness,
        image.width(),
        image.height(),
        1,
        INPUT_SIZE,
        INPUT_SIZE,
    );

    let values = resized.iter().map(|&l| l - LIGHTNESS_OFFSET).collect();
    Ok((LightnessPlane::new(values)?, full_lab))
}

/// Rebuild a display-range RGB image from the full-resolution lightness
/// channel and the predicted chroma planes.
///
/// The chroma planes are bilinearly resized to the target dimensions; the
/// lightness channel is taken from `full_lab` as-is. Every reconstructed
/// component is hard-clamped to the displayable gamut before rescaling to
/// `[0, 255]`; out-of-range predictions are clipped, never wrapped.
///
/// # Errors
///
/// Returns an error if `full_lab` is not a LAB buffer or its dimensions do
/// not match the target.
pub fn merge_and_reconstruct(
    full_lab: &RasterImage,
    predicted: &PredictedChannels,
    target_width: u32,
    target_height: u32,
) -> Result<RasterImage> {
    if full_lab.color_space() != ColorSpace::Lab {
        return Err(Error::UnsupportedColorSpace {
            expected: "Lab",
            actual: full_lab.color_space(),
        });
    }
    if full_lab.dimensions() != (target_width, target_height) {
        return Err(Error::ShapeMismatch {
            expected: format!("{target_width}x{target_height} LAB buffer"),
            actual: format!("{}x{}", full_lab.width(), full_lab.height()),
        });
    }

    let a = resize_bilinear(
        predicted.a(),
        predicted.width(),
        predicted.height(),
        1,
        target_width,
        target_height,
    );
    let b = resize_bilinear(
        predicted.b(),
        predicted.width(),
        predicted.height(),
        1,
        target_width,
        target_height,
    );

    let mut samples = Vec::with_capacity(a.len() * 3);
    for (i, (&ap, &bp)) in a.iter().zip(&b).enumerate() {
        let l = full_lab.samples()[i * 3];
        let (r, g, bl) = lab_to_rgb(l, ap, bp);
        samples.push(r.clamp(0.0, 1.0) * 255.0);
        samples.push(g.clamp(0.0, 1.0) * 255.0);
        samples.push(bl.clamp(0.0, 1.0) * 255.0);
    }

    RasterImage::from_samples(target_width, target_height, ColorSpace::Rgb, samples)
}

/// Sample indices of (r, g, b) for a three-channel color space.
fn rgb_order(color_space: ColorSpace) -> Result<(usize, usize, usize)> {
    match color_space {
        ColorSpace::Rgb => Ok((0, 1, 2)),
        ColorSpace::Bgr => Ok((2, 1, 0)),
        other => Err(Error::UnsupportedColorSpace {
            expected: "Rgb or Bgr",
            actual: other,
        }),
    }
}

/// Convert a display-range color buffer to LAB.
fn to_lab(image: &RasterImage) -> Result<RasterImage> {
    let (ri, gi, bi) = rgb_order(image.color_space())?;

    let mut samples = Vec::with_capacity(image.samples().len());
    for px in image.samples().chunks_exact(3) {
        let (l, a, b) = rgb_to_lab(px[ri] / 255.0, px[gi] / 255.0, px[bi] / 255.0);
        samples.extend_from_slice(&[l, a, b]);
    }

    RasterImage::from_samples(image.width(), image.height(), ColorSpace::Lab, samples)
}

/// `[0, 1]` sRGB to LAB (L in `[0, 100]`, a/b centered on zero).
fn rgb_to_lab(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let linear: LinSrgb<f32> = Srgb::new(r, g, b).into_linear();
    let lab: Lab = Lab::from_color(linear);
    (lab.l, lab.a, lab.b)
}

/// LAB back to `[0, 1]` sRGB display components; the conversion clamps
/// out-of-gamut inputs into range.
fn lab_to_rgb(l: f32, a: f32, b: f32) -> (f32, f32, f32) {
    let linear: LinSrgb<f32> = Lab::new(l, a, b).into_color();
    let rgb: Srgb<f32> = Srgb::from_linear(linear);
    (rgb.red, rgb.green, rgb.blue)
}

/// Pixel-center-aligned bilinear resampling for interleaved f32 buffers.
///
/// The `image` crate's float resampler clamps samples into `[0, 1]` and
/// cannot carry LAB-range values, so the pipeline filters its own buffers.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn resize_bilinear(
    src: &[f32],
    src_width: u32,
    src_height: u32,
    channels: usize,
    dst_width: u32,
    dst_height: u32,
) -> Vec<f32> {
    if (src_width, src_height) == (dst_width, dst_height) {
        return src.to_vec();
    }
    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return Vec::new();
    }

    let idx =
        |x: u32, y: u32, c: usize| (y as usize * src_width as usize + x as usize) * channels + c;

    let scale_x = src_width as f32 / dst_width as f32;
    let scale_y = src_height as f32 / dst_height as f32;

    let mut out = Vec::with_capacity(dst_width as usize * dst_height as usize * channels);
    for dy in 0..dst_height {
        let sy = (dy as f32 + 0.5).mul_add(scale_y, -0.5).max(0.0);
        // Safe: sy is non-negative and bounded by the source height
        let y0 = (sy.floor() as u32).min(src_height - 1);
        let y1 = (y0 + 1).min(src_height - 1);
        let ty = sy - y0 as f32;

        for dx in 0..dst_width {
            let sx = (dx as f32 + 0.5).mul_add(scale_x, -0.5).max(0.0);
            let x0 = (sx.floor() as u32).min(src_width - 1);
            let x1 = (x0 + 1).min(src_width - 1);
            let tx = sx - x0 as f32;

            for c in 0..channels {
                let tl = src[idx(x0, y0, c)];
                let tr = src[idx(x1, y0, c)];
                let bl = src[idx(x0, y1, c)];
                let br = src[idx(x1, y1, c)];

                let top = (tr - tl).mul_add(tx, tl);
                let bottom = (br - bl).mul_add(tx, bl);
                out.push((bottom - top).mul_add(ty, top));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(width: u32, height: u32) -> RasterImage {
        let mut samples = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                samples.push((x % 256) as f32);
                samples.push((y % 256) as f32);
                samples.push(((x + y) % 256) as f32);
            }
        }
        RasterImage::from_samples(width, height, ColorSpace::Rgb, samples).unwrap()
    }

    #[test]
    fn test_grayscale_display_replicates_luma() {
        let image =
            RasterImage::from_samples(1, 1, ColorSpace::Rgb, vec![255.0, 0.0, 0.0]).unwrap();
        let gray = to_grayscale_display(&image).unwrap();

        assert_eq!(gray.color_space(), ColorSpace::Rgb);
        let px = gray.samples();
        assert!((px[0] - 76.245).abs() < 1e-3);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn test_grayscale_display_honors_channel_order() {
        let rgb =
            RasterImage::from_samples(1, 1, ColorSpace::Rgb, vec![10.0, 20.0, 250.0]).unwrap();
        let bgr =
            RasterImage::from_samples(1, 1, ColorSpace::Bgr, vec![250.0, 20.0, 10.0]).unwrap();

        let from_rgb = to_grayscale_display(&rgb).unwrap();
        let from_bgr = to_grayscale_display(&bgr).unwrap();
        assert_eq!(from_rgb.samples(), from_bgr.samples());
    }

    #[test]
    fn test_grayscale_display_rejects_lab() {
        let lab = RasterImage::from_samples(1, 1, ColorSpace::Lab, vec![50.0, 0.0, 0.0]).unwrap();
        assert!(matches!(
            to_grayscale_display(&lab),
            Err(Error::UnsupportedColorSpace { .. })
        ));
    }

    #[test]
    fn test_lightness_plane_is_always_network_sized() {
        for (w, h) in [(100, 200), (800, 600), (50, 50)] {
            let (plane, full_lab) = extract_lightness_plane(&gradient_image(w, h)).unwrap();
            assert_eq!(
                plane.values().len(),
                INPUT_SIZE as usize * INPUT_SIZE as usize
            );
            assert_eq!(full_lab.dimensions(), (w, h));
            assert_eq!(full_lab.color_space(), ColorSpace::Lab);
        }
    }

    #[test]
    fn test_lightness_plane_is_mean_shifted() {
        let white = RasterImage::from_samples(
            2,
            2,
            ColorSpace::Rgb,
            vec![255.0; 12],
        )
        .unwrap();
        let (plane, _) = extract_lightness_plane(&white).unwrap();

        // L of white is 100, shifted down by the calibration offset
        for &v in plane.values() {
            assert!((v - 50.0).abs() < 0.1);
        }
    }

    #[test]
    fn test_lightness_plane_matches_srgb_referenced_lab() {
        let gray =
            RasterImage::from_samples(3, 3, ColorSpace::Rgb, vec![127.5; 27]).unwrap();
        let (plane, _) = extract_lightness_plane(&gray).unwrap();

        // L* of sRGB mid gray is 53.39, shifted down by the calibration offset
        for &v in plane.values() {
            assert!((v - 3.39).abs() < 0.05, "plane value {v}");
        }
    }

    #[test]
    fn test_extraction_rejects_gray() {
        let gray = RasterImage::from_samples(2, 2, ColorSpace::Gray, vec![0.0; 4]).unwrap();
        assert!(matches!(
            extract_lightness_plane(&gray),
            Err(Error::UnsupportedColorSpace { .. })
        ));
    }

    #[test]
    fn test_lab_of_gray_has_no_chroma() {
        let (l, a, b) = rgb_to_lab(0.5, 0.5, 0.5);
        assert!(a.abs() < 1e-3);
        assert!(b.abs() < 1e-3);
        // sRGB mid gray decodes to linear 0.214, so L* sits at 53.39
        assert!((l - 53.389).abs() < 0.05);
    }

    #[test]
    fn test_lab_round_trip() {
        let colors = [
            (0.0, 0.0, 0.0),
            (1.0, 1.0, 1.0),
            (1.0, 0.0, 0.0),
            (0.2, 0.7, 0.4),
            (0.9, 0.05, 0.6),
        ];
        for (r, g, b) in colors {
            let (l, a, bb) = rgb_to_lab(r, g, b);
            let (r2, g2, b2) = lab_to_rgb(l, a, bb);
            assert!((r - r2).abs() < 1e-3, "r {r} -> {r2}");
            assert!((g - g2).abs() < 1e-3, "g {g} -> {g2}");
            assert!((b - b2).abs() < 1e-3, "b {b} -> {b2}");
        }
    }

    #[test]
    fn test_bilinear_identity() {
        let src = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(resize_bilinear(&src, 2, 2, 1, 2, 2), src);
    }

    #[test]
    fn test_bilinear_upscale_interpolates_between_centers() {
        let out = resize_bilinear(&[0.0, 10.0], 2, 1, 1, 4, 1);
        assert_eq!(out, vec![0.0, 2.5, 7.5, 10.0]);
    }

    #[test]
    fn test_bilinear_downscale_averages() {
        let out = resize_bilinear(&[0.0, 10.0, 20.0, 30.0], 4, 1, 1, 2, 1);
        assert_eq!(out, vec![5.0, 25.0]);
    }

    fn uniform_prediction(a: f32, b: f32, width: u32, height: u32) -> PredictedChannels {
        let n = width as usize * height as usize;
        PredictedChannels::new(vec![a; n], vec![b; n], width, height).unwrap()
    }

    #[test]
    fn test_reconstruction_is_idempotent() {
        let image = gradient_image(16, 12);
        let (_, full_lab) = extract_lightness_plane(&image).unwrap();
        let predicted = uniform_prediction(15.0, -20.0, 4, 3);

        let first = merge_and_reconstruct(&full_lab, &predicted, 16, 12).unwrap();
        let second = merge_and_reconstruct(&full_lab, &predicted, 16, 12).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reconstruction_clamps_gamut() {
        let image = gradient_image(8, 8);
        let (_, full_lab) = extract_lightness_plane(&image).unwrap();

        for (a, b) in [(500.0, 500.0), (-500.0, -500.0), (500.0, -500.0)] {
            let predicted = uniform_prediction(a, b, 8, 8);
            let out = merge_and_reconstruct(&full_lab, &predicted, 8, 8).unwrap();
            for &v in out.samples() {
                assert!((0.0..=255.0).contains(&v), "sample {v} out of range");
            }
        }
    }

    #[test]
    fn test_reconstruction_restores_original_dimensions() {
        for (w, h) in [(100, 200), (800, 600), (50, 50)] {
            let image = gradient_image(w, h);
            let (_, full_lab) = extract_lightness_plane(&image).unwrap();
            let predicted = uniform_prediction(0.0, 0.0, 56, 56);

            let out = merge_and_reconstruct(&full_lab, &predicted, w, h).unwrap();
            assert_eq!(out.dimensions(), (w, h));
            assert_eq!(out.color_space(), ColorSpace::Rgb);
            assert_eq!(out.channels(), 3);
        }
    }

    #[test]
    fn test_reconstruction_rejects_mismatched_lab_buffer() {
        let image = gradient_image(10, 10);
        let (_, full_lab) = extract_lightness_plane(&image).unwrap();
        let predicted = uniform_prediction(0.0, 0.0, 4, 4);

        assert!(matches!(
            merge_and_reconstruct(&full_lab, &predicted, 20, 20),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            merge_and_reconstruct(&image, &predicted, 10, 10),
            Err(Error::UnsupportedColorSpace { .. })
        ));
    }

    #[test]
    fn test_neutral_chroma_round_trips_lightness() {
        let gray_value = 128.0;
        let image =
            RasterImage::from_samples(4, 4, ColorSpace::Rgb, vec![gray_value; 48]).unwrap();
        let (_, full_lab) = extract_lightness_plane(&image).unwrap();
        let predicted = uniform_prediction(0.0, 0.0, 2, 2);

        let out = merge_and_reconstruct(&full_lab, &predicted, 4, 4).unwrap();
        for &v in out.samples() {
            assert!((v - gray_value).abs() < 0.5, "sample {v}");
        }
    }
}
