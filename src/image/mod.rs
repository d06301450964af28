//! Image buffers, loading, and saving utilities.

mod load;
mod save;

pub use load::{is_supported_input, load_image, SUPPORTED_EXTENSIONS};
pub use save::{default_output_path, save_image};

use image::RgbImage;

use crate::error::{Error, Result};

/// Number of channels in color buffers.
pub const COLOR_CHANNELS: usize = 3;

/// Color space of a [`RasterImage`] buffer.
///
/// `Gray`, `Rgb` and `Bgr` samples live in the 8-bit display range
/// `[0, 255]`; `Lab` samples use the natural LAB ranges (L in `[0, 100]`,
/// a/b roughly `[-128, 127]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Single-channel luma.
    Gray,
    /// Three channels, red first.
    Rgb,
    /// Three channels, blue first.
    Bgr,
    /// Three channels: lightness, then the two chroma axes.
    Lab,
}

impl ColorSpace {
    /// Number of interleaved channels a buffer in this color space carries.
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb | Self::Bgr | Self::Lab => COLOR_CHANNELS,
        }
    }
}

/// An owned pixel buffer with explicit dimensions and color-space tag.
///
/// Samples are interleaved row-major `f32`. The channel count is derived
/// from the color-space tag, so tag and layout cannot disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    color_space: ColorSpace,
    samples: Vec<f32>,
}

impl RasterImage {
    /// Create a buffer from interleaved samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample count does not match
    /// `width * height * channels` for the given color space.
    pub fn from_samples(
        width: u32,
        height: u32,
        color_space: ColorSpace,
        samples: Vec<f32>,
    ) -> Result<Self> {
        let expected = width as usize * height as usize * color_space.channels();
        if samples.len() != expected {
            return Err(Error::ShapeMismatch {
                expected: format!("{width}x{height}x{} samples", color_space.channels()),
                actual: format!("{} samples", samples.len()),
            });
        }
        Ok(Self {
            width,
            height,
            color_space,
            samples,
        })
    }

    /// Buffer width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Buffer height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Width and height as a pair.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Color space of the samples.
    #[must_use]
    pub const fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    /// Number of interleaved channels.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.color_space.channels()
    }

    /// Interleaved row-major samples.
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// One sample; `x`/`y` must be in bounds and `channel` below the
    /// channel count.
    #[inline]
    #[must_use]
    pub fn sample(&self, x: u32, y: u32, channel: usize) -> f32 {
        let idx = (y as usize * self.width as usize + x as usize) * self.channels() + channel;
        self.samples[idx]
    }

    /// Render to an 8-bit RGB buffer for display or saving.
    ///
    /// Samples are clamped to `[0, 255]` and rounded. `Gray` is replicated
    /// across the three output channels, `Bgr` is reordered.
    ///
    /// # Errors
    ///
    /// Returns an error for `Lab` buffers; they must be reconstructed to
    /// RGB first.
    pub fn to_rgb8(&self) -> Result<RgbImage> {
        let triple = |r: f32, g: f32, b: f32| [quantize(r), quantize(g), quantize(b)];

        let mut out = RgbImage::new(self.width, self.height);
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            pixel.0 = match self.color_space {
                ColorSpace::Gray => {
                    let v = self.sample(x, y, 0);
                    triple(v, v, v)
                }
                ColorSpace::Rgb => {
                    triple(self.sample(x, y, 0), self.sample(x, y, 1), self.sample(x, y, 2))
                }
                ColorSpace::Bgr => {
                    triple(self.sample(x, y, 2), self.sample(x, y, 1), self.sample(x, y, 0))
                }
                ColorSpace::Lab => {
                    return Err(Error::UnsupportedColorSpace {
                        expected: "Gray, Rgb or Bgr",
                        actual: ColorSpace::Lab,
                    })
                }
            };
        }
        Ok(out)
    }
}

/// Quantize a display-range sample to one byte with clamping.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantize(value: f32) -> u8 {
    // Safe: clamped to [0, 255] before casting
    value.clamp(0.0, 255.0).round() as u8
}
