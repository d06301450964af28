//! The pretrained colorization predictor and its on-disk artifacts.

mod artifacts;
mod predictor;

pub use artifacts::{ArtifactKind, ModelArtifacts};
pub use predictor::Predictor;

use crate::error::{Error, Result};

/// Spatial side length of the network input plane.
pub const INPUT_SIZE: u32 = 224;

/// Number of quantized chroma cluster centers the network classifies over.
pub const AB_BINS: usize = 313;

/// Fixed rebalancing gain applied to the chroma logits before the softmax.
pub const REBALANCE_GAIN: f32 = 2.606;

/// Mean shift applied to the lightness channel before inference, matching
/// the normalization the network was trained with.
pub const LIGHTNESS_OFFSET: f32 = 50.0;

/// The network input: a 224x224 lightness plane, already mean-shifted by
/// [`LIGHTNESS_OFFSET`]. Scoped to a single predict call.
#[derive(Debug, Clone)]
pub struct LightnessPlane {
    values: Vec<f32>,
}

impl LightnessPlane {
    /// Wrap a row-major 224x224 plane.
    ///
    /// # Errors
    ///
    /// Returns an error if the value count is not exactly
    /// `INPUT_SIZE * INPUT_SIZE`.
    pub fn new(values: Vec<f32>) -> Result<Self> {
        let expected = INPUT_SIZE as usize * INPUT_SIZE as usize;
        if values.len() != expected {
            return Err(Error::ShapeMismatch {
                expected: format!("{INPUT_SIZE}x{INPUT_SIZE} plane ({expected} values)"),
                actual: format!("{} values", values.len()),
            });
        }
        Ok(Self { values })
    }

    /// Row-major plane values.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Predicted chroma planes at whatever resolution the network produced.
///
/// The planes are resized to the original image dimensions during merge;
/// they are never consumed at their native resolution.
#[derive(Debug, Clone)]
pub struct PredictedChannels {
    a: Vec<f32>,
    b: Vec<f32>,
    width: u32,
    height: u32,
}

impl PredictedChannels {
    /// Wrap two row-major chroma planes of the given dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if either plane's length does not match
    /// `width * height`.
    pub fn new(a: Vec<f32>, b: Vec<f32>, width: u32, height: u32) -> Result<Self> {
        let expected = width as usize * height as usize;
        if a.len() != expected || b.len() != expected {
            return Err(Error::ShapeMismatch {
                expected: format!("two {width}x{height} planes ({expected} values each)"),
                actual: format!("{} and {} values", a.len(), b.len()),
            });
        }
        Ok(Self {
            a,
            b,
            width,
            height,
        })
    }

    /// Row-major a-channel values.
    #[must_use]
    pub fn a(&self) -> &[f32] {
        &self.a
    }

    /// Row-major b-channel values.
    #[must_use]
    pub fn b(&self) -> &[f32] {
        &self.b
    }

    /// Plane width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Plane height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// A loaded colorization model.
///
/// Jobs and the task runner depend on this trait rather than on the
/// concrete [`Predictor`], so the pipeline can be driven by a stand-in
/// without model artifacts on disk.
pub trait Predict: Send + Sync {
    /// Run one forward pass over a lightness plane.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the output violates the
    /// expected tensor shape.
    fn predict(&self, plane: &LightnessPlane) -> Result<PredictedChannels>;
}
