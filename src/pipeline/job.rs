//! One end-to-end colorization job.

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::image::{self, RasterImage};
use crate::model::Predict;

use super::colorspace;

/// The output pair of a completed job.
///
/// Owned by whichever thread last received it; the worker moves it into
/// the delivery channel and never touches it again.
#[derive(Debug, Clone)]
pub struct ColorizationResult {
    /// Luma rendition of the source, replicated to three channels.
    pub grayscale_display: RasterImage,
    /// Reconstructed color image at the source dimensions.
    pub colorized: RasterImage,
    /// File name of the source image.
    pub source_name: String,
}

/// Orchestrates decode, plane extraction, prediction and reconstruction
/// for one input path.
pub struct ColorizationJob {
    predictor: Arc<dyn Predict>,
}

impl ColorizationJob {
    /// Create a job runner bound to a loaded predictor.
    #[must_use]
    pub fn new(predictor: Arc<dyn Predict>) -> Self {
        Self { predictor }
    }

    /// Run one colorization to completion.
    ///
    /// The stages run in order: decode, grayscale display copy, lightness
    /// extraction, inference, reconstruction at the source dimensions.
    /// The first failing stage is the job's terminal outcome; no partial
    /// result is ever returned.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the file cannot be parsed as an image, an
    /// inference error if the forward pass fails, or a shape error if a
    /// stage contract is violated.
    pub fn run<P: AsRef<Path>>(&self, path: P) -> Result<ColorizationResult> {
        let path = path.as_ref();

        tracing::info!("Decoding {}", path.display());
        let original = image::load_image(path)?;
        let (width, height) = original.dimensions();

        let grayscale_display = colorspace::to_grayscale_display(&original)?;
        let (plane, full_lab) = colorspace::extract_lightness_plane(&original)?;

        tracing::info!("Running inference");
        let predicted = self.predictor.predict(&plane)?;

        tracing::info!("Reconstructing at {width}x{height}");
        let colorized = colorspace::merge_and_reconstruct(&full_lab, &predicted, width, height)?;

        let source_name = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );

        Ok(ColorizationResult {
            grayscale_display,
            colorized,
            source_name,
        })
    }
}
