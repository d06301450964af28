//! Custom error types for colorit.

use std::path::PathBuf;
use thiserror::Error;

use crate::image::ColorSpace;

/// Main error type for the colorit library.
#[derive(Error, Debug)]
pub enum Error {
    /// A required model artifact is not present in the model directory.
    #[error("missing model artifact {name} (expected at {path})")]
    MissingArtifact { name: &'static str, path: PathBuf },

    /// The calibration points file could not be parsed.
    #[error("malformed calibration points file {path}: {reason}")]
    MalformedPoints { path: PathBuf, reason: String },

    /// Failed to load the ONNX network.
    #[error("failed to load ONNX network from {path}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: ort::Error,
    },

    /// Failed to decode an image file.
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A pipeline stage was handed a buffer in the wrong color space.
    #[error("unsupported color space {actual:?}: expected {expected}")]
    UnsupportedColorSpace {
        expected: &'static str,
        actual: ColorSpace,
    },

    /// Model inference failed.
    #[error("model inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    /// Shape mismatch in tensor or buffer operations.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The colorization worker has shut down and no longer accepts jobs.
    #[error("colorization worker has shut down")]
    WorkerStopped,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for colorit operations.
pub type Result<T> = std::result::Result<T, Error>;
