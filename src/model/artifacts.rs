//! Locating and validating the colorization model artifacts.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ndarray_npy::ReadNpyExt;

use crate::error::{Error, Result};

use super::AB_BINS;

/// The three files that make up one colorization model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Network topology descriptor.
    Network,
    /// Learned weights, stored as ONNX external data.
    Weights,
    /// Quantized chroma cluster centers.
    Points,
}

impl ArtifactKind {
    const ALL: [Self; 3] = [Self::Network, Self::Weights, Self::Points];

    /// File name of this artifact inside the model directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Network => "colorizer.onnx",
            // ONNX file references this exact name internally
            Self::Weights => "colorizer.onnx.data",
            Self::Points => "pts_in_hull.npy",
        }
    }
}

/// Resolved location of the model artifacts.
///
/// Resolution never touches the filesystem beyond directory probing;
/// [`ModelArtifacts::verify`] reports exactly which artifact is missing.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    dir: PathBuf,
}

impl ModelArtifacts {
    /// Artifacts in an explicitly chosen directory.
    pub fn in_dir<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Resolve the model directory.
    ///
    /// An explicit directory wins; otherwise `./models` is used when it
    /// exists, falling back to the platform data directory:
    /// - Windows: `%LOCALAPPDATA%\colorit\models`
    /// - Linux: `~/.local/share/colorit/models`
    /// - macOS: `~/Library/Application Support/colorit/models`
    #[must_use]
    pub fn locate(explicit: Option<PathBuf>) -> Self {
        if let Some(dir) = explicit {
            return Self::in_dir(dir);
        }

        let local = PathBuf::from("models");
        if local.is_dir() {
            return Self::in_dir(local);
        }

        let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::in_dir(base.join("colorit").join("models"))
    }

    /// The model directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of one artifact.
    #[must_use]
    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Check that all three artifacts are present.
    ///
    /// # Errors
    ///
    /// Returns a missing-artifact error naming the first absent file.
    pub fn verify(&self) -> Result<()> {
        for kind in ArtifactKind::ALL {
            let path = self.path(kind);
            if !path.is_file() {
                return Err(Error::MissingArtifact {
                    name: kind.file_name(),
                    path,
                });
            }
        }
        Ok(())
    }

    /// Load the cluster centers as a 313x2 f32 array.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or has the
    /// wrong shape.
    pub(crate) fn load_points(&self) -> Result<Array2<f32>> {
        let path = self.path(ArtifactKind::Points);
        let bytes = fs::read(&path)?;

        let points = parse_points(&bytes).map_err(|reason| Error::MalformedPoints {
            path: path.clone(),
            reason,
        })?;

        let (rows, cols) = points.dim();
        if (rows, cols) != (AB_BINS, 2) {
            return Err(Error::MalformedPoints {
                path,
                reason: format!("expected {AB_BINS}x2 cluster centers, got {rows}x{cols}"),
            });
        }
        Ok(points)
    }
}

/// Parse the points file, accepting the dtypes it circulates with.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn parse_points(bytes: &[u8]) -> std::result::Result<Array2<f32>, String> {
    if let Ok(points) = Array2::<f32>::read_npy(Cursor::new(bytes)) {
        return Ok(points);
    }
    if let Ok(points) = Array2::<f64>::read_npy(Cursor::new(bytes)) {
        return Ok(points.mapv(|v| v as f32));
    }
    if let Ok(points) = Array2::<i64>::read_npy(Cursor::new(bytes)) {
        return Ok(points.mapv(|v| v as f32));
    }
    Err("expected a 2-D array of f32, f64 or i64".to_string())
}
