//! The ONNX-backed colorization predictor.

use std::sync::Mutex;

use ndarray::{Array2, Array4};
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};

use super::{
    ArtifactKind, LightnessPlane, ModelArtifacts, Predict, PredictedChannels, AB_BINS, INPUT_SIZE,
    REBALANCE_GAIN,
};

/// A colorization network session plus its calibrated chroma decode head.
///
/// The network ends at the 313-way chroma classification logits. The decode
/// head turns those logits into per-pixel (a, b) values; it is built from
/// the points artifact once at load time and applied after every forward
/// pass.
#[derive(Debug)]
pub struct Predictor {
    session: Mutex<Session>,
    centers: Array2<f32>,
}

impl Predictor {
    /// Load the predictor from its three on-disk artifacts.
    ///
    /// All artifacts are verified before the inference runtime touches any
    /// of them. A failed load is fatal: the application must not reach an
    /// operable state without a predictor.
    ///
    /// # Errors
    ///
    /// Returns an error if any artifact is missing or malformed, or if the
    /// ONNX session cannot be created.
    pub fn load(artifacts: &ModelArtifacts) -> Result<Self> {
        artifacts.verify()?;

        let network = artifacts.path(ArtifactKind::Network);
        tracing::info!("Loading colorization network from {}", network.display());

        let session = Session::builder()
            .map_err(|source| Error::ModelLoad {
                path: network.clone(),
                source,
            })?
            .commit_from_file(&network)
            .map_err(|source| Error::ModelLoad {
                path: network.clone(),
                source,
            })?;

        let centers = artifacts.load_points()?;

        tracing::info!("Predictor ready ({AB_BINS} chroma bins)");

        Ok(Self {
            session: Mutex::new(session),
            centers,
        })
    }

    /// Run the network over one input plane, returning the chroma logits.
    fn forward(&self, plane: &LightnessPlane) -> Result<Array4<f32>> {
        let side = INPUT_SIZE as usize;
        let input =
            Array4::from_shape_vec((1, 1, side, side), plane.values().to_vec()).map_err(|_| {
                Error::ShapeMismatch {
                    expected: format!("1x1x{side}x{side} input"),
                    actual: format!("{} values", plane.values().len()),
                }
            })?;

        let input_value =
            Tensor::from_array(input).map_err(|source| Error::Inference { source })?;

        // run() needs &mut; the lock also serializes forward passes if the
        // predictor is ever shared across threads.
        let mut session = match self.session.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|source| Error::Inference { source })?;

        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ShapeMismatch {
                expected: "chroma logits output".to_string(),
                actual: "no output".to_string(),
            })?;

        extract_logits(&output)
    }
}

impl Predict for Predictor {
    fn predict(&self, plane: &LightnessPlane) -> Result<PredictedChannels> {
        let logits = self.forward(plane)?;
        project_chroma(&logits, &self.centers)
    }
}

/// Extract the (1, 313, H, W) logits from an ONNX value.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn extract_logits(value: &ort::value::ValueRef<'_>) -> Result<Array4<f32>> {
    let (shape_info, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|source| Error::Inference { source })?;

    // Safe: tensor dimensions are always non-negative and within bounds
    let dims: Vec<usize> = shape_info.iter().map(|&x| x as usize).collect();

    if dims.len() != 4 || dims[0] != 1 || dims[1] != AB_BINS {
        return Err(Error::ShapeMismatch {
            expected: format!("1x{AB_BINS}xHxW logits"),
            actual: format!("{dims:?}"),
        });
    }

    Array4::from_shape_vec((dims[0], dims[1], dims[2], dims[3]), data.to_vec()).map_err(|_| {
        Error::ShapeMismatch {
            expected: format!("{dims:?}"),
            actual: "reshape failed".to_string(),
        }
    })
}

/// Decode chroma logits into per-pixel (a, b) values.
///
/// Per pixel: the logits are scaled by the rebalancing gain and pushed
/// through a numerically stable softmax; the output is the expectation of
/// the cluster centers under that distribution.
#[allow(clippy::cast_possible_truncation)]
fn project_chroma(logits: &Array4<f32>, centers: &Array2<f32>) -> Result<PredictedChannels> {
    let (_, bins, height, width) = logits.dim();
    if bins != AB_BINS || centers.dim() != (AB_BINS, 2) {
        return Err(Error::ShapeMismatch {
            expected: format!("{AB_BINS} bins and {AB_BINS}x2 centers"),
            actual: format!("{bins} bins and {:?} centers", centers.dim()),
        });
    }

    let mut a = vec![0.0f32; width * height];
    let mut b = vec![0.0f32; width * height];
    let mut weights = [0.0f32; AB_BINS];

    for y in 0..height {
        for x in 0..width {
            let mut max = f32::NEG_INFINITY;
            for (k, weight) in weights.iter_mut().enumerate() {
                let v = logits[[0, k, y, x]] * REBALANCE_GAIN;
                *weight = v;
                if v > max {
                    max = v;
                }
            }

            let mut sum = 0.0f32;
            for weight in &mut weights {
                *weight = (*weight - max).exp();
                sum += *weight;
            }

            let mut chroma = (0.0f32, 0.0f32);
            for (k, &weight) in weights.iter().enumerate() {
                let p = weight / sum;
                chroma.0 = p.mul_add(centers[[k, 0]], chroma.0);
                chroma.1 = p.mul_add(centers[[k, 1]], chroma.1);
            }

            let idx = y * width + x;
            a[idx] = chroma.0;
            b[idx] = chroma.1;
        }
    }

    // Safe: plane dimensions come from the network output and fit in u32
    PredictedChannels::new(a, b, width as u32, height as u32)
}
