//! # colorit
//!
//! A library for colorizing grayscale photographs with a pretrained
//! neural predictor.
//!
//! The pipeline decodes an image, lifts its lightness channel into the
//! network's input layout, predicts the two chroma channels, and
//! reconstructs a full-resolution color image. Jobs run on a dedicated
//! worker thread behind [`TaskRunner`], so an interactive front-end stays
//! responsive while outcomes are handed back in submission order.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use colorit::{ModelArtifacts, Predictor, TaskRunner};
//!
//! # fn main() -> colorit::Result<()> {
//! let predictor = Predictor::load(&ModelArtifacts::locate(None))?;
//! let (runner, mut deliveries) = TaskRunner::spawn(Arc::new(predictor))?;
//!
//! runner.submit("photo.jpg")?;
//! if let Some(delivery) = deliveries.wait() {
//!     let result = delivery.outcome?;
//!     colorit::image::save_image(&result.colorized, "colorized_photo.jpg", 95)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod display;
pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;
pub mod runner;

pub use error::{Error, Result};
pub use model::{LightnessPlane, ModelArtifacts, Predict, PredictedChannels, Predictor};
pub use pipeline::{ColorizationJob, ColorizationResult};
pub use runner::{Deliveries, Delivery, JobHandle, TaskRunner};
