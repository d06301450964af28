//! The colorization pipeline: numeric transforms and job orchestration.

mod colorspace;
mod job;

pub use colorspace::{extract_lightness_plane, merge_and_reconstruct, to_grayscale_display};
pub use job::{ColorizationJob, ColorizationResult};
