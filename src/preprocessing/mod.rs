//! Plate image preprocessing
//!
//! Turns a raw vehicle photo into a normalized plate raster for OCR:
//! filtering, Sobel/flood-fill plate detection, cropping and resizing.

pub mod kernel;
pub mod overlay;
pub mod pipeline;
pub mod raster;
pub mod steps;

pub use pipeline::{Pipeline, PipelineParams, PreprocessOptions, StepTiming};
pub use raster::Region;
pub use steps::select::ScoredCandidate;
