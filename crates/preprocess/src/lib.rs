//! Freehand digit preprocessing: RGBA canvas snapshot in, model-ready
//! float32 tensor out.
//!
//! The pipeline finds the ink's bounding box, cuts a padded square around
//! it, resamples that to the model's spatial size and normalizes every
//! sample into the model's channel layout.

pub mod bbox;
pub mod builder;
pub mod config;
pub mod errors;
pub mod layout;
pub mod normalize;
pub mod pipeline;
pub mod raster;
pub mod region;

pub use bbox::{BoundingBox, BoundingBoxExtractor, InkPolarity, InkRule};
pub use builder::TensorBuilder;
pub use config::{Centering, DEFAULT_INPUT_SIZE, PipelineConfig};
pub use errors::{PreprocessError, Result};
pub use layout::{ChannelOrder, LayoutSpec, Tensor};
pub use normalize::NormalizationMode;
pub use pipeline::Pipeline;
pub use raster::Raster;
pub use region::Region;
