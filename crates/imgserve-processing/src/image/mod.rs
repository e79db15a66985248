//! Image metadata extraction and geometric operations

pub mod calculations;
pub mod operations;
pub mod params;
pub mod processor;
pub mod transformer;

pub use operations::{OperationSpec, TransformSettings};
pub use params::OperationParameters;
pub use processor::ImageProcessor;
pub use transformer::ImageTransformer;
