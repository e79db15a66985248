//! imgserve processing library
//!
//! Metadata extraction and the geometric operations (crop, resize, enlarge, extract),
//! driven through the [`engine::ImageEngine`] capability contract.
//!
//! - [`engine`]: the engine trait, handle guards, the process-wide runtime and the
//!   `image`-crate backed [`RustEngine`]
//! - [`image`]: parameters, dimension arithmetic, operation planning and execution

pub mod engine;
pub mod error;
pub mod image;

pub use engine::{
    content_type_for, DecodeMode, EncodedImage, EngineError, EngineRuntime, ImageEngine,
    RustEngine, TransformPlan,
};
pub use error::OperationError;
pub use self::image::{ImageProcessor, ImageTransformer, OperationParameters, TransformSettings};
