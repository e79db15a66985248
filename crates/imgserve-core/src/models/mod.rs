//! Data models shared across the workspace

mod image;
mod operation;

pub use image::*;
pub use operation::*;
