//! HTTP handlers

pub mod engine_job;
pub mod image_ops;
pub mod index;
pub mod source;
