//! imgserve core library
//!
//! This crate provides the domain models, error types and configuration shared by the
//! processing engine and the HTTP API.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, EngineSettings, ExtractBounds, ServerConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{ImageMetadata, ImageSize, OperationKind};
