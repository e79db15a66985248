//! Service-wide constants

pub const SERVICE_NAME: &str = "imgserve";

pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Multipart field carrying the source image
pub const MULTIPART_FILE_FIELD: &str = "file";
