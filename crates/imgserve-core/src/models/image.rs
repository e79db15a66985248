use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of pixels, widened so large images cannot overflow.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Structural attributes of an encoded image.
///
/// A snapshot taken from one decode of the source bytes. It is recomputed on every
/// extraction call and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImageMetadata {
    /// EXIF orientation code (1-8), or 0 when the image carries none.
    pub orientation: i32,
    /// Number of bands (color channels plus alpha).
    pub channels: u32,
    pub alpha: bool,
    /// Whether an embedded ICC color profile is present.
    pub profile: bool,
    /// Canonical format name ("jpeg", "png", "webp", ...) or "unknown".
    #[serde(rename = "type")]
    pub image_type: String,
    /// Color space name, e.g. "srgb" or "b-w".
    pub space: String,
    pub size: ImageSize,
}
