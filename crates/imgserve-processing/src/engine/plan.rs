//! Geometry handed to the engine once an operation has been validated.

use imgserve_core::ImageSize;

/// A rectangle in pixel coordinates, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }

    /// True when the region lies entirely inside an image of `bounds`.
    pub fn fits_within(&self, bounds: ImageSize) -> bool {
        u64::from(self.left) + u64::from(self.width) <= u64::from(bounds.width)
            && u64::from(self.top) + u64::from(self.height) <= u64::from(bounds.height)
    }
}

/// Steps applied in order: `extract` on the source, `resize` to exact dimensions,
/// then `crop` on the resized image. Absent steps are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformPlan {
    pub extract: Option<Region>,
    pub resize: Option<ImageSize>,
    pub crop: Option<Region>,
    /// Encoder quality (1-100) for lossy formats
    pub quality: u8,
}

impl Default for TransformPlan {
    fn default() -> Self {
        Self {
            extract: None,
            resize: None,
            crop: None,
            quality: 80,
        }
    }
}

impl TransformPlan {
    /// Dimensions the plan produces from a source of `source` size.
    pub fn output_size(&self, source: ImageSize) -> ImageSize {
        let mut size = source;
        if let Some(region) = self.extract {
            size = region.size();
        }
        if let Some(target) = self.resize {
            size = target;
        }
        if let Some(region) = self.crop {
            size = region.size();
        }
        size
    }
}
