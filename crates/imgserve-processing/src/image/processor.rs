//! Image processor - metadata extraction

use crate::engine::{DecodeMode, ImageEngine, ScopedHandle};
use crate::error::OperationError;
use imgserve_core::{ImageMetadata, ImageSize};

/// Extracts [`ImageSize`] and [`ImageMetadata`] from encoded buffers.
///
/// Every call fully decodes its own handle, so truncated pixel data is a decode error even
/// though only header attributes are returned. The handle is released before returning, on
/// success and on error alike. Nothing is cached between calls.
pub struct ImageProcessor<E: ImageEngine> {
    engine: E,
}

impl<E: ImageEngine> ImageProcessor<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn size(&self, buf: &[u8]) -> Result<ImageSize, OperationError> {
        let handle = ScopedHandle::open(&self.engine, buf, DecodeMode::Full)?;
        let attributes = handle
            .attributes()
            .ok_or_else(|| OperationError::EngineFailure("handle released early".to_string()))?;
        Ok(attributes.size)
    }

    pub fn metadata(&self, buf: &[u8]) -> Result<ImageMetadata, OperationError> {
        let handle = ScopedHandle::open(&self.engine, buf, DecodeMode::Full)?;
        let attributes = handle
            .attributes()
            .ok_or_else(|| OperationError::EngineFailure("handle released early".to_string()))?;

        Ok(ImageMetadata {
            orientation: attributes
                .orientation
                .and_then(|o| i32::try_from(o).ok())
                .unwrap_or(0),
            channels: attributes.channels,
            alpha: attributes.has_alpha,
            profile: attributes.has_profile,
            image_type: attributes.image_type.to_string(),
            space: attributes.space,
            size: attributes.size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{MockEngine, RecordedOp};
    use crate::engine::rust_engine::tests::{jpeg, png, with_exif_orientation};
    use crate::engine::{EngineRuntime, RustEngine};
    use imgserve_core::EngineSettings;
    use std::sync::Arc;

    fn rust_processor() -> ImageProcessor<RustEngine> {
        let runtime = Arc::new(EngineRuntime::new(EngineSettings::default()));
        ImageProcessor::new(RustEngine::new(runtime))
    }

    #[test]
    fn test_size_matches_metadata_size() {
        let processor = rust_processor();
        let data = jpeg(1785, 1000);
        let size = processor.size(&data).unwrap();
        assert_eq!(size, ImageSize::new(1785, 1000));
        assert_eq!(processor.metadata(&data).unwrap().size, size);
    }

    #[test]
    fn test_metadata_fields() {
        let processor = rust_processor();
        let data = with_exif_orientation(&jpeg(64, 48), 3);
        let metadata = processor.metadata(&data).unwrap();
        assert_eq!(metadata.orientation, 3);
        assert_eq!(metadata.channels, 3);
        assert!(!metadata.alpha);
        assert!(!metadata.profile);
        assert_eq!(metadata.image_type, "jpeg");
        assert_eq!(metadata.space, "srgb");

        let metadata = processor.metadata(&png(10, 10)).unwrap();
        assert_eq!(metadata.orientation, 0);
        assert_eq!(metadata.image_type, "png");
    }

    #[test]
    fn test_errors_release_nothing_and_leak_nothing() {
        let processor = rust_processor();
        assert!(matches!(processor.size(b""), Err(OperationError::Decode(_))));
        assert!(matches!(
            processor.metadata(b"GIF89a"),
            Err(OperationError::Decode(_))
        ));
        assert_eq!(processor.engine().live_handles(), 0);
    }

    #[test]
    fn test_truncated_pixel_data_is_decode_error() {
        let processor = rust_processor();
        let data = png(64, 64);
        let truncated = &data[..data.len() / 2];
        assert!(matches!(processor.size(truncated), Err(OperationError::Decode(_))));
        assert!(matches!(
            processor.metadata(truncated),
            Err(OperationError::Decode(_))
        ));
        assert_eq!(processor.engine().live_handles(), 0);
    }

    #[test]
    fn test_repeated_extraction_does_not_leak_handles() {
        let processor = rust_processor();
        let data = png(16, 16);
        for _ in 0..10_000 {
            processor.metadata(&data).unwrap();
        }
        assert_eq!(processor.engine().live_handles(), 0);
        assert_eq!(processor.engine().runtime().handles_opened(), 10_000);
    }

    #[test]
    fn test_each_call_opens_and_releases_its_own_handle() {
        let processor = ImageProcessor::new(MockEngine::default());
        processor.size(b"x").unwrap();
        processor.metadata(b"x").unwrap();
        assert_eq!(
            processor.engine().operations(),
            vec![
                RecordedOp::Open(DecodeMode::Full),
                RecordedOp::Release,
                RecordedOp::Open(DecodeMode::Full),
                RecordedOp::Release,
            ]
        );
    }
}
