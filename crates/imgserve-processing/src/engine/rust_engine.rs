//! Pure Rust engine built on the `image` crate.
//!
//! | Step | Crate / function |
//! |---|---|
//! | Format sniffing | `image::guess_format` |
//! | Header decode | `ImageReader::into_decoder` (dimensions, color type, ICC profile) |
//! | EXIF orientation | `kamadak-exif` container reader |
//! | Pixel decode | `DynamicImage::from_decoder` under the runtime's `Limits` |
//! | Extract / crop | `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode | source format; JPEG honors the plan's quality |

use super::runtime::EngineRuntime;
use super::{DecodeMode, EncodedImage, EngineError, HandleAttributes, ImageEngine, TransformPlan};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageDecoder, ImageError, ImageFormat, ImageReader};
use imgserve_core::ImageSize;
use std::io::Cursor;
use std::sync::Arc;

/// Engine handle: header attributes plus decoded pixels when opened with
/// [`DecodeMode::Full`]. Pixels are consumed by the first render.
pub struct RustHandle {
    attributes: HandleAttributes,
    format: ImageFormat,
    pixels: Option<DynamicImage>,
}

#[derive(Clone)]
pub struct RustEngine {
    runtime: Arc<EngineRuntime>,
}

impl RustEngine {
    pub fn new(runtime: Arc<EngineRuntime>) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &Arc<EngineRuntime> {
        &self.runtime
    }
}

impl ImageEngine for RustEngine {
    type Handle = RustHandle;

    fn open(&self, buf: &[u8], mode: DecodeMode) -> Result<RustHandle, EngineError> {
        if self.runtime.is_shut_down() {
            return Err(EngineError::Failure(
                "image engine has been shut down".to_string(),
            ));
        }
        if buf.is_empty() {
            return Err(EngineError::Decode("empty image buffer".to_string()));
        }

        let format = image::guess_format(buf)
            .map_err(|_| EngineError::Decode("unrecognized image format".to_string()))?;

        let mut reader = ImageReader::with_format(Cursor::new(buf), format);
        reader.limits(self.runtime.limits());
        let mut decoder = reader.into_decoder().map_err(decode_error)?;

        let (width, height) = decoder.dimensions();
        let color = decoder.color_type();
        let has_profile = decoder
            .icc_profile()
            .ok()
            .flatten()
            .is_some_and(|profile| !profile.is_empty());

        let attributes = HandleAttributes {
            size: ImageSize::new(width, height),
            channels: u32::from(color.channel_count()),
            has_alpha: color.has_alpha(),
            has_profile,
            space: space_name(color).to_string(),
            orientation: read_orientation(buf),
            image_type: format_name(format),
        };

        let pixels = match mode {
            DecodeMode::Header => None,
            DecodeMode::Full => Some(DynamicImage::from_decoder(decoder).map_err(decode_error)?),
        };

        self.runtime.handle_acquired();
        Ok(RustHandle {
            attributes,
            format,
            pixels,
        })
    }

    fn attributes(&self, handle: &RustHandle) -> HandleAttributes {
        handle.attributes.clone()
    }

    fn render(
        &self,
        handle: &mut RustHandle,
        plan: &TransformPlan,
    ) -> Result<EncodedImage, EngineError> {
        let mut img = handle.pixels.take().ok_or_else(|| {
            EngineError::Failure("handle has no decoded pixels to render".to_string())
        })?;

        if let Some(region) = plan.extract {
            img = img.crop_imm(region.left, region.top, region.width, region.height);
        }
        if let Some(target) = plan.resize {
            if (target.width, target.height) != (img.width(), img.height()) {
                img = img.resize_exact(target.width, target.height, FilterType::Lanczos3);
            }
        }
        if let Some(region) = plan.crop {
            img = img.crop_imm(region.left, region.top, region.width, region.height);
        }

        let size = ImageSize::new(img.width(), img.height());
        let data = encode(img, handle.format, plan.quality)?;

        tracing::debug!(
            format = handle.attributes.image_type,
            output = %size,
            bytes = data.len(),
            "Image rendered"
        );

        Ok(EncodedImage {
            data,
            size,
            image_type: handle.attributes.image_type,
        })
    }

    fn release(&self, handle: RustHandle) {
        drop(handle);
        self.runtime.handle_released();
    }

    fn live_handles(&self) -> usize {
        self.runtime.live_handles()
    }
}

fn decode_error(err: ImageError) -> EngineError {
    match err {
        ImageError::Limits(e) => EngineError::Failure(format!("decoder limits exceeded: {}", e)),
        ImageError::Unsupported(e) => EngineError::Decode(format!("unsupported image: {}", e)),
        other => EngineError::Decode(other.to_string()),
    }
}

fn encode_error(err: ImageError) -> EngineError {
    match err {
        ImageError::Limits(e) => EngineError::Failure(format!("encoder limits exceeded: {}", e)),
        other => EngineError::Encode(other.to_string()),
    }
}

fn encode(img: DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>, EngineError> {
    let mut buffer = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let img = match img.color() {
                ColorType::L8 | ColorType::Rgb8 => img,
                ColorType::La8 | ColorType::L16 | ColorType::La16 => {
                    DynamicImage::ImageLuma8(img.to_luma8())
                }
                _ => DynamicImage::ImageRgb8(img.to_rgb8()),
            };
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
            img.write_with_encoder(encoder).map_err(encode_error)?;
        }
        ImageFormat::Png | ImageFormat::Tiff => {
            let img = match img.color() {
                ColorType::Rgb32F => DynamicImage::ImageRgb16(img.to_rgb16()),
                ColorType::Rgba32F => DynamicImage::ImageRgba16(img.to_rgba16()),
                _ => img,
            };
            img.write_to(&mut Cursor::new(&mut buffer), format)
                .map_err(encode_error)?;
        }
        ImageFormat::WebP | ImageFormat::Bmp => {
            let img = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            img.write_to(&mut Cursor::new(&mut buffer), format)
                .map_err(encode_error)?;
        }
        ImageFormat::Gif => {
            DynamicImage::ImageRgba8(img.to_rgba8())
                .write_to(&mut Cursor::new(&mut buffer), format)
                .map_err(encode_error)?;
        }
        other => {
            return Err(EngineError::Encode(format!(
                "no encoder available for {:?}",
                other
            )))
        }
    }
    Ok(buffer)
}

/// EXIF orientation from any container kamadak-exif understands.
fn read_orientation(buf: &[u8]) -> Option<u32> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(buf))
        .ok()?;
    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        ImageFormat::Png => "png",
        ImageFormat::WebP => "webp",
        ImageFormat::Gif => "gif",
        ImageFormat::Tiff => "tiff",
        ImageFormat::Bmp => "bmp",
        _ => "unknown",
    }
}

fn space_name(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 | ColorType::La8 => "b-w",
        ColorType::L16 | ColorType::La16 => "grey16",
        ColorType::Rgb8 | ColorType::Rgba8 => "srgb",
        ColorType::Rgb16 | ColorType::Rgba16 => "rgb16",
        ColorType::Rgb32F | ColorType::Rgba32F => "scrgb",
        _ => "unknown",
    }
}

/// MIME type for a canonical format name as reported in image metadata.
pub fn content_type_for(image_type: &str) -> &'static str {
    match image_type {
        "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::{Region, ScopedHandle};
    use image::{GrayImage, Rgb, RgbImage, Rgba, RgbaImage};
    use imgserve_core::EngineSettings;

    pub(crate) fn noisy_rgb(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = x.wrapping_mul(31) ^ y.wrapping_mul(17);
            Rgb([(v % 251) as u8, (v % 241) as u8, ((x + y) % 256) as u8])
        })
    }

    pub(crate) fn encode_as(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        buf
    }

    pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
        encode_as(
            DynamicImage::ImageRgb8(noisy_rgb(width, height)),
            ImageFormat::Png,
        )
    }

    pub(crate) fn jpeg(width: u32, height: u32) -> Vec<u8> {
        encode_as(
            DynamicImage::ImageRgb8(noisy_rgb(width, height)),
            ImageFormat::Jpeg,
        )
    }

    /// Insert an APP1 EXIF segment carrying only an orientation tag right after SOI.
    pub(crate) fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        let mut tiff = vec![b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x0112u16.to_le_bytes());
        tiff.extend_from_slice(&3u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&orientation.to_le_bytes());
        tiff.extend_from_slice(&[0, 0]);
        tiff.extend_from_slice(&0u32.to_le_bytes());

        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&tiff);
        let segment_len = (payload.len() + 2) as u16;

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    fn engine() -> RustEngine {
        RustEngine::new(Arc::new(EngineRuntime::new(EngineSettings::default())))
    }

    fn header(engine: &RustEngine, buf: &[u8]) -> Result<HandleAttributes, EngineError> {
        let handle = ScopedHandle::open(engine, buf, DecodeMode::Header)?;
        Ok(handle.attributes().unwrap())
    }

    #[test]
    fn test_png_attributes() {
        let engine = engine();
        let attrs = header(&engine, &png(40, 30)).unwrap();
        assert_eq!(attrs.size, ImageSize::new(40, 30));
        assert_eq!(attrs.channels, 3);
        assert!(!attrs.has_alpha);
        assert!(!attrs.has_profile);
        assert_eq!(attrs.space, "srgb");
        assert_eq!(attrs.image_type, "png");
        assert_eq!(attrs.orientation, None);
    }

    #[test]
    fn test_alpha_and_grayscale_attributes() {
        let engine = engine();
        let rgba = encode_as(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 128]))),
            ImageFormat::Png,
        );
        let attrs = header(&engine, &rgba).unwrap();
        assert_eq!(attrs.channels, 4);
        assert!(attrs.has_alpha);

        let gray = encode_as(
            DynamicImage::ImageLuma8(GrayImage::new(8, 8)),
            ImageFormat::Png,
        );
        let attrs = header(&engine, &gray).unwrap();
        assert_eq!(attrs.channels, 1);
        assert_eq!(attrs.space, "b-w");
    }

    #[test]
    fn test_jpeg_exif_orientation() {
        let engine = engine();
        let plain = jpeg(32, 16);
        assert_eq!(header(&engine, &plain).unwrap().orientation, None);

        let rotated = with_exif_orientation(&plain, 6);
        let attrs = header(&engine, &rotated).unwrap();
        assert_eq!(attrs.image_type, "jpeg");
        assert_eq!(attrs.orientation, Some(6));
        assert_eq!(attrs.size, ImageSize::new(32, 16));
    }

    #[test]
    fn test_invalid_input_is_decode_error() {
        let engine = engine();
        assert!(matches!(header(&engine, b""), Err(EngineError::Decode(_))));
        assert!(matches!(
            header(&engine, b"definitely not an image"),
            Err(EngineError::Decode(_))
        ));
        let truncated = &png(40, 30)[..20];
        assert!(matches!(header(&engine, truncated), Err(EngineError::Decode(_))));
        assert_eq!(engine.live_handles(), 0);
    }

    #[test]
    fn test_truncated_pixel_data_fails_full_decode() {
        let engine = engine();
        let data = png(64, 64);
        let truncated = &data[..data.len() / 2];
        assert!(matches!(
            ScopedHandle::open(&engine, truncated, DecodeMode::Full),
            Err(EngineError::Decode(_))
        ));
        assert_eq!(engine.live_handles(), 0);
    }

    #[test]
    fn test_dimension_limit_is_engine_failure() {
        let runtime = EngineRuntime::new(EngineSettings {
            max_dimension: 16,
            ..EngineSettings::default()
        });
        let engine = RustEngine::new(Arc::new(runtime));
        assert!(matches!(
            header(&engine, &png(40, 30)),
            Err(EngineError::Failure(_))
        ));
    }

    #[test]
    fn test_open_after_shutdown_fails() {
        let engine = engine();
        engine.runtime().shutdown();
        assert!(matches!(
            header(&engine, &png(4, 4)),
            Err(EngineError::Failure(_))
        ));
    }

    #[test]
    fn test_render_applies_plan_in_order() {
        let engine = engine();
        let data = png(200, 100);
        let mut handle = ScopedHandle::open(&engine, &data, DecodeMode::Full).unwrap();
        let plan = TransformPlan {
            extract: Some(Region::new(10, 10, 120, 80)),
            resize: Some(ImageSize::new(60, 40)),
            crop: Some(Region::new(10, 0, 40, 40)),
            quality: 90,
        };
        let out = handle.render(&plan).unwrap();
        assert_eq!(out.size, ImageSize::new(40, 40));
        assert_eq!(out.image_type, "png");
        assert_eq!(out.content_type(), "image/png");

        let decoded = image::load_from_memory(&out.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 40));
    }

    #[test]
    fn test_render_keeps_jpeg_format() {
        let engine = engine();
        let data = jpeg(120, 80);
        let mut handle = ScopedHandle::open(&engine, &data, DecodeMode::Full).unwrap();
        let plan = TransformPlan {
            resize: Some(ImageSize::new(60, 40)),
            ..Default::default()
        };
        let out = handle.render(&plan).unwrap();
        assert_eq!(image::guess_format(&out.data).unwrap(), ImageFormat::Jpeg);
        assert_eq!(out.content_type(), "image/jpeg");
    }

    #[test]
    fn test_render_without_pixels_fails() {
        let engine = engine();
        let data = png(8, 8);
        let mut handle = ScopedHandle::open(&engine, &data, DecodeMode::Header).unwrap();
        assert!(matches!(
            handle.render(&TransformPlan::default()),
            Err(EngineError::Failure(_))
        ));
    }

    #[test]
    fn test_release_balances_accounting() {
        let engine = engine();
        let data = png(8, 8);
        for _ in 0..10 {
            let _handle = ScopedHandle::open(&engine, &data, DecodeMode::Full).unwrap();
        }
        assert_eq!(engine.live_handles(), 0);
        assert_eq!(engine.runtime().handles_opened(), 10);
    }

    #[test]
    fn test_content_type_for_unknown_format() {
        assert_eq!(content_type_for("unknown"), "application/octet-stream");
        assert_eq!(content_type_for("webp"), "image/webp");
    }
}
