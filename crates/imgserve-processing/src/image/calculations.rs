//! Pure dimension arithmetic.
//!
//! Every function here is a plain computation over sizes: no decoding, no I/O. Derived
//! dimensions are rounded to the nearest integer and never drop below 1.

use crate::engine::Region;
use imgserve_core::ImageSize;

/// `value * numerator / denominator`, rounded, at least 1.
pub fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return value.max(1);
    }
    let scaled = (f64::from(value) * f64::from(numerator) / f64::from(denominator)).round();
    (scaled as u32).max(1)
}

/// Size with `width` fixed and height derived from the source aspect ratio.
pub fn fit_width(source: ImageSize, width: u32) -> ImageSize {
    ImageSize::new(width, scale(source.height, width, source.width))
}

/// Size with `height` fixed and width derived from the source aspect ratio.
pub fn fit_height(source: ImageSize, height: u32) -> ImageSize {
    ImageSize::new(scale(source.width, height, source.height), height)
}

/// Largest aspect-preserving size that fits inside `bounds`.
pub fn fit_inside(source: ImageSize, bounds: ImageSize) -> ImageSize {
    // Compare width/height ratios without floating point: W*h vs H*w.
    let width_limited = u64::from(source.width) * u64::from(bounds.height)
        >= u64::from(source.height) * u64::from(bounds.width);
    if width_limited {
        fit_width(source, bounds.width)
    } else {
        fit_height(source, bounds.height)
    }
}

/// Smallest aspect-preserving size that covers `target` entirely.
pub fn cover(source: ImageSize, target: ImageSize) -> ImageSize {
    let width_limited = u64::from(source.width) * u64::from(target.height)
        <= u64::from(source.height) * u64::from(target.width);
    let size = if width_limited {
        fit_width(source, target.width)
    } else {
        fit_height(source, target.height)
    };
    // Rounding can land one pixel short on the derived side.
    ImageSize::new(size.width.max(target.width), size.height.max(target.height))
}

/// Aspect-preserving size for the requested dimensions, never larger than the source.
pub fn proportional(source: ImageSize, width: Option<u32>, height: Option<u32>) -> Option<ImageSize> {
    let target = match (width, height) {
        (Some(w), Some(h)) => fit_inside(source, ImageSize::new(w, h)),
        (Some(w), None) => fit_width(source, w),
        (None, Some(h)) => fit_height(source, h),
        (None, None) => return None,
    };
    Some(target)
}

/// Replace a target that exceeds the source on either side with the source size.
pub fn cap_to_source(source: ImageSize, target: ImageSize) -> ImageSize {
    if target.width > source.width || target.height > source.height {
        source
    } else {
        target
    }
}

/// Centered region of `target` size inside `size`. `target` is clamped to `size`.
pub fn center_region(size: ImageSize, target: ImageSize) -> Region {
    let width = target.width.min(size.width);
    let height = target.height.min(size.height);
    Region::new((size.width - width) / 2, (size.height - height) / 2, width, height)
}

/// Largest centered region of `size` whose aspect ratio is `aspect_width:aspect_height`.
pub fn aspect_region(size: ImageSize, aspect_width: u32, aspect_height: u32) -> Region {
    let wider_than_aspect = u64::from(size.width) * u64::from(aspect_height)
        >= u64::from(size.height) * u64::from(aspect_width);
    let target = if wider_than_aspect {
        ImageSize::new(scale(size.height, aspect_width, aspect_height), size.height)
    } else {
        ImageSize::new(size.width, scale(size.width, aspect_height, aspect_width))
    };
    center_region(size, target)
}
