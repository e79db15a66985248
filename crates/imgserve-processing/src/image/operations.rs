//! Operation registry and planning.
//!
//! Each operation is split in two phases. Parsing validates the parameter set before any
//! decode happens; planning turns the parsed operation plus the decoded source size into a
//! [`TransformPlan`]. Both phases are pure, which keeps all dimension arithmetic testable
//! without an engine.

use super::calculations::{
    aspect_region, cap_to_source, center_region, cover, fit_width, proportional,
};
use super::params::OperationParameters;
use crate::engine::{Region, TransformPlan};
use crate::error::OperationError;
use imgserve_core::{EngineSettings, ExtractBounds, ImageSize, OperationKind};

/// Bytes per pixel assumed when sizing a resize buffer: four 8-bit channels.
const RESIZE_BYTES_PER_PIXEL: u64 = 4;

/// Settings operations read at plan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformSettings {
    pub extract_bounds: ExtractBounds,
    pub default_quality: u8,
    /// Largest width or height a plan may resize to
    pub max_dimension: u32,
    /// Largest pixel buffer a plan may resize to
    pub max_alloc_bytes: u64,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self::from(&EngineSettings::default())
    }
}

impl From<&EngineSettings> for TransformSettings {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            extract_bounds: settings.extract_bounds,
            default_quality: settings.default_quality,
            max_dimension: settings.max_dimension,
            max_alloc_bytes: settings.max_alloc_bytes,
        }
    }
}

/// A validated operation, ready to be planned against a source size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationSpec {
    Resize {
        width: Option<u32>,
        height: Option<u32>,
    },
    Enlarge {
        width: Option<u32>,
        height: Option<u32>,
    },
    Crop {
        width: u32,
        height: Option<u32>,
    },
    Extract {
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    },
}

type ParseFn = fn(&OperationParameters) -> Result<OperationSpec, OperationError>;

/// Name to handler table. Every [`OperationKind`] has exactly one entry.
const REGISTRY: [(OperationKind, ParseFn); 4] = [
    (OperationKind::Crop, parse_crop),
    (OperationKind::Resize, parse_resize),
    (OperationKind::Enlarge, parse_enlarge),
    (OperationKind::Extract, parse_extract),
];

/// Resolve an operation name (case-sensitive, lowercase) to its kind.
pub fn lookup(name: &str) -> Option<OperationKind> {
    REGISTRY
        .iter()
        .map(|(kind, _)| *kind)
        .find(|kind| kind.name() == name)
}

fn parser_for(kind: OperationKind) -> ParseFn {
    match kind {
        OperationKind::Crop => REGISTRY[0].1,
        OperationKind::Resize => REGISTRY[1].1,
        OperationKind::Enlarge => REGISTRY[2].1,
        OperationKind::Extract => REGISTRY[3].1,
    }
}

fn parse_resize(params: &OperationParameters) -> Result<OperationSpec, OperationError> {
    let width = params.positive("width")?;
    let height = params.positive("height")?;
    if width.is_none() && height.is_none() {
        return Err(OperationError::InvalidParameter(
            "resize requires 'width' or 'height'".to_string(),
        ));
    }
    Ok(OperationSpec::Resize { width, height })
}

fn parse_enlarge(params: &OperationParameters) -> Result<OperationSpec, OperationError> {
    let width = params.width.filter(|w| *w > 0);
    let height = params.height.filter(|h| *h > 0);
    if width.is_none() && height.is_none() {
        return Err(OperationError::InvalidParameter(
            "enlarge requires a non-zero 'width' or 'height'".to_string(),
        ));
    }
    Ok(OperationSpec::Enlarge { width, height })
}

fn parse_crop(params: &OperationParameters) -> Result<OperationSpec, OperationError> {
    let width = params.require("width", "crop")?;
    if width == 0 {
        return Err(OperationError::InvalidParameter(
            "'width' must be greater than 0".to_string(),
        ));
    }
    let height = params.positive("height")?;
    Ok(OperationSpec::Crop { width, height })
}

fn parse_extract(params: &OperationParameters) -> Result<OperationSpec, OperationError> {
    let top = params.require("top", "extract")?;
    let left = params.require("left", "extract")?;
    let width = params.require("width", "extract")?;
    let height = params.height.unwrap_or(width);
    if width == 0 || height == 0 {
        return Err(OperationError::InvalidParameter(
            "extract region must have a non-zero width and height".to_string(),
        ));
    }
    Ok(OperationSpec::Extract {
        left,
        top,
        width,
        height,
    })
}

impl OperationSpec {
    pub fn parse(kind: OperationKind, params: &OperationParameters) -> Result<Self, OperationError> {
        parser_for(kind)(params)
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            OperationSpec::Resize { .. } => OperationKind::Resize,
            OperationSpec::Enlarge { .. } => OperationKind::Enlarge,
            OperationSpec::Crop { .. } => OperationKind::Crop,
            OperationSpec::Extract { .. } => OperationKind::Extract,
        }
    }

    /// Compute the plan for a source of `source` size. Fails for Extract regions that start
    /// outside the source and for resize targets beyond the engine limits.
    pub fn plan(
        &self,
        source: ImageSize,
        settings: &TransformSettings,
        quality: u8,
    ) -> Result<TransformPlan, OperationError> {
        let mut plan = TransformPlan {
            quality,
            ..TransformPlan::default()
        };

        match *self {
            OperationSpec::Resize { width, height } => {
                plan.resize = proportional(source, width, height)
                    .map(|target| cap_to_source(source, target));
            }
            OperationSpec::Enlarge {
                width: Some(width),
                height: Some(height),
            } => {
                let target = ImageSize::new(width, height);
                let covered = cover(source, target);
                plan.resize = Some(covered);
                if covered != target {
                    plan.crop = Some(center_region(covered, target));
                }
            }
            OperationSpec::Enlarge { width, height } => {
                plan.resize = proportional(source, width, height);
            }
            OperationSpec::Crop { width, height } => {
                let resized = cap_to_source(source, fit_width(source, width));
                plan.resize = Some(resized);
                plan.crop = height.map(|height| aspect_region(resized, width, height));
            }
            OperationSpec::Extract {
                left,
                top,
                width,
                height,
            } => {
                plan.extract = Some(extract_region(
                    source,
                    Region::new(left, top, width, height),
                    settings.extract_bounds,
                )?);
            }
        }

        if let Some(target) = plan.resize {
            check_resize_limits(target, settings)?;
        }
        Ok(plan)
    }
}

/// Extract and crop never exceed their input, so the resize target bounds every buffer a
/// plan allocates beyond the decoded source.
fn check_resize_limits(target: ImageSize, settings: &TransformSettings) -> Result<(), OperationError> {
    if target.width > settings.max_dimension || target.height > settings.max_dimension {
        return Err(OperationError::InvalidParameter(format!(
            "target size {} exceeds the maximum dimension of {} pixels",
            target, settings.max_dimension
        )));
    }
    let bytes = target.area().saturating_mul(RESIZE_BYTES_PER_PIXEL);
    if bytes > settings.max_alloc_bytes {
        return Err(OperationError::InvalidParameter(format!(
            "target size {} needs {} bytes, above the {} byte limit",
            target, bytes, settings.max_alloc_bytes
        )));
    }
    Ok(())
}

fn extract_region(
    source: ImageSize,
    requested: Region,
    bounds: ExtractBounds,
) -> Result<Region, OperationError> {
    if requested.left >= source.width || requested.top >= source.height {
        return Err(OperationError::OutOfBounds(format!(
            "region origin ({}, {}) is outside the {} source",
            requested.left, requested.top, source
        )));
    }

    match bounds {
        ExtractBounds::Strict if !requested.fits_within(source) => {
            Err(OperationError::OutOfBounds(format!(
                "region {}x{} at ({}, {}) extends past the {} source",
                requested.width, requested.height, requested.left, requested.top, source
            )))
        }
        ExtractBounds::Strict => Ok(requested),
        ExtractBounds::Clip => Ok(Region::new(
            requested.left,
            requested.top,
            requested.width.min(source.width - requested.left),
            requested.height.min(source.height - requested.top),
        )),
    }
}
