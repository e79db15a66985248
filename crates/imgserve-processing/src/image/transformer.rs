//! Image transformer - runs one operation end to end
//!
//! Decode, plan, render. Parameters are validated before the source is decoded, and the
//! source size comes from the same handle that is rendered, so each operation decodes
//! exactly once. Cancellation is checked between steps; a step already running is never
//! interrupted.

use super::operations::{OperationSpec, TransformSettings};
use super::params::OperationParameters;
use crate::engine::{DecodeMode, EncodedImage, ImageEngine, ScopedHandle, ThreadCleanupGuard};
use crate::error::OperationError;
use imgserve_core::OperationKind;
use tokio_util::sync::CancellationToken;

pub struct ImageTransformer<E: ImageEngine> {
    engine: E,
    settings: TransformSettings,
}

impl<E: ImageEngine> ImageTransformer<E> {
    pub fn new(engine: E, settings: TransformSettings) -> Self {
        Self { engine, settings }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn settings(&self) -> &TransformSettings {
        &self.settings
    }

    pub fn apply(
        &self,
        kind: OperationKind,
        buf: &[u8],
        params: &OperationParameters,
    ) -> Result<EncodedImage, OperationError> {
        self.apply_cancellable(kind, buf, params, &CancellationToken::new())
    }

    pub fn apply_cancellable(
        &self,
        kind: OperationKind,
        buf: &[u8],
        params: &OperationParameters,
        cancel: &CancellationToken,
    ) -> Result<EncodedImage, OperationError> {
        let _cleanup = ThreadCleanupGuard::new(&self.engine);

        let spec = OperationSpec::parse(kind, params)?;
        let quality = params.quality_or(self.settings.default_quality)?;
        checkpoint(cancel)?;

        let mut handle = ScopedHandle::open(&self.engine, buf, DecodeMode::Full)?;
        let source = handle
            .attributes()
            .ok_or_else(|| OperationError::EngineFailure("handle released early".to_string()))?
            .size;
        checkpoint(cancel)?;

        let plan = spec.plan(source, &self.settings, quality)?;
        tracing::debug!(
            operation = %kind,
            source = %source,
            output = %plan.output_size(source),
            "Planned image operation"
        );
        checkpoint(cancel)?;

        let encoded = handle.render(&plan)?;
        checkpoint(cancel)?;
        Ok(encoded)
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), OperationError> {
    if cancel.is_cancelled() {
        Err(OperationError::Cancelled)
    } else {
        Ok(())
    }
}
