//! Image engine capability contract.
//!
//! The [`ImageEngine`] trait is the only seam between the service and the library that
//! actually decodes and encodes pixels. Metadata extraction and every operation go through
//! it, so the rest of the crate never names a concrete codec.
//!
//! Handles are engine-owned and must be released exactly once. [`ScopedHandle`] ties that
//! release to scope exit, so every early return and error path gives the handle back.
//! [`ThreadCleanupGuard`] does the same for the per-thread cleanup hook.

mod plan;
mod runtime;
pub(crate) mod rust_engine;

#[cfg(test)]
pub(crate) mod mock;

pub use plan::{Region, TransformPlan};
pub use runtime::{initialize, EngineRuntime};
pub use rust_engine::{content_type_for, RustEngine};

use imgserve_core::ImageSize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    Encode(String),
    #[error("{0}")]
    Failure(String),
}

/// How much of the source an engine has to decode when opening a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Header and embedded metadata only; enough for [`ImageEngine::attributes`].
    Header,
    /// Full pixel decode; required before [`ImageEngine::render`].
    Full,
}

/// Raw attributes an engine reports for a decoded handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleAttributes {
    pub size: ImageSize,
    pub channels: u32,
    pub has_alpha: bool,
    pub has_profile: bool,
    /// Color interpretation name (`srgb`, `b-w`, ...)
    pub space: String,
    /// EXIF orientation tag, when the source carries one
    pub orientation: Option<u32>,
    /// Canonical name of the detected container format
    pub image_type: &'static str,
}

/// Output of [`ImageEngine::render`].
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub size: ImageSize,
    pub image_type: &'static str,
}

impl EncodedImage {
    pub fn content_type(&self) -> &'static str {
        content_type_for(self.image_type)
    }
}

/// Capabilities the service needs from an image library.
pub trait ImageEngine: Send + Sync {
    type Handle: Send;

    /// Decode `buf` into an engine handle. The caller owns the handle until it is
    /// passed back to [`ImageEngine::release`].
    fn open(&self, buf: &[u8], mode: DecodeMode) -> Result<Self::Handle, EngineError>;

    fn attributes(&self, handle: &Self::Handle) -> HandleAttributes;

    /// Apply `plan` to a fully decoded handle and encode the result in the source format.
    fn render(
        &self,
        handle: &mut Self::Handle,
        plan: &TransformPlan,
    ) -> Result<EncodedImage, EngineError>;

    fn release(&self, handle: Self::Handle);

    /// Number of handles opened and not yet released.
    fn live_handles(&self) -> usize;

    /// Drop any per-thread state the engine keeps. Called once per operation on the
    /// thread that ran it.
    fn thread_cleanup(&self) {}
}

/// Owns an engine handle and releases it on drop.
pub struct ScopedHandle<'e, E: ImageEngine> {
    engine: &'e E,
    handle: Option<E::Handle>,
}

impl<'e, E: ImageEngine> ScopedHandle<'e, E> {
    pub fn open(engine: &'e E, buf: &[u8], mode: DecodeMode) -> Result<Self, EngineError> {
        let handle = engine.open(buf, mode)?;
        Ok(Self {
            engine,
            handle: Some(handle),
        })
    }

    pub fn attributes(&self) -> Option<HandleAttributes> {
        self.handle.as_ref().map(|h| self.engine.attributes(h))
    }

    pub fn render(&mut self, plan: &TransformPlan) -> Result<EncodedImage, EngineError> {
        match self.handle.as_mut() {
            Some(handle) => self.engine.render(handle, plan),
            None => Err(EngineError::Failure("handle already released".to_string())),
        }
    }
}

impl<E: ImageEngine> Drop for ScopedHandle<'_, E> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.engine.release(handle);
        }
    }
}

/// Runs [`ImageEngine::thread_cleanup`] when dropped.
pub struct ThreadCleanupGuard<'e, E: ImageEngine> {
    engine: &'e E,
}

impl<'e, E: ImageEngine> ThreadCleanupGuard<'e, E> {
    pub fn new(engine: &'e E) -> Self {
        Self { engine }
    }
}

impl<E: ImageEngine> Drop for ThreadCleanupGuard<'_, E> {
    fn drop(&mut self) {
        self.engine.thread_cleanup();
    }
}
