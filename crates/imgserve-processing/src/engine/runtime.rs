//! Process-wide engine runtime.
//!
//! The runtime carries the decoder limits and handle accounting shared by every engine
//! instance. [`initialize`] creates it exactly once per process; later calls return the
//! same instance. [`EngineRuntime::shutdown`] is idempotent and makes further decodes fail.

use imgserve_core::EngineSettings;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

static RUNTIME: OnceLock<Arc<EngineRuntime>> = OnceLock::new();

/// Initialize the process-wide runtime, or return the one already initialized.
pub fn initialize(settings: &EngineSettings) -> Arc<EngineRuntime> {
    let mut created = false;
    let runtime = RUNTIME.get_or_init(|| {
        created = true;
        Arc::new(EngineRuntime::new(settings.clone()))
    });

    if created {
        tracing::info!(
            max_concurrency = settings.max_concurrency,
            max_dimension = settings.max_dimension,
            max_alloc_bytes = settings.max_alloc_bytes,
            "Image engine runtime initialized"
        );
    } else {
        tracing::warn!("Image engine runtime already initialized; reusing existing instance");
    }

    Arc::clone(runtime)
}

#[derive(Debug)]
pub struct EngineRuntime {
    settings: EngineSettings,
    live_handles: AtomicUsize,
    handles_opened: AtomicU64,
    shut_down: AtomicBool,
}

impl EngineRuntime {
    /// Build a standalone runtime. Services use [`initialize`]; this exists so tests can
    /// own an isolated instance.
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            live_handles: AtomicUsize::new(0),
            handles_opened: AtomicU64::new(0),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Decoder limits derived from the settings.
    pub fn limits(&self) -> image::Limits {
        let mut limits = image::Limits::default();
        limits.max_image_width = Some(self.settings.max_dimension);
        limits.max_image_height = Some(self.settings.max_dimension);
        limits.max_alloc = Some(self.settings.max_alloc_bytes);
        limits
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Stop accepting new handles. Safe to call more than once.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let live = self.live_handles();
        if live > 0 {
            tracing::warn!(live_handles = live, "Image engine shut down with handles still open");
        } else {
            tracing::info!(
                handles_opened = self.handles_opened(),
                "Image engine runtime shut down"
            );
        }
    }

    pub fn live_handles(&self) -> usize {
        self.live_handles.load(Ordering::Acquire)
    }

    pub fn handles_opened(&self) -> u64 {
        self.handles_opened.load(Ordering::Relaxed)
    }

    pub(crate) fn handle_acquired(&self) {
        self.live_handles.fetch_add(1, Ordering::AcqRel);
        self.handles_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn handle_released(&self) {
        let previous = self.live_handles.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "released more handles than were acquired");
    }
}
