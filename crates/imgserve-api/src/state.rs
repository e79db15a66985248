//! Application state shared by all handlers.

use imgserve_core::Config;
use imgserve_processing::{
    EngineRuntime, ImageProcessor, ImageTransformer, RustEngine, TransformSettings,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

pub struct AppState {
    pub config: Config,
    pub runtime: Arc<EngineRuntime>,
    pub processor: ImageProcessor<RustEngine>,
    pub transformer: ImageTransformer<RustEngine>,
    /// Bounds concurrent engine jobs to `ENGINE_MAX_CONCURRENCY`
    pub engine_permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: Config, runtime: Arc<EngineRuntime>) -> Self {
        let engine = RustEngine::new(Arc::clone(&runtime));
        let settings = TransformSettings::from(&config.engine);
        let engine_permits = Arc::new(Semaphore::new(config.engine.max_concurrency.max(1)));

        Self {
            processor: ImageProcessor::new(engine.clone()),
            transformer: ImageTransformer::new(engine, settings),
            engine_permits,
            runtime,
            config,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs())
    }
}
