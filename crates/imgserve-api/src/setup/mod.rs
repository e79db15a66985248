//! Application setup and initialization
//!
//! Everything `main` needs to go from a loaded [`Config`] to a served router.

pub mod routes;
pub mod server;

use crate::constants::{SERVICE_NAME, SERVICE_VERSION};
use crate::state::AppState;
use anyhow::Result;
use imgserve_core::Config;
use imgserve_infra::{init_telemetry, LogFormat};
use imgserve_processing::engine;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Telemetry first so engine startup is logged
    init_telemetry(
        LogFormat::from_name(&config.log_format),
        SERVICE_NAME,
        SERVICE_VERSION,
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let runtime = engine::initialize(&config.engine);
    let state = Arc::new(AppState::new(config.clone(), runtime));

    let router = routes::setup_routes(&config, state.clone()).await?;

    Ok((state, router))
}
