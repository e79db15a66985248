use imgserve_api::setup;
use imgserve_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Telemetry, engine runtime, state and routes
    let (state, router) = setup::initialize_app(config.clone()).await?;

    // Serve until a shutdown signal arrives, then release the engine runtime
    setup::server::start_server(&config, router, state.runtime.clone()).await?;

    Ok(())
}
