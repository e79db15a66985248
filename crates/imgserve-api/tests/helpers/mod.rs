//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p imgserve-api`.

#![allow(dead_code)]

pub mod fixtures;

use axum_test::TestServer;
use imgserve_api::setup::routes;
use imgserve_api::AppState;
use imgserve_core::Config;
use imgserve_processing::EngineRuntime;
use std::collections::HashMap;
use std::sync::Arc;

/// Test application: server plus the state behind it.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Engine handles currently open.
    pub fn live_handles(&self) -> usize {
        self.state.runtime.live_handles()
    }
}

/// Config built from `overrides` only; the process environment is ignored.
pub fn create_test_config(overrides: &[(&str, &str)]) -> Config {
    let vars: HashMap<String, String> = overrides
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned()).expect("Failed to build test config")
}

/// Setup test app with default settings.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(&[]).await
}

/// Setup test app with config overrides. Each app owns an isolated engine runtime.
pub async fn setup_test_app_with(overrides: &[(&str, &str)]) -> TestApp {
    let config = create_test_config(overrides);
    let runtime = Arc::new(EngineRuntime::new(config.engine.clone()));
    let state = Arc::new(AppState::new(config.clone(), runtime));

    let app = routes::setup_routes(&config, state.clone())
        .await
        .expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp { server, state }
}
