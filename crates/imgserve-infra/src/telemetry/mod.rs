//! Telemetry initialization
//!
//! Installs the global `tracing` subscriber: an `EnvFilter` (from `RUST_LOG`, falling back to
//! [`DEFAULT_FILTER`]) plus a pretty or JSON fmt layer.

mod init;

pub use init::{init_telemetry, LogFormat, DEFAULT_FILTER};
