//! imgserve infrastructure library
//!
//! Shared pieces every imgserve binary wires in:
//! - Middleware (request ID, security headers)
//! - Telemetry initialization (tracing subscriber)

pub mod middleware;
pub mod telemetry;

pub use middleware::{request_id_middleware, security_headers_middleware, RequestId};
pub use telemetry::{init_telemetry, LogFormat};
