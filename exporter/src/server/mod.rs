//! HTTP server for the NSQ exporter.
//!
//! Serves the exposition under the configured telemetry path, a landing page
//! linking to it, and a liveness endpoint.

mod error;
mod handlers;
mod middleware;
mod server;

pub use handlers::AppState;
pub use server::{ExporterServer, build_router};

/// Liveness endpoint. Always answers `OK` without contacting nsqd.
pub const HEALTH_PATH: &str = "/-/healthy";
