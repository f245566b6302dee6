//! Prometheus exporter for nsqd statistics.
//!
//! Every request to the telemetry path fetches one stats snapshot from nsqd,
//! runs it through the configured collectors and answers with the resulting
//! gauges plus a histogram of scrape durations.
//!
//! # Example
//!
//! ```no_run
//! use collector::CollectorTable;
//! use nsq_exporter::{ExporterConfig, ExporterServer};
//!
//! # async fn run() -> nsq_exporter::Result<()> {
//! let config = ExporterConfig {
//!     nsqd_url: "nsqd-1:4151".to_string(),
//!     ..Default::default()
//! };
//! ExporterServer::new(config, &CollectorTable::builtin())?.run().await
//! # }
//! ```

pub mod config;
pub mod error;
pub mod exposition;
pub mod server;

pub use config::{CliArgs, ExporterConfig, normalize_url, select_collectors};
pub use error::{Error, Result};
pub use exposition::{CONTENT_TYPE, Exposition};
pub use server::{AppState, ExporterServer, HEALTH_PATH, build_router};
