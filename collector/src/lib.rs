//! nsqd statistics collection.
//!
//! This crate turns the JSON statistics exposed by an nsqd node into labeled
//! metric samples. It provides:
//!
//! - [`StatsClient`]: fetches and decodes one [`Stats`] snapshot over HTTP
//! - [`StatsCollector`]: the describe/reset/set/collect contract, with
//!   [`TopicStats`], [`ChannelStats`] and [`ClientStats`] implementations
//! - [`CollectorTable`]: name to constructor lookup used to select collectors
//! - [`NsqExecutor`]: runs scrapes over the registered collectors and records
//!   how long each one took
//!
//! Encoding the samples for a metrics backend is left to the caller; see the
//! `nsq-exporter` crate.

mod client;
mod collectors;
mod error;
mod executor;
mod metric;
mod stats;
mod stats_collector;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{STATS_MEDIA_TYPE, StatsClient};
pub use collectors::{
    ChannelStats, ClientStats, CollectorConstructor, CollectorTable, TopicStats,
};
pub use error::{DerivationError, Error, Result};
pub use executor::{NsqExecutor, ScrapeDuration, ScrapeLabels, ScrapeResult};
pub use metric::{Desc, Metric, MetricKind, fq_name};
pub use stats::{Channel, Client, E2eLatency, Percentile, Stats, Topic};
pub use stats_collector::StatsCollector;
