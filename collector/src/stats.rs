//! Decoded nsqd statistics.
//!
//! Mirrors the JSON returned by nsqd's `/stats?format=json` endpoint. Every
//! field defaults when absent so payloads from older and newer daemons decode
//! into the same shape.

use serde::Deserialize;

use crate::error::{Error, Result};

/// One statistics snapshot covering every topic, channel and client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub version: String,
    pub health: String,
    pub start_time: i64,
    pub topics: Vec<Topic>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Topic {
    #[serde(rename = "topic_name")]
    pub name: String,
    pub paused: bool,
    pub depth: i64,
    pub backend_depth: i64,
    pub message_count: u64,
    #[serde(rename = "e2e_processing_latency")]
    pub e2e_latency: E2eLatency,
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Channel {
    #[serde(rename = "channel_name")]
    pub name: String,
    pub paused: bool,
    pub depth: i64,
    pub backend_depth: i64,
    pub in_flight_count: i64,
    pub deferred_count: i64,
    pub message_count: u64,
    pub requeue_count: u64,
    pub timeout_count: u64,
    #[serde(rename = "e2e_processing_latency")]
    pub e2e_latency: E2eLatency,
    pub clients: Vec<Client>,
}

/// A consumer connected to a channel.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Client {
    #[serde(rename = "client_id")]
    pub id: String,
    pub hostname: String,
    pub version: String,
    pub remote_address: String,
    pub state: i32,
    pub ready_count: i64,
    pub in_flight_count: i64,
    pub message_count: u64,
    pub finish_count: u64,
    pub requeue_count: u64,
    #[serde(rename = "connect_ts")]
    pub connect_time: i64,
    pub sample_rate: i32,
    pub deflate: bool,
    pub snappy: bool,
    pub tls: bool,
}

/// End-to-end processing latency percentiles, in nanoseconds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct E2eLatency {
    pub count: u64,
    pub percentiles: Vec<Percentile>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Percentile {
    pub quantile: f64,
    pub value: f64,
}

impl E2eLatency {
    /// Returns the latency recorded for `quantile`, if nsqd reported it.
    pub fn percentile(&self, quantile: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|p| (p.quantile - quantile).abs() < f64::EPSILON)
            .map(|p| p.value)
    }
}

impl Stats {
    /// Decodes a stats response body.
    ///
    /// Daemons predating the v1 stats format wrap the payload in a
    /// `{"status_code": .., "status_txt": .., "data": {..}}` envelope. When a
    /// `data` key is present only its value is decoded.
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| Error::Fetch(format!("invalid stats body: {}", e)))?;
        if !value.is_object() {
            return Err(Error::Fetch(format!(
                "invalid stats body: expected a JSON object, got {}",
                value
            )));
        }
        let stats = match value.get_mut("data").map(serde_json::Value::take) {
            Some(data) => data,
            None => value,
        };
        serde_json::from_value(stats)
            .map_err(|e| Error::Fetch(format!("invalid stats body: {}", e)))
    }
}
