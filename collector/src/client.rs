//! HTTP client for nsqd's stats endpoint.

use std::time::Duration;

use reqwest::header::ACCEPT;

use crate::error::{Error, Result};
use crate::stats::Stats;

/// Media type nsqd uses to select the v1 stats representation.
pub const STATS_MEDIA_TYPE: &str = "application/vnd.nsq; version=1.0";

/// Fetches and decodes one stats snapshot per call.
///
/// Connecting and the request as a whole are both bounded by the configured
/// timeout. Failures are not retried.
#[derive(Debug, Clone)]
pub struct StatsClient {
    url: String,
    http: reqwest::Client,
}

impl StatsClient {
    /// Creates a client for an already-normalized stats URL.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issues one GET against the stats endpoint and decodes the body.
    pub async fn fetch(&self) -> Result<Stats> {
        let response = self
            .http
            .get(&self.url)
            .header(ACCEPT, STATS_MEDIA_TYPE)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!(
                "{} responded with status {}",
                self.url, status
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            Error::Fetch(format!("failed to read body from {}: {}", self.url, e))
        })?;
        Stats::decode(&body)
    }
}
