//! Drives registered stats collectors through one scrape at a time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue, LabelValueEncoder};
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};

use crate::client::StatsClient;
use crate::error::Result;
use crate::metric::{Desc, Metric, MetricKind, fq_name};
use crate::stats_collector::StatsCollector;

/// Outcome label of one scrape.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ScrapeResult {
    Success,
    Error,
}

impl ScrapeResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeResult::Success => "success",
            ScrapeResult::Error => "error",
        }
    }
}

impl EncodeLabelValue for ScrapeResult {
    fn encode(
        &self,
        encoder: &mut LabelValueEncoder<'_>,
    ) -> std::result::Result<(), std::fmt::Error> {
        use std::fmt::Write;
        encoder.write_str(self.as_str())
    }
}

/// Labels for the scrape duration histogram.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ScrapeLabels {
    pub result: ScrapeResult,
}

/// Scrape duration histogram, one series per [`ScrapeResult`].
pub type ScrapeDuration = Family<ScrapeLabels, Histogram, fn() -> Histogram>;

fn scrape_histogram() -> Histogram {
    // 5ms .. ~10s
    Histogram::new(exponential_buckets(0.005, 2.0, 12))
}

/// Collects nsqd metrics from every registered [`StatsCollector`].
///
/// Each [`collect`](Self::collect) call is one scrape: every collector is
/// reset, the stats snapshot is fetched once, and on success every collector
/// is fed the snapshot and asked for its samples. The time spent is observed
/// into a histogram labeled with the scrape result, whether or not the fetch
/// succeeded.
///
/// Collectors are shared between scrapes, so scrapes are serialized: a
/// second concurrent `collect` waits until the first has emitted.
pub struct NsqExecutor {
    client: StatsClient,
    collectors: RwLock<Vec<Arc<dyn StatsCollector>>>,
    scrape_desc: Arc<Desc>,
    scrape_duration: ScrapeDuration,
    scrape_lock: tokio::sync::Mutex<()>,
}

impl NsqExecutor {
    /// Creates an executor scraping `nsqd_url`, which must already be
    /// normalized.
    pub fn new(namespace: &str, nsqd_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self::with_client(namespace, StatsClient::new(nsqd_url, timeout)?))
    }

    pub fn with_client(namespace: &str, client: StatsClient) -> Self {
        let scrape_desc = Arc::new(Desc::new(
            fq_name(namespace, "exporter", "scrape_duration_seconds"),
            "Duration of a scrape job of the NSQ exporter",
            MetricKind::Histogram,
            &["result"],
        ));
        Self {
            client,
            collectors: RwLock::new(Vec::new()),
            scrape_desc,
            scrape_duration: ScrapeDuration::new_with_constructor(scrape_histogram),
            scrape_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Registers a collector. Collectors are never removed and are driven in
    /// registration order.
    pub fn use_collector(&self, collector: Arc<dyn StatsCollector>) {
        self.collectors.write().push(collector);
    }

    pub fn collector_count(&self) -> usize {
        self.collectors.read().len()
    }

    /// Appends the scrape duration descriptor followed by every registered
    /// collector's descriptors.
    pub fn describe(&self, out: &mut Vec<Arc<Desc>>) {
        out.push(self.scrape_desc.clone());
        let collectors = self.collectors.read();
        for collector in collectors.iter() {
            collector.describe(out);
        }
    }

    /// Descriptor of the executor's own scrape duration histogram.
    pub fn scrape_desc(&self) -> &Arc<Desc> {
        &self.scrape_desc
    }

    /// The scrape duration histogram family, for registration with an
    /// encoder.
    pub fn scrape_duration(&self) -> &ScrapeDuration {
        &self.scrape_duration
    }

    /// Runs one scrape, appending collector samples to `out`.
    ///
    /// On a failed fetch nothing is appended; the failure only shows up in
    /// the returned result and the histogram.
    pub async fn collect(&self, out: &mut Vec<Metric>) -> ScrapeResult {
        let _scrape = self.scrape_lock.lock().await;
        let start = Instant::now();

        let collectors: Vec<Arc<dyn StatsCollector>> = self.collectors.read().clone();

        // Entities can disappear between scrapes.
        for collector in &collectors {
            collector.reset();
        }

        let fetched = self.client.fetch().await;
        let elapsed = start.elapsed();
        let result = match fetched {
            Ok(_) => ScrapeResult::Success,
            Err(_) => ScrapeResult::Error,
        };
        self.scrape_duration
            .get_or_create(&ScrapeLabels { result })
            .observe(elapsed.as_secs_f64());

        match fetched {
            Ok(stats) => {
                for collector in &collectors {
                    collector.set(&stats);
                }
                let before = out.len();
                for collector in &collectors {
                    collector.collect(out);
                }
                tracing::debug!(
                    url = %self.client.url(),
                    topics = stats.topics.len(),
                    samples = out.len() - before,
                    duration_ms = %elapsed.as_millis(),
                    "scrape completed"
                );
            }
            Err(err) => {
                tracing::warn!(
                    url = %self.client.url(),
                    duration_ms = %elapsed.as_millis(),
                    error = %err,
                    "scrape failed"
                );
            }
        }

        result
    }
}
