//! Topic-level gauges.

use std::sync::Arc;

use crate::metric::{Desc, Metric};
use crate::stats::{Stats, Topic};
use crate::stats_collector::{GaugeSet, StatsCollector, bool_label, require_percentile};

const LABELS: &[&str] = &["type", "topic", "paused"];

/// Emits `<namespace>_topic_*` gauges, one series per topic.
pub struct TopicStats {
    gauges: GaugeSet<Topic>,
}

impl TopicStats {
    pub fn new(namespace: &str) -> Self {
        let gauges = GaugeSet::<Topic>::new(
            namespace,
            "topic",
            LABELS,
            &[
                ("channel_count", "Number of channels", |t: &Topic| {
                    Ok(t.channels.len() as f64)
                }),
                ("depth", "Queue depth", |t: &Topic| Ok(t.depth as f64)),
                ("backend_depth", "Queue backend depth", |t: &Topic| {
                    Ok(t.backend_depth as f64)
                }),
                ("message_count", "Queue message count", |t: &Topic| {
                    Ok(t.message_count as f64)
                }),
                (
                    "e2e_latency_99p",
                    "Queue e2e latency 99th percentile",
                    |t: &Topic| require_percentile(&t.e2e_latency, 0.99),
                ),
                (
                    "e2e_latency_95p",
                    "Queue e2e latency 95th percentile",
                    |t: &Topic| require_percentile(&t.e2e_latency, 0.95),
                ),
            ],
        );
        Self { gauges }
    }
}

impl StatsCollector for TopicStats {
    fn describe(&self, out: &mut Vec<Arc<Desc>>) {
        self.gauges.describe(out);
    }

    fn reset(&self) {
        self.gauges.reset();
    }

    fn set(&self, stats: &Stats) {
        self.gauges.derive(stats.topics.iter().map(|topic| {
            let labels = vec![
                "topic".to_string(),
                topic.name.clone(),
                bool_label(topic.paused),
            ];
            (labels, topic)
        }));
    }

    fn collect(&self, out: &mut Vec<Metric>) {
        self.gauges.collect(out);
    }
}
