//! Channel-level gauges.

use std::sync::Arc;

use crate::metric::{Desc, Metric};
use crate::stats::{Channel, Stats};
use crate::stats_collector::{GaugeSet, StatsCollector, bool_label, require_percentile};

const LABELS: &[&str] = &["type", "topic", "channel", "paused"];

/// Emits `<namespace>_channel_*` gauges, one series per topic/channel pair.
pub struct ChannelStats {
    gauges: GaugeSet<Channel>,
}

impl ChannelStats {
    pub fn new(namespace: &str) -> Self {
        let gauges = GaugeSet::<Channel>::new(
            namespace,
            "channel",
            LABELS,
            &[
                ("client_count", "Number of clients", |c: &Channel| {
                    Ok(c.clients.len() as f64)
                }),
                ("depth", "Queue depth", |c: &Channel| Ok(c.depth as f64)),
                ("backend_depth", "Queue backend depth", |c: &Channel| {
                    Ok(c.backend_depth as f64)
                }),
                ("in_flight_count", "In flight count", |c: &Channel| {
                    Ok(c.in_flight_count as f64)
                }),
                ("deferred_count", "Deferred count", |c: &Channel| {
                    Ok(c.deferred_count as f64)
                }),
                ("message_count", "Queue message count", |c: &Channel| {
                    Ok(c.message_count as f64)
                }),
                ("requeue_count", "Requeue Count", |c: &Channel| {
                    Ok(c.requeue_count as f64)
                }),
                ("timeout_count", "Timeout count", |c: &Channel| {
                    Ok(c.timeout_count as f64)
                }),
                (
                    "e2e_latency_99p",
                    "Queue e2e latency 99th percentile",
                    |c: &Channel| require_percentile(&c.e2e_latency, 0.99),
                ),
                (
                    "e2e_latency_95p",
                    "Queue e2e latency 95th percentile",
                    |c: &Channel| require_percentile(&c.e2e_latency, 0.95),
                ),
            ],
        );
        Self { gauges }
    }
}

impl StatsCollector for ChannelStats {
    fn describe(&self, out: &mut Vec<Arc<Desc>>) {
        self.gauges.describe(out);
    }

    fn reset(&self) {
        self.gauges.reset();
    }

    fn set(&self, stats: &Stats) {
        self.gauges
            .derive(stats.topics.iter().flat_map(|topic| {
                topic.channels.iter().map(move |channel| {
                    let labels = vec![
                        "channel".to_string(),
                        topic.name.clone(),
                        channel.name.clone(),
                        bool_label(channel.paused),
                    ];
                    (labels, channel)
                })
            }));
    }

    fn collect(&self, out: &mut Vec<Metric>) {
        self.gauges.collect(out);
    }
}
