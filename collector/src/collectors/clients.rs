//! Client-level gauges.

use std::sync::Arc;

use crate::metric::{Desc, Metric};
use crate::stats::{Client, Stats};
use crate::stats_collector::{GaugeSet, StatsCollector, bool_label};

const LABELS: &[&str] = &[
    "type",
    "topic",
    "channel",
    "deflate",
    "snappy",
    "tls",
    "client_id",
    "hostname",
    "version",
    "remote_address",
];

/// Emits `<namespace>_client_*` gauges, one series per connected consumer.
///
/// Client cardinality follows consumer churn, so this collector is not
/// enabled by default.
pub struct ClientStats {
    gauges: GaugeSet<Client>,
}

impl ClientStats {
    pub fn new(namespace: &str) -> Self {
        let gauges = GaugeSet::<Client>::new(
            namespace,
            "client",
            LABELS,
            &[
                ("state", "State of client", |c: &Client| Ok(c.state as f64)),
                ("ready_count", "Ready count", |c: &Client| {
                    Ok(c.ready_count as f64)
                }),
                ("in_flight_count", "In flight count", |c: &Client| {
                    Ok(c.in_flight_count as f64)
                }),
                ("message_count", "Queue message count", |c: &Client| {
                    Ok(c.message_count as f64)
                }),
                ("finish_count", "Finish count", |c: &Client| {
                    Ok(c.finish_count as f64)
                }),
                ("requeue_count", "Requeue count", |c: &Client| {
                    Ok(c.requeue_count as f64)
                }),
                ("connect_ts", "Connect timestamp", |c: &Client| {
                    Ok(c.connect_time as f64)
                }),
            ],
        );
        Self { gauges }
    }
}

impl StatsCollector for ClientStats {
    fn describe(&self, out: &mut Vec<Arc<Desc>>) {
        self.gauges.describe(out);
    }

    fn reset(&self) {
        self.gauges.reset();
    }

    fn set(&self, stats: &Stats) {
        let rows = stats.topics.iter().flat_map(|topic| {
            topic.channels.iter().flat_map(move |channel| {
                channel.clients.iter().map(move |client| {
                    let labels = vec![
                        "client".to_string(),
                        topic.name.clone(),
                        channel.name.clone(),
                        bool_label(client.deflate),
                        bool_label(client.snappy),
                        bool_label(client.tls),
                        client.id.clone(),
                        client.hostname.clone(),
                        client.version.clone(),
                        client.remote_address.clone(),
                    ];
                    (labels, client)
                })
            })
        });
        self.gauges.derive(rows);
    }

    fn collect(&self, out: &mut Vec<Metric>) {
        self.gauges.collect(out);
    }
}
