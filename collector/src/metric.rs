//! Metric descriptors and samples exchanged over the describe/collect
//! protocol.

use std::sync::Arc;

/// The kind of metric a [`Desc`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Gauge,
    Histogram,
}

/// Static metadata for one metric family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Desc {
    /// Fully-qualified name, e.g. `nsq_topic_depth`.
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub label_names: Vec<&'static str>,
}

impl Desc {
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        kind: MetricKind,
        label_names: &[&'static str],
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind,
            label_names: label_names.to_vec(),
        }
    }
}

/// One labeled sample of a described metric family.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub desc: Arc<Desc>,
    /// Label values, positionally matching `desc.label_names`.
    pub label_values: Vec<String>,
    pub value: f64,
}

impl Metric {
    /// Label name/value pairs in descriptor order.
    pub fn labels(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.desc
            .label_names
            .iter()
            .copied()
            .zip(self.label_values.iter().map(String::as_str))
    }

    /// Value of the label called `name`, if the descriptor has one.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels().find(|(k, _)| *k == name).map(|(_, v)| v)
    }
}

/// Joins the non-empty parts of a metric name with underscores.
pub fn fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_join_all_name_parts() {
        assert_eq!(fq_name("nsq", "topic", "depth"), "nsq_topic_depth");
    }

    #[test]
    fn should_skip_empty_name_parts() {
        assert_eq!(fq_name("", "topic", "depth"), "topic_depth");
        assert_eq!(fq_name("nsq", "", "depth"), "nsq_depth");
        assert_eq!(fq_name("", "", "depth"), "depth");
    }

    #[test]
    fn should_pair_label_names_with_values() {
        // given
        let desc = Arc::new(Desc::new(
            "nsq_topic_depth",
            "Queue depth",
            MetricKind::Gauge,
            &["type", "topic"],
        ));
        let metric = Metric {
            desc,
            label_values: vec!["topic".to_string(), "orders".to_string()],
            value: 3.0,
        };

        // then
        let labels: Vec<_> = metric.labels().collect();
        assert_eq!(labels, vec![("type", "topic"), ("topic", "orders")]);
        assert_eq!(metric.label("topic"), Some("orders"));
        assert_eq!(metric.label("channel"), None);
    }
}
