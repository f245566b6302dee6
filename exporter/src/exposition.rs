//! Prometheus exposition of the executor's describe/collect output.
//!
//! The executor is described once, when it is registered here. Each render
//! runs one scrape and encodes its samples, grouped into the described
//! families, next to the executor's scrape duration histogram.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use std::sync::Arc;

use collector::{Desc, Metric, MetricKind, NsqExecutor};
use prometheus_client::collector::Collector;
use prometheus_client::encoding::{
    DescriptorEncoder, EncodeLabelValue, EncodeMetric, LabelValueEncoder,
};
use prometheus_client::metrics::MetricType;
use prometheus_client::metrics::gauge::ConstGauge;
use prometheus_client::registry::Registry;

use crate::error::{Error, Result};

/// Content type of the rendered exposition.
pub const CONTENT_TYPE: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Encodes scrapes of a registered [`NsqExecutor`].
pub struct Exposition {
    executor: Arc<NsqExecutor>,
    descs: Vec<Arc<Desc>>,
    index: HashMap<String, usize>,
}

impl Exposition {
    /// Describes the executor and keeps its descriptors for every later
    /// render.
    ///
    /// Fails if two descriptors share a name, e.g. when the same collector
    /// was selected twice.
    pub fn register(executor: Arc<NsqExecutor>) -> Result<Self> {
        let mut descs = Vec::new();
        executor.describe(&mut descs);

        let mut seen = HashSet::new();
        for desc in &descs {
            if !seen.insert(desc.name.as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "metric described more than once: {}",
                    desc.name
                )));
            }
        }

        let index = descs
            .iter()
            .enumerate()
            .map(|(i, desc)| (desc.name.clone(), i))
            .collect();

        tracing::debug!(families = descs.len(), "registered nsq executor");
        Ok(Self {
            executor,
            descs,
            index,
        })
    }

    /// Descriptors captured at registration, in describe order.
    pub fn descs(&self) -> &[Arc<Desc>] {
        &self.descs
    }

    /// Runs one scrape and encodes it in the OpenMetrics text format.
    pub async fn render(&self) -> Result<String> {
        let mut metrics = Vec::new();
        self.executor.collect(&mut metrics).await;

        let mut registry = Registry::default();
        let scrape = self.executor.scrape_desc();
        registry.register(
            scrape.name.clone(),
            scrape.help.clone(),
            self.executor.scrape_duration().clone(),
        );
        registry.register_collector(Box::new(self.group(metrics)));

        let mut buffer = String::new();
        prometheus_client::encoding::text::encode(&mut buffer, &registry)
            .map_err(|e| Error::Encoding(e.to_string()))?;
        Ok(buffer)
    }

    /// Sorts samples into their described families, dropping any sample
    /// whose family was not described or whose labels do not fit it.
    fn group(&self, metrics: Vec<Metric>) -> GaugeFamilies {
        let mut families: Vec<(Arc<Desc>, Vec<Metric>)> = self
            .descs
            .iter()
            .map(|desc| (desc.clone(), Vec::new()))
            .collect();

        for metric in metrics {
            let Some(&i) = self.index.get(&metric.desc.name) else {
                tracing::warn!(metric = %metric.desc.name, "dropping undescribed metric");
                continue;
            };
            let (desc, samples) = &mut families[i];
            if desc.kind != MetricKind::Gauge
                || metric.label_values.len() != desc.label_names.len()
            {
                tracing::warn!(
                    metric = %metric.desc.name,
                    labels = ?metric.label_values,
                    "dropping metric inconsistent with its description"
                );
                continue;
            }
            samples.push(metric);
        }

        families.retain(|(_, samples)| !samples.is_empty());
        GaugeFamilies { families }
    }
}

/// One scrape's gauge samples, grouped by family.
#[derive(Debug)]
struct GaugeFamilies {
    families: Vec<(Arc<Desc>, Vec<Metric>)>,
}

impl Collector for GaugeFamilies {
    fn encode(&self, mut encoder: DescriptorEncoder) -> std::result::Result<(), std::fmt::Error> {
        for (desc, samples) in &self.families {
            let mut metric_encoder =
                encoder.encode_descriptor(&desc.name, &desc.help, None, MetricType::Gauge)?;
            for sample in samples {
                let labels: Vec<(&str, EscapedLabelValue)> = sample
                    .labels()
                    .map(|(name, value)| (name, EscapedLabelValue(value)))
                    .collect();
                let family_encoder = metric_encoder.encode_family(&labels)?;
                ConstGauge::new(sample.value).encode(family_encoder)?;
            }
        }
        Ok(())
    }
}

/// A label value taken from nsqd, escaped for the text format.
///
/// Client ids and hostnames are chosen by consumers and may contain quotes,
/// backslashes or newlines.
#[derive(Debug)]
struct EscapedLabelValue<'a>(&'a str);

impl EncodeLabelValue for EscapedLabelValue<'_> {
    fn encode(&self, encoder: &mut LabelValueEncoder<'_>) -> std::result::Result<(), std::fmt::Error> {
        for c in self.0.chars() {
            match c {
                '\\' => encoder.write_str("\\\\")?,
                '"' => encoder.write_str("\\\"")?,
                '\n' => encoder.write_str("\\n")?,
                c => encoder.write_char(c)?,
            }
        }
        Ok(())
    }
}
