//! The describe/reset/set/collect contract shared by all stats collectors.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::DerivationError;
use crate::metric::{Desc, Metric, MetricKind, fq_name};
use crate::stats::Stats;

/// A pluggable unit that turns a [`Stats`] snapshot into labeled samples for
/// one entity scope.
///
/// The executor drives every registered collector through the same sequence
/// on each scrape: [`reset`](Self::reset), then, only if the snapshot was
/// fetched, [`set`](Self::set) followed by [`collect`](Self::collect).
/// [`describe`](Self::describe) is called once when the executor is
/// registered with the exposition layer.
pub trait StatsCollector: Send + Sync {
    /// Appends every metric descriptor this collector can ever emit.
    fn describe(&self, out: &mut Vec<Arc<Desc>>);

    /// Drops all derived values. Idempotent, and valid before any `set`.
    fn reset(&self);

    /// Derives values from `stats`.
    ///
    /// Malformed entities are skipped one sample at a time; this never fails
    /// as a whole.
    fn set(&self, stats: &Stats);

    /// Appends the values derived by the last `set`. Emits nothing after a
    /// `reset` that was not followed by a `set`.
    fn collect(&self, out: &mut Vec<Metric>);
}

/// Extracts one gauge value from an entity.
pub(crate) type ValueFn<E> = fn(&E) -> Result<f64, DerivationError>;

/// A gauge family fed by one field of every entity in a scope.
struct StatGauge<E> {
    desc: Arc<Desc>,
    value: ValueFn<E>,
}

/// Derived-value storage shared by the topic, channel and client collectors.
///
/// Holds one gauge per field and the samples derived by the last `set`,
/// stored family-major so a collect emits each metric name contiguously.
pub(crate) struct GaugeSet<E> {
    scope: &'static str,
    gauges: Vec<StatGauge<E>>,
    values: Mutex<Vec<Metric>>,
}

impl<E> GaugeSet<E> {
    pub(crate) fn new(
        namespace: &str,
        scope: &'static str,
        label_names: &[&'static str],
        fields: &[(&str, &str, ValueFn<E>)],
    ) -> Self {
        let gauges = fields
            .iter()
            .map(|(name, help, value)| StatGauge {
                desc: Arc::new(Desc::new(
                    fq_name(namespace, scope, name),
                    *help,
                    MetricKind::Gauge,
                    label_names,
                )),
                value: *value,
            })
            .collect();
        Self {
            scope,
            gauges,
            values: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn describe(&self, out: &mut Vec<Arc<Desc>>) {
        out.extend(self.gauges.iter().map(|g| g.desc.clone()));
    }

    pub(crate) fn reset(&self) {
        self.values.lock().clear();
    }

    /// Replaces the derived values with those computed from `rows`, each a
    /// label value list and the entity it belongs to.
    pub(crate) fn derive<'a>(&self, rows: impl IntoIterator<Item = (Vec<String>, &'a E)>)
    where
        E: 'a,
    {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for (labels, entity) in rows {
            if seen.contains(&labels) {
                let err = DerivationError::DuplicateSeries {
                    scope: self.scope.to_string(),
                    labels,
                };
                tracing::debug!(scope = self.scope, error = %err, "skipping entity");
                continue;
            }
            seen.insert(labels.clone());
            unique.push((labels, entity));
        }

        let mut values = Vec::with_capacity(self.gauges.len() * unique.len());
        for gauge in &self.gauges {
            for (labels, entity) in &unique {
                match (gauge.value)(entity) {
                    Ok(value) => values.push(Metric {
                        desc: gauge.desc.clone(),
                        label_values: labels.clone(),
                        value,
                    }),
                    Err(err) => {
                        tracing::debug!(
                            metric = %gauge.desc.name,
                            labels = ?labels,
                            error = %err,
                            "skipping sample"
                        );
                    }
                }
            }
        }

        *self.values.lock() = values;
    }

    pub(crate) fn collect(&self, out: &mut Vec<Metric>) {
        out.extend(self.values.lock().iter().cloned());
    }
}

/// Formats a boolean as a `true`/`false` label value.
pub(crate) fn bool_label(value: bool) -> String {
    value.to_string()
}

/// Value function for an e2e latency quantile that must be present.
pub(crate) fn require_percentile(
    latency: &crate::stats::E2eLatency,
    quantile: f64,
) -> Result<f64, DerivationError> {
    latency
        .percentile(quantile)
        .ok_or(DerivationError::MissingPercentile { quantile })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        value: i64,
    }

    fn row_value(row: &Row) -> Result<f64, DerivationError> {
        if row.value < 0 {
            return Err(DerivationError::MissingPercentile { quantile: 0.99 });
        }
        Ok(row.value as f64)
    }

    fn gauge_set() -> GaugeSet<Row> {
        GaugeSet::<Row>::new(
            "nsq",
            "row",
            &["name"],
            &[
                ("value", "Row value", row_value),
                ("double", "Twice the row value", |r: &Row| {
                    Ok(2.0 * r.value as f64)
                }),
            ],
        )
    }

    fn collected(set: &GaugeSet<Row>) -> Vec<(String, String, f64)> {
        let mut out = Vec::new();
        set.collect(&mut out);
        out.into_iter()
            .map(|m| (m.desc.name.clone(), m.label_values[0].clone(), m.value))
            .collect()
    }

    #[test]
    fn should_describe_one_gauge_per_field() {
        // when
        let mut descs = Vec::new();
        gauge_set().describe(&mut descs);

        // then
        let names: Vec<_> = descs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["nsq_row_value", "nsq_row_double"]);
        assert!(descs.iter().all(|d| d.label_names == vec!["name"]));
    }

    #[test]
    fn should_emit_family_major() {
        // given
        let set = gauge_set();
        let a = Row { value: 1 };
        let b = Row { value: 2 };

        // when
        set.derive(vec![(vec!["a".to_string()], &a), (vec!["b".to_string()], &b)]);

        // then
        assert_eq!(
            collected(&set),
            vec![
                ("nsq_row_value".to_string(), "a".to_string(), 1.0),
                ("nsq_row_value".to_string(), "b".to_string(), 2.0),
                ("nsq_row_double".to_string(), "a".to_string(), 2.0),
                ("nsq_row_double".to_string(), "b".to_string(), 4.0),
            ]
        );
    }

    #[test]
    fn should_skip_only_the_failing_sample() {
        // given
        let set = gauge_set();
        let bad = Row { value: -1 };
        let good = Row { value: 3 };

        // when
        set.derive(vec![
            (vec!["bad".to_string()], &bad),
            (vec!["good".to_string()], &good),
        ]);

        // then
        assert_eq!(
            collected(&set),
            vec![
                ("nsq_row_value".to_string(), "good".to_string(), 3.0),
                ("nsq_row_double".to_string(), "bad".to_string(), -2.0),
                ("nsq_row_double".to_string(), "good".to_string(), 6.0),
            ]
        );
    }

    #[test]
    fn should_keep_first_of_duplicate_label_sets() {
        // given
        let set = gauge_set();
        let first = Row { value: 1 };
        let second = Row { value: 9 };

        // when
        set.derive(vec![
            (vec!["same".to_string()], &first),
            (vec!["same".to_string()], &second),
        ]);

        // then
        assert_eq!(
            collected(&set),
            vec![
                ("nsq_row_value".to_string(), "same".to_string(), 1.0),
                ("nsq_row_double".to_string(), "same".to_string(), 2.0),
            ]
        );
    }

    #[test]
    fn should_emit_nothing_after_reset() {
        // given
        let set = gauge_set();
        let a = Row { value: 1 };
        set.derive(vec![(vec!["a".to_string()], &a)]);

        // when
        set.reset();
        let once = collected(&set);
        set.reset();
        let twice = collected(&set);

        // then
        assert!(once.is_empty());
        assert_eq!(once, twice);
    }
}
