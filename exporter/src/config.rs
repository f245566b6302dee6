//! Exporter configuration: defaults, TOML file, command-line flags, and the
//! startup wiring derived from them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use collector::{CollectorTable, NsqExecutor, StatsCollector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Prefix every entry of the collector list must carry.
const STATS_PREFIX: &str = "stats";

/// Configuration for the exporter.
///
/// Every field has a default, so a config file only needs the values it
/// changes.
///
/// # Example
///
/// ```toml
/// listen_address = ":9118"
/// nsqd_url = "nsqd-1.internal:4151"
/// collectors = "stats.topics,stats.channels,stats.clients"
/// timeout = "2s"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Address on which to expose metrics and the web interface. A bare
    /// `:port` listens on all interfaces.
    pub listen_address: String,

    /// Path under which to expose metrics.
    pub telemetry_path: String,

    /// Address of the nsqd node. Normalized with [`normalize_url`] before use.
    pub nsqd_url: String,

    /// Comma-separated list of collectors, e.g. `stats.topics,stats.channels`.
    pub collectors: String,

    /// Timeout for fetching stats from nsqd.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Namespace prefix of every exported metric.
    pub namespace: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_address: ":9118".to_string(),
            telemetry_path: "/metrics".to_string(),
            nsqd_url: "http://localhost:4151/stats".to_string(),
            collectors: "stats.topics,stats.channels".to_string(),
            timeout: Duration::from_secs(5),
            namespace: "nsq".to_string(),
        }
    }
}

impl ExporterConfig {
    /// Parses a TOML config, filling unspecified fields with defaults.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Checks values that cannot be represented as a router or listener.
    pub fn validate(&self) -> Result<()> {
        if !self.telemetry_path.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "telemetry path must start with '/': {}",
                self.telemetry_path
            )));
        }
        if self.telemetry_path == crate::server::HEALTH_PATH {
            return Err(Error::InvalidConfig(format!(
                "telemetry path conflicts with the health endpoint: {}",
                self.telemetry_path
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// The address to bind, with a bare `:port` expanded to all interfaces.
    pub fn bind_address(&self) -> String {
        if self.listen_address.starts_with(':') {
            format!("0.0.0.0{}", self.listen_address)
        } else {
            self.listen_address.clone()
        }
    }

    /// Builds the executor with every selected collector registered.
    pub fn create_executor(&self, table: &CollectorTable) -> Result<NsqExecutor> {
        let nsqd_url = normalize_url(&self.nsqd_url)?;
        let executor = NsqExecutor::new(&self.namespace, &nsqd_url, self.timeout)?;
        for collector in select_collectors(&self.collectors, table, &self.namespace)? {
            executor.use_collector(collector);
        }
        tracing::info!(
            nsqd_url = %nsqd_url,
            collectors = %self.collectors,
            timeout = ?self.timeout,
            "created nsq executor"
        );
        Ok(executor)
    }
}

/// Normalizes an nsqd address into a stats URL.
///
/// The address is lower-cased, `http://` is assumed when no scheme is given,
/// a missing path becomes `/stats`, and the query is replaced with
/// `format=json`.
pub fn normalize_url(raw: &str) -> Result<String> {
    let lower = raw.trim().to_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        lower
    } else {
        format!("http://{}", lower)
    };

    let mut url = Url::parse(&with_scheme)
        .map_err(|e| Error::InvalidConfig(format!("invalid nsqd address {}: {}", raw, e)))?;
    // The parser reports "/" for both "host" and "host/"; only the former
    // gets the default path.
    if !has_explicit_path(&with_scheme) {
        url.set_path("/stats");
    }
    url.set_query(Some("format=json"));
    Ok(url.to_string())
}

/// Whether anything follows the authority of `url` as a path.
fn has_explicit_path(url: &str) -> bool {
    let rest = url.find("://").map_or(url, |i| &url[i + 3..]);
    rest.find(|c: char| matches!(c, '/' | '?' | '#'))
        .is_some_and(|i| rest[i..].starts_with('/'))
}

/// Resolves a comma-separated `stats.<name>` list against `table`.
///
/// Collectors are returned in list order.
pub fn select_collectors(
    list: &str,
    table: &CollectorTable,
    namespace: &str,
) -> Result<Vec<Arc<dyn StatsCollector>>> {
    let mut collectors = Vec::new();
    for param in list.split(',') {
        let param = param.trim();
        let (prefix, name) = param
            .split_once('.')
            .ok_or_else(|| Error::InvalidConfig(format!("invalid collector name: {}", param)))?;
        if prefix != STATS_PREFIX {
            return Err(Error::InvalidConfig(format!(
                "invalid collector prefix: {}",
                prefix
            )));
        }
        let collector = table
            .build(name, namespace)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown stats collector: {}", name)))?;
        collectors.push(collector);
    }
    Ok(collectors)
}

/// Command-line arguments for the exporter.
///
/// Flags override values from `--config`, which in turn override the
/// defaults.
#[derive(Parser, Debug, Default)]
#[command(
    name = "nsq_exporter",
    version,
    about = "Prometheus exporter for nsqd statistics"
)]
pub struct CliArgs {
    /// Path to config file (TOML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address on which to expose metrics and web interface.
    #[arg(long = "web.listen-address", value_name = "ADDR")]
    pub listen_address: Option<String>,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", value_name = "PATH")]
    pub telemetry_path: Option<String>,

    /// Address of the nsqd node.
    #[arg(long = "nsqd.addr", value_name = "URL")]
    pub nsqd_url: Option<String>,

    /// Comma-separated list of collectors to use.
    #[arg(long = "collect", value_name = "LIST")]
    pub collectors: Option<String>,

    /// Timeout for trying to get stats from nsqd, e.g. `5s` or `500ms`.
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Namespace for the NSQ metrics.
    #[arg(long)]
    pub namespace: Option<String>,
}

impl CliArgs {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Loads the config file, if any, and applies flag overrides.
    pub fn load_config(&self) -> Result<ExporterConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|e| {
                    Error::Io(format!("failed to read {}: {}", path.display(), e))
                })?;
                ExporterConfig::from_toml(&contents)?
            }
            None => ExporterConfig::default(),
        };

        if let Some(listen_address) = &self.listen_address {
            config.listen_address = listen_address.clone();
        }
        if let Some(telemetry_path) = &self.telemetry_path {
            config.telemetry_path = telemetry_path.clone();
        }
        if let Some(nsqd_url) = &self.nsqd_url {
            config.nsqd_url = nsqd_url.clone();
        }
        if let Some(collectors) = &self.collectors {
            config.collectors = collectors.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn should_default_to_upstream_flag_values() {
        // when
        let config = ExporterConfig::default();

        // then
        assert_eq!(config.listen_address, ":9118");
        assert_eq!(config.telemetry_path, "/metrics");
        assert_eq!(config.nsqd_url, "http://localhost:4151/stats");
        assert_eq!(config.collectors, "stats.topics,stats.channels");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.namespace, "nsq");
    }

    #[test]
    fn should_add_scheme_path_and_query() {
        assert_eq!(
            normalize_url("localhost:4151").unwrap(),
            "http://localhost:4151/stats?format=json"
        );
    }

    #[test]
    fn should_lowercase_address() {
        assert_eq!(
            normalize_url("HTTP://NSQD.Example.com:4151").unwrap(),
            "http://nsqd.example.com:4151/stats?format=json"
        );
    }

    #[test]
    fn should_keep_explicit_path_and_replace_query() {
        assert_eq!(
            normalize_url("https://nsqd:4151/custom/stats?format=text&topic=a").unwrap(),
            "https://nsqd:4151/custom/stats?format=json"
        );
    }

    #[test]
    fn should_keep_explicit_root_path() {
        assert_eq!(
            normalize_url("http://nsqd:4151/").unwrap(),
            "http://nsqd:4151/?format=json"
        );
    }

    #[test]
    fn should_default_path_when_only_query_is_given() {
        assert_eq!(
            normalize_url("nsqd:4151?format=text").unwrap(),
            "http://nsqd:4151/stats?format=json"
        );
    }

    #[test]
    fn should_reject_unparseable_address() {
        // when
        let result = normalize_url("http://exa mple:4151");

        // then
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn should_select_collectors_in_list_order() {
        // given
        let table = CollectorTable::builtin();

        // when
        let collectors =
            select_collectors(" stats.channels , stats.topics", &table, "nsq").unwrap();

        // then
        let first_names: Vec<_> = collectors
            .iter()
            .map(|c| {
                let mut descs = Vec::new();
                c.describe(&mut descs);
                descs[0].name.clone()
            })
            .collect();
        assert_eq!(
            first_names,
            vec!["nsq_channel_client_count", "nsq_topic_channel_count"]
        );
    }

    #[test]
    fn should_reject_collector_without_prefix() {
        // when
        let result = select_collectors("topics", &CollectorTable::builtin(), "nsq");

        // then
        assert_eq!(
            result.err(),
            Some(Error::InvalidConfig(
                "invalid collector name: topics".to_string()
            ))
        );
    }

    #[test]
    fn should_reject_unknown_prefix() {
        // when
        let result = select_collectors("metrics.topics", &CollectorTable::builtin(), "nsq");

        // then
        assert_eq!(
            result.err(),
            Some(Error::InvalidConfig(
                "invalid collector prefix: metrics".to_string()
            ))
        );
    }

    #[test]
    fn should_reject_unknown_collector() {
        // when
        let result = select_collectors(
            "stats.topics,stats.producers",
            &CollectorTable::builtin(),
            "nsq",
        );

        // then
        assert_eq!(
            result.err(),
            Some(Error::InvalidConfig(
                "unknown stats collector: producers".to_string()
            ))
        );
    }

    #[test]
    fn should_reject_empty_collector_list() {
        // when
        let result = select_collectors("", &CollectorTable::builtin(), "nsq");

        // then
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn should_expand_bare_port_to_all_interfaces() {
        // given
        let mut config = ExporterConfig::default();

        // then
        assert_eq!(config.bind_address(), "0.0.0.0:9118");
        config.listen_address = "127.0.0.1:9200".to_string();
        assert_eq!(config.bind_address(), "127.0.0.1:9200");
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        // given
        let contents = r#"
            nsqd_url = "nsqd-1:4151"
            timeout = "250ms"
        "#;

        // when
        let config = ExporterConfig::from_toml(contents).unwrap();

        // then
        assert_eq!(config.nsqd_url, "nsqd-1:4151");
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.namespace, "nsq");
    }

    #[test]
    fn should_override_file_values_with_flags() {
        // given
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "namespace = \"queue\"\ntimeout = \"2s\"").unwrap();
        let args = CliArgs::parse_from([
            "nsq_exporter",
            "--config",
            file.path().to_str().unwrap(),
            "--timeout",
            "750ms",
            "--collect",
            "stats.clients",
        ]);

        // when
        let config = args.load_config().unwrap();

        // then
        assert_eq!(config.namespace, "queue");
        assert_eq!(config.timeout, Duration::from_millis(750));
        assert_eq!(config.collectors, "stats.clients");
        assert_eq!(config.telemetry_path, "/metrics");
    }

    #[test]
    fn should_parse_dotted_flags() {
        // when
        let args = CliArgs::parse_from([
            "nsq_exporter",
            "--web.listen-address",
            ":9200",
            "--web.telemetry-path",
            "/nsq-metrics",
            "--nsqd.addr",
            "nsqd:4151",
        ]);
        let config = args.load_config().unwrap();

        // then
        assert_eq!(config.listen_address, ":9200");
        assert_eq!(config.telemetry_path, "/nsq-metrics");
        assert_eq!(config.nsqd_url, "nsqd:4151");
    }

    #[test]
    fn should_reject_relative_telemetry_path() {
        // given
        let args = CliArgs::parse_from(["nsq_exporter", "--web.telemetry-path", "metrics"]);

        // when
        let result = args.load_config();

        // then
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn should_fail_on_missing_config_file() {
        // given
        let args = CliArgs::parse_from(["nsq_exporter", "--config", "/nonexistent/exporter.toml"]);

        // when
        let result = args.load_config();

        // then
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn should_create_executor_with_selected_collectors() {
        // given
        let config = ExporterConfig {
            collectors: "stats.topics,stats.channels,stats.clients".to_string(),
            ..Default::default()
        };

        // when
        let executor = config.create_executor(&CollectorTable::builtin()).unwrap();

        // then
        assert_eq!(executor.collector_count(), 3);
    }
}
