//! Error types for the collector crate.

/// Error type for scrape operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Fetching or decoding the nsqd stats snapshot failed.
    ///
    /// Connect failures, timeouts, non-success HTTP statuses and undecodable
    /// bodies all land here; a scrape only distinguishes success from error.
    Fetch(String),

    /// The stats client could not be constructed.
    Config(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Fetch(msg) => write!(f, "Stats fetch error: {}", msg),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

/// Result type alias for collector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A problem deriving a single sample from one entity of a snapshot.
///
/// Never escapes [`StatsCollector::set`](crate::StatsCollector::set): the
/// offending sample is skipped and the rest of the snapshot is still used.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivationError {
    /// The entity reports no value for the requested e2e latency quantile.
    MissingPercentile { quantile: f64 },

    /// Another entity of the same scope (`topic`, `channel`, `client`) in the
    /// snapshot already produced this label set.
    DuplicateSeries { scope: String, labels: Vec<String> },
}

impl std::error::Error for DerivationError {}

impl std::fmt::Display for DerivationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DerivationError::MissingPercentile { quantile } => {
                write!(f, "No e2e latency percentile for quantile {}", quantile)
            }
            DerivationError::DuplicateSeries { scope, labels } => {
                write!(f, "Duplicate {} series with labels {:?}", scope, labels)
            }
        }
    }
}
