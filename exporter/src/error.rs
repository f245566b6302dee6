//! Error types for the exporter.

/// Error type for exporter setup and exposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid flags, config file contents or collector selection.
    InvalidConfig(String),

    /// Errors from the stats collection layer.
    Collector(collector::Error),

    /// Encoding metrics into the exposition format failed.
    Encoding(String),

    /// Reading the config file or binding the listener failed.
    Io(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Collector(err) => write!(f, "{}", err),
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl From<collector::Error> for Error {
    fn from(err: collector::Error) -> Self {
        Error::Collector(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// Result type alias for exporter operations.
pub type Result<T> = std::result::Result<T, Error>;
