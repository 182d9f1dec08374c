// Error types for handlehunt
// Per-probe failures are recovered into results; only ScanError aborts a batch

use std::io;

use serde::Serialize;
use thiserror::Error;

/// Maximum length of a transport error message kept in a result.
pub const MAX_ERROR_MESSAGE_LEN: usize = 50;

/// Classified failure of a single probe attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum ProbeError {
    #[error("Timeout")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
}

impl ProbeError {
    /// Build a network error, truncating the message for reporting.
    pub fn network(message: impl AsRef<str>) -> Self {
        ProbeError::Network(truncate_message(message.as_ref(), MAX_ERROR_MESSAGE_LEN))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout)
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::Timeout
        } else {
            ProbeError::network(err.to_string())
        }
    }
}

/// Skip signal for a rule that cannot be turned into a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("rule '{name}' has no {{account}} placeholder in its URI template")]
pub struct MalformedRule {
    pub name: String,
}

/// Catalog could not be loaded.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog not found: {0}")]
    NotFound(String),
    #[error("failed to read catalog: {0}")]
    Io(#[from] io::Error),
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Configuration file or value is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u64,
        max: u64,
        value: u64,
    },
}

/// Errors that abort a whole batch or the surrounding run.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("batch failure: {0}")]
    BatchFailure(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Truncate on a char boundary so multi-byte messages never panic.
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    message.chars().take(max_chars).collect()
}
