//! Config errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A config source is not valid JSON5.
    #[error("failed to parse config {origin}: {source}")]
    ParseFailed {
        origin: String,
        #[source]
        source: json5::Error,
    },
    /// The merged document does not decode into `MnemosConfig`.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A field failed schema or range validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
}
