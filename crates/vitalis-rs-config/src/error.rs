//! Error types for config loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An explicitly requested config file does not exist.
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to parse {label}: {source}")]
    Parse {
        label: String,
        #[source]
        source: json5::Error,
    },
    /// The merged document does not fit the config model.
    #[error("failed to decode config: {0}")]
    Decode(#[from] serde_json::Error),
    /// A field failed schema or invariant validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
}
