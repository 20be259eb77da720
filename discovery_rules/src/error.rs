//! Error types for loading rule sets and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or parse a rule document.
#[derive(Debug, Error)]
pub enum RuleSetError {
    #[error("failed to read rule document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON rule document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed TOML rule document: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported rule document format: {0}")]
    UnsupportedFormat(String),
}

/// Failure to read or parse the host configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
}
