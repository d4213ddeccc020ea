//! Configuration and settings errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading resources or operating on the settings store.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A resource file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A resource file is not valid JSON for the expected shape.
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The settings document could not be written back to disk.
    #[error("cannot persist settings to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A dot-path is empty or has an empty segment.
    #[error("invalid settings path {0:?}")]
    InvalidPath(String),

    /// Settings documents and defaults must be JSON objects.
    #[error("{0} must be a JSON object")]
    NotAnObject(&'static str),

    /// The operation exists on the surface but has no implementation.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}
