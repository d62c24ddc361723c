//! Error types for invalidation decisions

use std::path::PathBuf;

use sheetwise_core::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    /// A unit named by the edit (or its origin) does not exist.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A recheck action reached a sink without being expanded first.
    #[error("recheck for {0} must be resolved against the project before it is applied")]
    UnresolvedRecheck(sheetwise_core::UnitId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid policy config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
