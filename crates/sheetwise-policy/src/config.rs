//! Policy configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for [`InvalidationPolicy`](crate::InvalidationPolicy).
///
/// Loaded from TOML; every key is optional.
///
/// ```toml
/// cache_graph = true
/// bump_included_sheets_on_full_recompile = false
/// dedup_actions = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Reuse the dependency graph while the project's inclusion generation
    /// is unchanged.
    pub cache_graph: bool,
    /// A scene-scoped full recompile also stamps every independently
    /// compiled sheet the scene reaches.
    pub bump_included_sheets_on_full_recompile: bool,
    /// Drop repeated actions, keeping the first occurrence.
    pub dedup_actions: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            cache_graph: true,
            bump_included_sheets_on_full_recompile: false,
            dedup_actions: true,
        }
    }
}

impl PolicyConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!("Loaded policy config from {}", path.display());
        Ok(config)
    }
}
