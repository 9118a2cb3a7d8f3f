//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$DATATHREAD_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/datathread/config.toml`
//! 3. `~/.datathread/config.toml` (canonical write location)
//!
//! # Metastore Config
//!
//! Located at `<base_dir>/datathread.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g., the nil element must be a valid URN).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use super::ConfigError;
use crate::core::types::Urn;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// base_dir = "/srv/metastore"
///
/// [output]
/// pretty = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default metastore directory
    pub base_dir: Option<PathBuf>,

    /// Output defaults
    pub output: Option<OutputConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base_dir) = &self.base_dir {
            if base_dir.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "base_dir cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Metastore configuration.
///
/// # Example
///
/// ```toml
/// layers = ["automated", "edited"]
/// nil_element = "element:core:nil"
/// max_reference_depth = 64
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MetastoreConfig {
    /// Layer directories, lowest precedence first
    pub layers: Option<Vec<String>>,

    /// Element substituted for fields that resolve to nothing
    pub nil_element: Option<String>,

    /// Longest reference chain followed before giving up
    pub max_reference_depth: Option<usize>,
}

impl MetastoreConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(layers) = &self.layers {
            if layers.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "at least one layer is required".to_string(),
                ));
            }
            let mut seen = HashSet::new();
            for layer in layers {
                if layer.is_empty()
                    || layer == "."
                    || layer == ".."
                    || layer.contains(['/', '\\'])
                {
                    return Err(ConfigError::InvalidValue(format!(
                        "invalid layer name '{layer}'"
                    )));
                }
                if !seen.insert(layer.as_str()) {
                    return Err(ConfigError::InvalidValue(format!(
                        "duplicate layer '{layer}'"
                    )));
                }
            }
        }

        if let Some(nil) = &self.nil_element {
            Urn::new(nil)
                .map_err(|e| ConfigError::InvalidValue(format!("invalid nil_element: {e}")))?;
        }

        if self.max_reference_depth == Some(0) {
            return Err(ConfigError::InvalidValue(
                "max_reference_depth must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Output defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Pretty-print JSON output
    pub pretty: Option<bool>,
}
