//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! datathread has two configuration scopes:
//! - **Global**: User-level settings
//! - **Metastore**: Settings stored alongside the layer directories
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Metastore config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$DATATHREAD_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/datathread/config.toml`
//! 3. `~/.datathread/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use datathread::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/srv/metastore"))).unwrap();
//! let config = result.config;
//!
//! println!("Layers: {:?}", config.layers());
//! println!("Nil element: {}", config.nil_element());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, MetastoreConfig, OutputConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::types::Urn;

/// Default metastore directory, relative to the working directory.
pub const DEFAULT_BASE_DIR: &str = "metastore";

/// Default layers, lowest precedence first.
pub const DEFAULT_LAYERS: [&str; 2] = ["automated", "edited"];

/// Default element substituted for unresolvable fields.
pub const DEFAULT_NIL_ELEMENT: &str = "element:core:nil";

/// Default bound on reference chain length.
pub const DEFAULT_MAX_REFERENCE_DEPTH: usize = 64;

/// Name of the metastore config file inside the base directory.
pub const METASTORE_CONFIG_FILE: &str = "datathread.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// This struct provides accessor methods that apply precedence rules
/// automatically. Metastore config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Metastore configuration (if present)
    pub metastore: Option<MetastoreConfig>,
    /// Base directory the metastore config was looked up in
    base_dir: Option<PathBuf>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the metastore config file (if loaded)
    metastore_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// `base_dir` overrides the configured metastore directory. The
    /// metastore config is read from the resulting directory.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(base_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let (global, global_path) = Self::load_global()?;
        global.validate()?;

        let base = base_dir
            .map(Path::to_path_buf)
            .or_else(|| global.base_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_DIR));

        let (metastore, metastore_path) = Self::load_metastore(&base)?;
        if let Some(ref m) = metastore {
            m.validate()?;
        }

        let config = Config {
            global,
            metastore,
            base_dir: Some(base),
            global_path,
            metastore_path,
        };

        let warnings = config.layer_warnings();
        Ok(ConfigLoadResult { config, warnings })
    }

    /// Load global configuration from standard locations.
    fn load_global() -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        // 1. Check $DATATHREAD_CONFIG
        if let Ok(path) = std::env::var("DATATHREAD_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 2. Check $XDG_CONFIG_HOME/datathread/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("datathread/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.datathread/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".datathread/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    /// Load metastore configuration from the base directory.
    fn load_metastore(
        base_dir: &Path,
    ) -> Result<(Option<MetastoreConfig>, Option<PathBuf>), ConfigError> {
        let path = Self::metastore_config_path(base_dir);
        if !path.exists() {
            return Ok((None, None));
        }
        let config = Self::read_config(&path)?;
        Ok((Some(config), Some(path)))
    }

    /// Read and parse a TOML config file.
    fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Warn about configured layers with no directory on disk.
    fn layer_warnings(&self) -> Vec<ConfigWarning> {
        let base = self.base_dir();
        self.layers()
            .into_iter()
            .map(|layer| base.join(layer))
            .filter(|dir| !dir.is_dir())
            .map(|dir| ConfigWarning {
                message: "layer directory does not exist; it will be treated as empty"
                    .to_string(),
                path: dir,
            })
            .collect()
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.datathread/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".datathread/config.toml"))
    }

    /// Get the path of the metastore config inside a base directory.
    pub fn metastore_config_path(base_dir: &Path) -> PathBuf {
        base_dir.join(METASTORE_CONFIG_FILE)
    }

    /// Write global config atomically.
    ///
    /// Creates parent directories if needed. Uses atomic write
    /// (write to temp file, then rename) to prevent corruption.
    pub fn write_global(config: &GlobalConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::global_config_path()?;
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write metastore config atomically.
    pub fn write_metastore(
        base_dir: &Path,
        config: &MetastoreConfig,
    ) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::metastore_config_path(base_dir);
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write a config file atomically.
    fn write_config_atomic<T: serde::Serialize>(
        path: &Path,
        config: &T,
    ) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        // Temp file in the same directory so the rename stays atomic
        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Get the metastore base directory.
    ///
    /// Defaults to `metastore` if not configured.
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir
            .clone()
            .or_else(|| self.global.base_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_DIR))
    }

    /// Get the layer directory names, lowest precedence first.
    ///
    /// Defaults to `["automated", "edited"]`.
    pub fn layers(&self) -> Vec<String> {
        self.metastore
            .as_ref()
            .and_then(|m| m.layers.clone())
            .unwrap_or_else(|| DEFAULT_LAYERS.iter().map(|s| s.to_string()).collect())
    }

    /// Get the nil element id.
    ///
    /// Defaults to `element:core:nil`.
    pub fn nil_element(&self) -> Urn {
        self.metastore
            .as_ref()
            .and_then(|m| m.nil_element.as_deref())
            .and_then(|nil| Urn::new(nil).ok())
            .unwrap_or_else(Urn::nil)
    }

    /// Get the reference chain bound.
    ///
    /// Defaults to 64.
    pub fn max_reference_depth(&self) -> usize {
        self.metastore
            .as_ref()
            .and_then(|m| m.max_reference_depth)
            .unwrap_or(DEFAULT_MAX_REFERENCE_DEPTH)
    }

    /// Check if JSON output should be pretty-printed.
    ///
    /// Defaults to `true` if not configured.
    pub fn pretty(&self) -> bool {
        self.global
            .output
            .as_ref()
            .and_then(|o| o.pretty)
            .unwrap_or(true)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded metastore config file.
    pub fn metastore_config_loaded_from(&self) -> Option<&Path> {
        self.metastore_path.as_deref()
    }
}
