//! core::paths
//!
//! Centralized path routing for metastore storage locations.
//!
//! # Storage Layout
//!
//! Everything lives under one base directory:
//! - `datathread.toml` - Metastore configuration
//! - `<layer>/` - One tree per storage layer (`automated/`, `edited/`)
//! - `<layer>/<domain segments>/<name>.<kind>.json` - One file per entity
//!
//! **Hard rule:** no code outside this module joins layer names onto the
//! base directory.
//!
//! # Example
//!
//! ```
//! use datathread::core::paths::MetastorePaths;
//! use std::path::PathBuf;
//!
//! let paths = MetastorePaths::new(PathBuf::from("/srv/metastore"));
//!
//! assert_eq!(
//!     paths.layer_dir("edited"),
//!     PathBuf::from("/srv/metastore/edited")
//! );
//! ```

use std::path::{Path, PathBuf};

use super::config::METASTORE_CONFIG_FILE;

/// Centralized path routing for one metastore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetastorePaths {
    /// Root directory holding the layer trees.
    pub base_dir: PathBuf,
}

impl MetastorePaths {
    /// Create paths rooted at `base_dir`.
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Root of a storage layer.
    pub fn layer_dir(&self, layer: &str) -> PathBuf {
        self.base_dir.join(layer)
    }

    /// Roots of the given layers, in the given order.
    ///
    /// # Example
    ///
    /// ```
    /// use datathread::core::paths::MetastorePaths;
    /// use std::path::PathBuf;
    ///
    /// let paths = MetastorePaths::new(PathBuf::from("/m"));
    /// let dirs = paths.layer_dirs(&["automated".to_string(), "edited".to_string()]);
    /// assert_eq!(dirs, vec![PathBuf::from("/m/automated"), PathBuf::from("/m/edited")]);
    /// ```
    pub fn layer_dirs(&self, layers: &[String]) -> Vec<PathBuf> {
        layers.iter().map(|layer| self.layer_dir(layer)).collect()
    }

    /// Path of the metastore configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(METASTORE_CONFIG_FILE)
    }

    /// The base directory.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
