//! store::file_store
//!
//! File-per-entity JSON document storage.
//!
//! # Layout
//!
//! A document for URN `<kind>:<domain-path>:<name>` lives at
//! `<base>/<domain segments>/<name>.<kind>.json`. `%20` in the domain path
//! or name is stored as a space. The kind defaults to the URN's own kind.
//!
//! # Writes
//!
//! - Parent directories are created on demand
//! - All writes are atomic (write to temp file, then rename)
//!
//! # Example
//!
//! ```
//! use datathread::core::types::Urn;
//! use datathread::store::FileStore;
//! use std::path::{Path, PathBuf};
//!
//! let store = FileStore::new("automated", PathBuf::from("/m/automated"));
//! let urn = Urn::new("element:sales/emea:order%20total").unwrap();
//!
//! assert_eq!(
//!     store.path_for(&urn, None).unwrap(),
//!     Path::new("/m/automated/sales/emea/order total.element.json")
//! );
//! ```

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;
use walkdir::WalkDir;

use super::traits::{DocumentStore, StoreError};
use crate::core::types::{validate_kind, TypeError, Urn};

/// One storage layer rooted at its own base directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Layer name, used in logs
    name: String,
    /// Root directory of this layer
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_dir`.
    ///
    /// The directory does not need to exist; reads from a missing tree
    /// find nothing and the first write creates it.
    pub fn new(name: impl Into<String>, base_dir: PathBuf) -> Self {
        Self {
            name: name.into(),
            base_dir,
        }
    }

    /// Get the root directory of this store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a URN to its document path.
    ///
    /// `kind` defaults to the URN's own kind.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidKind` if an explicit kind is not a valid
    /// file suffix.
    pub fn path_for(&self, urn: &Urn, kind: Option<&str>) -> Result<PathBuf, TypeError> {
        let kind = kind.unwrap_or_else(|| urn.kind());
        validate_kind(kind)?;

        let mut path = self.base_dir.clone();
        for segment in urn.domain_segments() {
            path.push(segment);
        }
        path.push(format!("{}.{kind}.json", urn.file_stem()));
        Ok(path)
    }

    fn read_path(path: &Path) -> Result<Option<Value>, StoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Parse {
                path: path.to_path_buf(),
                source: e,
            })
    }

    /// Write bytes to `path` through a temp file in the same directory.
    fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| StoreError::Write { path, source }
        };

        let parent = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(write_err(parent))?;

        // Unique per writer so concurrent writes never share a temp file
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_path = parent.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

        let result = (|| {
            let mut file = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&temp_path)
                .map_err(write_err(&temp_path))?;
            file.write_all(contents).map_err(write_err(&temp_path))?;
            file.sync_all().map_err(write_err(&temp_path))?;
            fs::rename(&temp_path, path).map_err(write_err(path))
        })();

        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

impl DocumentStore for FileStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, urn: &Urn, kind: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(urn, Some(kind))?;
        let doc = Self::read_path(&path)?;
        debug!(
            layer = %self.name,
            urn = %urn,
            kind,
            found = doc.is_some(),
            "read document"
        );
        Ok(doc)
    }

    fn write(&self, urn: &Urn, kind: &str, doc: &Value) -> Result<PathBuf, StoreError> {
        let path = self.path_for(urn, Some(kind))?;
        let contents = serde_json::to_vec_pretty(doc).map_err(|e| StoreError::Serialize {
            urn: urn.to_string(),
            source: e,
        })?;

        Self::write_atomic(&path, &contents)?;
        debug!(layer = %self.name, urn = %urn, kind, path = %path.display(), "wrote document");
        Ok(path)
    }

    fn find_all(&self, suffix: &str) -> Result<Vec<Value>, StoreError> {
        if !self.base_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut docs = Vec::new();
        for entry in WalkDir::new(&self.base_dir)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| StoreError::Walk {
                path: e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.base_dir.clone()),
                message: e.to_string(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }
            if !entry.file_name().to_string_lossy().ends_with(suffix) {
                continue;
            }
            if let Some(doc) = Self::read_path(entry.path())? {
                docs.push(doc);
            }
        }

        debug!(layer = %self.name, suffix, count = docs.len(), "enumerated documents");
        Ok(docs)
    }
}
