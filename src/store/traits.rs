//! store::traits
//!
//! Document storage trait definition.
//!
//! # Design
//!
//! The `DocumentStore` trait is a URN-keyed interface over JSON documents.
//! A document is addressed by a URN plus an entity kind; the kind selects
//! the file suffix, so one URN can address several documents (an element
//! and its `element_info`, for example).
//!
//! Absence is not an error: `read` returns `Ok(None)`. A document that
//! exists but cannot be parsed is always an error.
//!
//! # Example
//!
//! ```ignore
//! use datathread::store::{DocumentStore, StoreError};
//!
//! fn element_name(store: &dyn DocumentStore, urn: &Urn) -> Result<Option<String>, StoreError> {
//!     let doc = store.read_member(urn, "element", "name")?;
//!     Ok(doc.and_then(|v| v.as_str().map(str::to_string)))
//! }
//! ```

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::core::types::{TypeError, Urn};

/// Errors from document storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document exists but is not valid JSON.
    #[error("failed to parse document '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to read a document.
    #[error("failed to read document '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a document.
    #[error("failed to write document '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to enumerate documents.
    #[error("failed to walk '{path}': {message}")]
    Walk { path: PathBuf, message: String },

    /// Failed to serialize a document.
    #[error("failed to serialize document for '{urn}': {source}")]
    Serialize {
        urn: String,
        source: serde_json::Error,
    },

    /// The store has no layer to write to.
    #[error("no storage layers configured")]
    NoLayers,

    /// The kind or URN cannot be mapped to a path.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] TypeError),
}

/// Trait for JSON document stores.
///
/// Implementations must be thread-safe (Send + Sync). Each call re-reads
/// storage; implementations keep no per-request state.
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Short human-readable name used in logs.
    fn name(&self) -> &str;

    /// Read a document.
    ///
    /// Returns `Ok(Some(doc))` if the document exists.
    /// Returns `Ok(None)` if it does not.
    /// Returns `Err` if it exists but cannot be read or parsed.
    fn read(&self, urn: &Urn, kind: &str) -> Result<Option<Value>, StoreError>;

    /// Write a whole document, replacing any previous version.
    ///
    /// Returns the path written.
    fn write(&self, urn: &Urn, kind: &str, doc: &Value) -> Result<PathBuf, StoreError>;

    /// Read every document whose file name ends with `suffix`.
    ///
    /// Order is unspecified.
    fn find_all(&self, suffix: &str) -> Result<Vec<Value>, StoreError>;

    /// Read a single top-level member of a document.
    ///
    /// Returns `Ok(None)` if the document or the member is absent.
    fn read_member(
        &self,
        urn: &Urn,
        kind: &str,
        member: &str,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self
            .read(urn, kind)?
            .and_then(|doc| doc.get(member).cloned()))
    }

    /// Check if a document exists.
    ///
    /// Default implementation uses `read()` and checks for `Some`.
    fn exists(&self, urn: &Urn, kind: &str) -> Result<bool, StoreError> {
        Ok(self.read(urn, kind)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = StoreError::Parse {
            path: PathBuf::from("/m/a.element.json"),
            source: serde_json::from_str::<Value>("{").unwrap_err(),
        };
        assert!(err.to_string().contains("parse"));
        assert!(err.to_string().contains("/m/a.element.json"));

        let err = StoreError::Read {
            path: PathBuf::from("/m/x"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("read"));

        let err = StoreError::NoLayers;
        assert!(err.to_string().contains("layers"));

        let err = StoreError::from(TypeError::InvalidKind("a.b".into()));
        assert!(err.to_string().contains("a.b"));
    }
}
