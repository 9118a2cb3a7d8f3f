//! store::layers
//!
//! Precedence-ordered aggregation of storage layers.
//!
//! Layers are held lowest precedence first, matching the configured order
//! (`automated`, then `edited`). Lookups walk them from the top down and
//! return the first hit; writes always land in the top layer.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, warn};

use super::file_store::FileStore;
use super::traits::{DocumentStore, StoreError};
use crate::core::paths::MetastorePaths;
use crate::core::types::Urn;

/// Ordered set of stores, lowest precedence first.
#[derive(Debug, Default)]
pub struct LayerAggregator {
    layers: Vec<Box<dyn DocumentStore>>,
}

impl LayerAggregator {
    /// Create an aggregator with no layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open one [`FileStore`] per layer name under the metastore base.
    pub fn open(paths: &MetastorePaths, layers: &[String]) -> Self {
        layers.iter().fold(Self::new(), |agg, layer| {
            agg.with_layer(FileStore::new(layer.clone(), paths.layer_dir(layer)))
        })
    }

    /// Add a layer above every existing one.
    pub fn with_layer(mut self, store: impl DocumentStore + 'static) -> Self {
        self.layers.push(Box::new(store));
        self
    }

    /// Layer names, lowest precedence first.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    /// The layer that receives writes.
    pub fn top(&self) -> Option<&dyn DocumentStore> {
        self.layers.last().map(|l| l.as_ref())
    }

    /// Resolve a document, highest precedence first.
    pub fn resolve(&self, urn: &Urn, kind: &str) -> Result<Option<Value>, StoreError> {
        for layer in self.layers.iter().rev() {
            if let Some(doc) = layer.read(urn, kind)? {
                debug!(urn = %urn, kind, layer = layer.name(), "resolved");
                return Ok(Some(doc));
            }
        }
        Ok(None)
    }

    /// Type-only resolution: one top-level member, read from the highest
    /// layer whose document has it.
    ///
    /// A higher document that lacks the member does not hide the member in
    /// a lower layer, so an edit that only touches a description keeps the
    /// automated `element_type`.
    pub fn resolve_member(
        &self,
        urn: &Urn,
        kind: &str,
        member: &str,
    ) -> Result<Option<Value>, StoreError> {
        for layer in self.layers.iter().rev() {
            if let Some(value) = layer.read_member(urn, kind, member)? {
                debug!(urn = %urn, kind, member, layer = layer.name(), "resolved member");
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Enumerate documents across all layers, merged by `id`.
    ///
    /// Lower-layer order is kept; a document from a higher layer replaces
    /// the one with the same id in place. Documents without a string `id`
    /// are appended as they are found.
    pub fn find_all_merged(&self, suffix: &str) -> Result<Vec<Value>, StoreError> {
        let mut merged: Vec<Value> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for layer in &self.layers {
            for doc in layer.find_all(suffix)? {
                let Some(id) = doc.get("id").and_then(Value::as_str).map(str::to_string) else {
                    warn!(layer = layer.name(), suffix, "document without a string id");
                    merged.push(doc);
                    continue;
                };
                match index.get(&id) {
                    Some(&pos) => merged[pos] = doc,
                    None => {
                        index.insert(id, merged.len());
                        merged.push(doc);
                    }
                }
            }
        }

        debug!(suffix, count = merged.len(), "enumerated across layers");
        Ok(merged)
    }

    /// Write a document to the top layer.
    pub fn write_top(&self, urn: &Urn, kind: &str, doc: &Value) -> Result<PathBuf, StoreError> {
        self.top().ok_or(StoreError::NoLayers)?.write(urn, kind, doc)
    }
}

impl DocumentStore for LayerAggregator {
    fn name(&self) -> &str {
        "layers"
    }

    fn read(&self, urn: &Urn, kind: &str) -> Result<Option<Value>, StoreError> {
        self.resolve(urn, kind)
    }

    fn write(&self, urn: &Urn, kind: &str, doc: &Value) -> Result<PathBuf, StoreError> {
        self.write_top(urn, kind, doc)
    }

    fn find_all(&self, suffix: &str) -> Result<Vec<Value>, StoreError> {
        self.find_all_merged(suffix)
    }

    fn read_member(
        &self,
        urn: &Urn,
        kind: &str,
        member: &str,
    ) -> Result<Option<Value>, StoreError> {
        self.resolve_member(urn, kind, member)
    }
}
