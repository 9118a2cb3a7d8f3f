//! engine::catalog
//!
//! Query surface over a layered metastore.
//!
//! Every query sees the same element type: a document without
//! `element_type` takes it from the highest layer that has one, so an edited
//! document that only changes a description keeps the automated type. Typed
//! elements, including the elements of dataset fields, carry their
//! reference lineage.

use std::path::PathBuf;

use serde_json::{json, Value};
use tracing::{debug, info};

use super::dataset::DatasetEngine;
use super::element::ElementEngine;
use super::ResolveError;
use crate::core::config::Config;
use crate::core::dataset::{parse_dataset, parse_field, Dataset};
use crate::core::element::{parse_element, Element, ElementType};
use crate::core::paths::MetastorePaths;
use crate::core::types::{kinds, Urn};
use crate::store::LayerAggregator;

/// Outcome of a write request.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteEvent {
    /// The document was stored at `path`.
    Created { document: Value, path: PathBuf },
    /// The document was rejected or could not be stored.
    RequestFailed { document: Value, reason: String },
}

impl WriteEvent {
    /// The event as sent to clients: `{ "Created": <document> }` or
    /// `{ "RequestFailed": <document> }`.
    pub fn to_json(&self) -> Value {
        match self {
            WriteEvent::Created { document, .. } => json!({ "Created": document }),
            WriteEvent::RequestFailed { document, .. } => json!({ "RequestFailed": document }),
        }
    }

    /// Whether the write succeeded.
    pub fn is_created(&self) -> bool {
        matches!(self, WriteEvent::Created { .. })
    }
}

/// Layered metastore with element and dataset queries.
#[derive(Debug)]
pub struct Catalog {
    layers: LayerAggregator,
    nil_element: Urn,
    max_depth: usize,
}

impl Catalog {
    /// Create a catalog over `layers` with default settings.
    pub fn new(layers: LayerAggregator) -> Self {
        Self {
            layers,
            nil_element: Urn::nil(),
            max_depth: crate::core::config::DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }

    /// Open the catalog described by a loaded configuration.
    pub fn open(config: &Config) -> Self {
        let paths = MetastorePaths::new(config.base_dir());
        let layers = LayerAggregator::open(&paths, &config.layers());
        debug!(base = %paths.base_dir().display(), layers = ?layers.layer_names(), "opened catalog");

        Self::new(layers)
            .with_nil_element(config.nil_element())
            .with_max_depth(config.max_reference_depth())
    }

    /// Use a different fallback element for untyped fields.
    pub fn with_nil_element(mut self, nil_element: Urn) -> Self {
        self.nil_element = nil_element;
        self
    }

    /// Limit the length of reference chains.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn element_engine(&self) -> ElementEngine<'_> {
        ElementEngine::new(&self.layers).with_max_depth(self.max_depth)
    }

    fn dataset_engine(&self) -> DatasetEngine<'_> {
        DatasetEngine::new(self.element_engine()).with_nil_element(self.nil_element.clone())
    }

    /// Resolve and inflate a dataset.
    pub fn dataset(&self, id: &Urn) -> Result<Option<Dataset>, ResolveError> {
        self.dataset_engine()
            .get(id)?
            .map(|dataset| self.with_field_lineage(dataset))
            .transpose()
    }

    /// Inflate every dataset across all layers.
    pub fn datasets(&self) -> Result<Vec<Dataset>, ResolveError> {
        self.dataset_engine()
            .get_all()?
            .into_iter()
            .map(|dataset| self.with_field_lineage(dataset))
            .collect()
    }

    /// Resolve an element with its lineage attached.
    pub fn element(&self, id: &Urn) -> Result<Option<Element>, ResolveError> {
        let engine = self.element_engine();
        engine
            .read(id)?
            .map(|element| self.attach_lineage(engine.inflate(element)?))
            .transpose()
    }

    /// Every element across all layers, as [`element`](Self::element) returns it.
    pub fn elements(&self) -> Result<Vec<Element>, ResolveError> {
        let engine = self.element_engine();
        self.layers
            .find_all_merged(&kinds::file_suffix(kinds::ELEMENT))?
            .into_iter()
            .map(|doc| {
                let element = engine.with_resolved_type(ElementEngine::parse(doc)?)?;
                self.attach_lineage(engine.inflate(element)?)
            })
            .collect()
    }

    /// The terminal, non-reference type of an element.
    pub fn base_type(&self, id: &Urn) -> Result<Option<ElementType>, ResolveError> {
        self.element_engine().find_base_type(id)
    }

    /// The reference lineage of an element.
    pub fn lineage(&self, element: &Element) -> Result<Vec<ElementType>, ResolveError> {
        let engine = self.element_engine();
        if element.element_type.is_some() {
            return engine.lineage(element);
        }
        engine.lineage(&engine.with_resolved_type(element.clone())?)
    }

    fn attach_lineage(&self, mut element: Element) -> Result<Element, ResolveError> {
        if element.element_type.is_some() {
            element.lineage = Some(self.element_engine().lineage(&element)?);
        }
        Ok(element)
    }

    fn with_field_lineage(&self, mut dataset: Dataset) -> Result<Dataset, ResolveError> {
        dataset.fields = dataset
            .fields
            .into_iter()
            .map(|mut field| {
                field.element = self.attach_lineage(field.element)?;
                Ok(field)
            })
            .collect::<Result<_, ResolveError>>()?;
        Ok(dataset)
    }

    /// Store a document of the given kind in the top layer.
    ///
    /// The document is addressed by its own `id`. Elements, datasets and
    /// fields are checked against their schema before anything is written.
    pub fn write(&self, kind: &str, document: Value) -> Result<WriteEvent, ResolveError> {
        let id = match document.get("id") {
            Some(Value::String(id)) => Urn::new(id.as_str())?,
            _ => {
                return Err(ResolveError::InvalidDocument {
                    id: "<unknown>".to_string(),
                    reason: "document must carry a string 'id'".to_string(),
                })
            }
        };

        let invalid = |reason: String| ResolveError::InvalidDocument {
            id: id.to_string(),
            reason,
        };
        match kind {
            kinds::ELEMENT => {
                parse_element(document.clone())
                    .map_err(|e| ResolveError::from_schema(id.as_str(), e))?;
            }
            kinds::DATASET => {
                parse_dataset(document.clone()).map_err(|e| invalid(e.to_string()))?;
            }
            kinds::FIELD => {
                parse_field(document.clone()).map_err(|e| invalid(e.to_string()))?;
            }
            _ => {}
        }

        let path = self.layers.write_top(&id, kind, &document)?;
        info!(id = %id, kind, path = %path.display(), "created");
        Ok(WriteEvent::Created { document, path })
    }
}
