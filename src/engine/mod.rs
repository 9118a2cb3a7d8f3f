//! engine
//!
//! Resolution of stored documents into inflated entities.
//!
//! # Architecture
//!
//! Every query re-reads storage through a [`DocumentStore`]; nothing is
//! cached between calls.
//!
//! - [`ElementEngine`] tags element types, inflates references, attaches info
//! - [`DatasetEngine`] applies field overrides and resolves field elements
//! - [`lineage`] walks the chain of reference types down to a base type
//! - [`Catalog`] is the query surface: type override, lineage, writes
//!
//! # Recursion
//!
//! Reference chains are followed with an explicit [`ResolutionPath`] of the
//! ids currently being resolved. Revisiting an id on the path is a
//! [`ResolveError::CyclicReference`]; a path longer than the configured
//! limit is a [`ResolveError::DepthExceeded`].
//!
//! # Example
//!
//! ```ignore
//! use datathread::engine::Catalog;
//!
//! let catalog = Catalog::open(&config);
//! if let Some(dataset) = catalog.dataset(&"dataset:sales:orders".parse()?)? {
//!     for field in &dataset.fields {
//!         println!("{} -> {}", field.name, field.element.id);
//!     }
//! }
//! ```
//!
//! [`DocumentStore`]: crate::store::DocumentStore

mod catalog;
mod dataset;
mod element;
mod guard;
pub mod lineage;

pub use catalog::{Catalog, WriteEvent};
pub use dataset::DatasetEngine;
pub use element::ElementEngine;
pub use guard::ResolutionPath;

use thiserror::Error;

use crate::core::element::SchemaError;
use crate::core::types::{TypeError, Urn};
use crate::store::StoreError;

/// Errors from entity resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The element type union is malformed.
    #[error("cannot resolve element type of '{id}': {source}")]
    TypeResolution { id: String, source: SchemaError },

    /// A reference names an element that does not exist.
    #[error("element '{id}' references missing element '{target}'")]
    DanglingReference { id: Urn, target: Urn },

    /// A reference chain revisits an element already being resolved.
    #[error("cyclic reference: {}", format_path(.path))]
    CyclicReference { path: Vec<Urn> },

    /// A reference chain is longer than the configured limit.
    #[error("reference chain from '{id}' exceeds {limit} levels")]
    DepthExceeded { id: Urn, limit: usize },

    /// A stored document does not match its schema.
    #[error("invalid document '{id}': {reason}")]
    InvalidDocument { id: String, reason: String },

    /// The fallback element for untyped fields does not exist.
    #[error("nil element '{id}' does not exist")]
    MissingNilElement { id: Urn },

    /// Storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A URN could not be built or parsed.
    #[error(transparent)]
    Urn(#[from] TypeError),
}

impl ResolveError {
    /// Classify a schema error raised while parsing the document `id`.
    pub(crate) fn from_schema(id: impl Into<String>, err: SchemaError) -> Self {
        if err.is_type_error() {
            ResolveError::TypeResolution {
                id: id.into(),
                source: err,
            }
        } else {
            ResolveError::InvalidDocument {
                id: id.into(),
                reason: err.to_string(),
            }
        }
    }
}

fn format_path(path: &[Urn]) -> String {
    path.iter()
        .map(Urn::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
