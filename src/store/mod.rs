//! store
//!
//! Layered JSON document storage.
//!
//! # Architecture
//!
//! Documents are stored through the `DocumentStore` trait:
//!
//! - [`FileStore`]: one file per entity under a single layer directory
//! - [`LayerAggregator`]: precedence-ordered stack of layers, itself a store
//!
//! # Guarantees
//!
//! - A missing document is `Ok(None)`, never an error
//! - A malformed document is always an error carrying its path
//! - All writes are atomic (temp file + rename)
//!
//! # Example
//!
//! ```ignore
//! use datathread::core::paths::MetastorePaths;
//! use datathread::store::{DocumentStore, LayerAggregator};
//!
//! let paths = MetastorePaths::new("metastore".into());
//! let layers = LayerAggregator::open(&paths, &["automated".into(), "edited".into()]);
//!
//! let doc = layers.read(&urn, "element")?;
//! ```

mod file_store;
mod layers;
mod traits;

pub use file_store::FileStore;
pub use layers::LayerAggregator;
pub use traits::{DocumentStore, StoreError};
