//! datathread - a layered, URN-addressed metadata store
//!
//! datathread resolves typed metadata entities (elements, datasets, fields)
//! stored as one JSON file per entity. Entities are merged across
//! precedence-ordered storage layers (`automated` below `edited`), element
//! types are tagged with an explicit discriminant, embedded references are
//! inflated recursively, and the reference lineage of a type can be
//! reconstructed.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to the catalog)
//! - [`engine`] - Element and dataset inflation, lineage, the query catalog
//! - [`store`] - File-per-entity JSON storage and layer aggregation
//! - [`core`] - Domain types, schemas, configuration, and paths
//! - [`ui`] - Output and logging
//!
//! # Correctness Invariants
//!
//! 1. Every query re-reads storage; there is no cross-request state
//! 2. Higher layers always win over lower ones
//! 3. Every inflated dataset field carries an element
//! 4. Reference resolution terminates: cycles and over-long chains are errors
//! 5. Writes are atomic; readers never see a partial document

pub mod cli;
pub mod core;
pub mod engine;
pub mod store;
pub mod ui;
