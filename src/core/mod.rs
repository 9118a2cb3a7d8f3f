//! core
//!
//! Core domain types, schemas, and configuration for datathread.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Urn and entity kinds
//! - [`element`] - Element schema and the element type sum type
//! - [`dataset`] - Dataset and field schema
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for metastore storage
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Tagged unions are validated once, at the parsing boundary
//! - Unknown document members are preserved, never dropped

pub mod config;
pub mod dataset;
pub mod element;
pub mod paths;
pub mod types;
