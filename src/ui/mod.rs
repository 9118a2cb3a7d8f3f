//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - JSON output, messages, and log initialization
//!
//! # Design
//!
//! All output goes through this module so that stdout carries only query
//! results and everything else lands on stderr.

pub mod output;
