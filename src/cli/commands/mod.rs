//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the catalog to run the query or write
//! 3. Prints the result as JSON on stdout
//!
//! A missing entity is an error at this layer, so scripts can rely on the
//! exit status.

mod completion;
mod config_cmd;
mod dataset;
mod element;
mod path;
mod write;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use dataset::{dataset as show_dataset, datasets};
pub use element::{base_type, element as show_element, elements, lineage};
pub use path::path;
pub use write::write;

use anyhow::{Context as _, Result};

use super::args::{Command, ConfigAction};
use super::Context;
use crate::core::types::Urn;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Element { id } => element::element(ctx, &id),
        Command::Elements => element::elements(ctx),
        Command::Dataset { id } => dataset::dataset(ctx, &id),
        Command::Datasets => dataset::datasets(ctx),
        Command::BaseType { id } => element::base_type(ctx, &id),
        Command::Lineage { id } => element::lineage(ctx, &id),
        Command::Path { urn, kind } => path::path(ctx, &urn, kind.as_deref()),
        Command::Write { kind, file } => write::write(ctx, &kind, &file),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Parse a URN argument.
fn parse_urn(id: &str) -> Result<Urn> {
    Urn::new(id).with_context(|| format!("Invalid URN '{}'", id))
}
