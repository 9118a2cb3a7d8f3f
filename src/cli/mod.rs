//! cli
//!
//! Command-line interface layer for datathread.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and open the catalog
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine::Catalog`] for every query and write.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::engine::Catalog;
use crate::ui::output::{self, Verbosity};

/// Per-invocation settings derived from global flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Metastore directory from `--base-dir`
    pub base_dir: Option<PathBuf>,
    /// Output verbosity
    pub verbosity: Verbosity,
    /// `--compact` was given
    pub compact: bool,
}

impl Context {
    /// Load configuration, reporting load warnings.
    pub fn load_config(&self) -> Result<Config> {
        let result = Config::load(self.base_dir.as_deref()).context("Failed to load config")?;
        for warning in &result.warnings {
            output::warn(
                format!("{}: {}", warning.path.display(), warning.message),
                self.verbosity,
            );
        }
        Ok(result.config)
    }

    /// Load configuration and open the catalog it describes.
    pub fn catalog(&self) -> Result<(Config, Catalog)> {
        let config = self.load_config()?;
        let catalog = Catalog::open(&config);
        Ok((config, catalog))
    }

    /// Whether JSON output should be pretty-printed.
    pub fn pretty(&self, config: &Config) -> bool {
        !self.compact && config.pretty()
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    output::init_logging(verbosity);

    let ctx = Context {
        base_dir: cli.base_dir.clone(),
        verbosity,
        compact: cli.compact,
    };

    commands::dispatch(cli.command, &ctx)
}
