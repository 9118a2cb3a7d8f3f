//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--base-dir <path>`: Metastore directory holding the layers
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--compact`: Single-line JSON output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// datathread - query and update a layered metadata store
#[derive(Parser, Debug)]
#[command(name = "dt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Metastore directory holding the layer directories
    #[arg(long, global = true, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show an inflated element
    #[command(
        name = "element",
        long_about = "Show an inflated element.\n\n\
            The element is resolved across the layers, its element type is tagged \
            with a __typename, every reference is replaced by the referenced element, \
            and its info and reference lineage are attached.",
        after_help = "\
EXAMPLES:
    dt element element:sales:orders#amount
    dt element 'element:my%20domain:order%20total'"
    )]
    Element {
        /// Element URN
        id: String,
    },

    /// List every element across all layers
    Elements,

    /// Show an inflated dataset
    #[command(
        name = "dataset",
        long_about = "Show an inflated dataset.\n\n\
            Field overrides are applied and every field carries its resolved element. \
            Fields without an element fall back to the nil element."
    )]
    Dataset {
        /// Dataset URN
        id: String,
    },

    /// List every dataset across all layers
    Datasets,

    /// Show the terminal, non-reference type of an element
    #[command(name = "base-type")]
    BaseType {
        /// Element URN
        id: String,
    },

    /// Show the reference lineage of an element
    Lineage {
        /// Element URN
        id: String,
    },

    /// Show where a URN is stored in each layer
    #[command(
        name = "path",
        after_help = "\
EXAMPLES:
    dt path element:sales/emea:orders
    dt path element:core:nil --kind element_info"
    )]
    Path {
        /// Entity URN
        urn: String,

        /// Document kind (defaults to the URN kind)
        #[arg(long)]
        kind: Option<String>,
    },

    /// Store a JSON document in the top layer
    #[command(
        name = "write",
        long_about = "Store a JSON document in the top (edited) layer.\n\n\
            The document is addressed by its own id. Elements, datasets and fields \
            are validated before anything is written. Prints a Created event on \
            success and a RequestFailed event on failure.",
        after_help = "\
EXAMPLES:
    dt write element amount.json
    cat orders.json | dt write dataset -"
    )]
    Write {
        /// Document kind (element, dataset, field, element_info, ...)
        kind: String,

        /// JSON file to read, or '-' for stdin
        file: PathBuf,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        after_help = "\
EXAMPLES:
    dt config list
    dt config get layers
    dt config set max_reference_depth 16"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    dt completion bash >> ~/.bashrc
    dt completion zsh > ~/.zfunc/_dt"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["dt", "element", "element:core:nil", "--base-dir", "/m", "--compact"])
            .unwrap();
        assert_eq!(cli.base_dir, Some(PathBuf::from("/m")));
        assert!(cli.compact);
        match cli.command {
            Command::Element { id } => assert_eq!(id, "element:core:nil"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn path_with_kind() {
        let cli = Cli::try_parse_from(["dt", "path", "element:a:b", "--kind", "element_info"]).unwrap();
        match cli.command {
            Command::Path { urn, kind } => {
                assert_eq!(urn, "element:a:b");
                assert_eq!(kind.as_deref(), Some("element_info"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
