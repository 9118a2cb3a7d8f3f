//! config command - Get, set, or list configuration values

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::config::Config;
use crate::core::types::Urn;
use crate::ui::output;

/// Keys understood by `config get` and `config set`.
const KEYS: [&str; 5] = [
    "base_dir",
    "layers",
    "nil_element",
    "max_reference_depth",
    "output.pretty",
];

fn value_of(config: &Config, key: &str) -> Result<String> {
    let value = match key {
        "base_dir" => config.base_dir().display().to_string(),
        "layers" => config.layers().join(","),
        "nil_element" => config.nil_element().to_string(),
        "max_reference_depth" => config.max_reference_depth().to_string(),
        "output.pretty" => config.pretty().to_string(),
        _ => bail!("Unknown configuration key: {}", key),
    };
    Ok(value)
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let config = ctx.load_config()?;
    println!("{}", value_of(&config, key)?);
    Ok(())
}

/// Set a configuration value.
///
/// `base_dir` and `output.pretty` go to the global config; the other keys
/// go to the metastore config in the base directory.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let config = ctx.load_config()?;

    let path = match key {
        "base_dir" | "output.pretty" => {
            let mut global = config.global.clone();
            if key == "base_dir" {
                global.base_dir = Some(value.into());
            } else {
                let pretty = value
                    .parse::<bool>()
                    .with_context(|| format!("'{}' is not true or false", value))?;
                global.output.get_or_insert_with(Default::default).pretty = Some(pretty);
            }
            Config::write_global(&global).context("Failed to write global config")?
        }
        "layers" | "nil_element" | "max_reference_depth" => {
            let mut metastore = config.metastore.clone().unwrap_or_default();
            match key {
                "layers" => {
                    metastore.layers = Some(
                        value
                            .split(',')
                            .map(|s| s.trim().to_string())
                            .collect(),
                    );
                }
                "nil_element" => {
                    Urn::new(value).context("Invalid nil element")?;
                    metastore.nil_element = Some(value.to_string());
                }
                _ => {
                    let depth = value
                        .parse::<usize>()
                        .with_context(|| format!("'{}' is not a positive number", value))?;
                    metastore.max_reference_depth = Some(depth);
                }
            }
            Config::write_metastore(&config.base_dir(), &metastore)
                .context("Failed to write metastore config")?
        }
        _ => bail!("Unknown configuration key: {}", key),
    };

    output::print(
        format!("Set {} = {} in {}", key, value, path.display()),
        ctx.verbosity,
    );
    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    let config = ctx.load_config()?;

    println!("# datathread configuration");
    match config.global_config_loaded_from() {
        Some(path) => println!("# global: {}", path.display()),
        None => println!("# global: (defaults)"),
    }
    match config.metastore_config_loaded_from() {
        Some(path) => println!("# metastore: {}", path.display()),
        None => println!("# metastore: (defaults)"),
    }

    for key in KEYS {
        println!("{} = {}", key, value_of(&config, key)?);
    }

    Ok(())
}
