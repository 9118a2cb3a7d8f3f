//! dataset commands - Show inflated datasets

use anyhow::{Context as _, Result};

use super::parse_urn;
use crate::cli::Context;
use crate::ui::output;

/// Show one inflated dataset.
pub fn dataset(ctx: &Context, id: &str) -> Result<()> {
    let urn = parse_urn(id)?;
    let (config, catalog) = ctx.catalog()?;

    let dataset = catalog
        .dataset(&urn)
        .with_context(|| format!("Failed to resolve dataset '{}'", urn))?
        .with_context(|| format!("Dataset not found: {}", urn))?;

    output::emit(&dataset, ctx.pretty(&config))?;
    Ok(())
}

/// List every dataset.
pub fn datasets(ctx: &Context) -> Result<()> {
    let (config, catalog) = ctx.catalog()?;
    let datasets = catalog.datasets().context("Failed to resolve datasets")?;
    output::emit(&datasets, ctx.pretty(&config))?;
    Ok(())
}
