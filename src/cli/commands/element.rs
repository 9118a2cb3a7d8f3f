//! element commands - Show elements, base types, and lineage

use anyhow::{Context as _, Result};

use super::parse_urn;
use crate::cli::Context;
use crate::ui::output;

/// Show one inflated element.
pub fn element(ctx: &Context, id: &str) -> Result<()> {
    let urn = parse_urn(id)?;
    let (config, catalog) = ctx.catalog()?;

    let element = catalog
        .element(&urn)
        .with_context(|| format!("Failed to resolve element '{}'", urn))?
        .with_context(|| format!("Element not found: {}", urn))?;

    output::emit(&element, ctx.pretty(&config))?;
    Ok(())
}

/// List every element.
pub fn elements(ctx: &Context) -> Result<()> {
    let (config, catalog) = ctx.catalog()?;
    let elements = catalog.elements().context("Failed to resolve elements")?;
    output::emit(&elements, ctx.pretty(&config))?;
    Ok(())
}

/// Show the terminal type of an element.
pub fn base_type(ctx: &Context, id: &str) -> Result<()> {
    let urn = parse_urn(id)?;
    let (config, catalog) = ctx.catalog()?;

    let ty = catalog
        .base_type(&urn)
        .with_context(|| format!("Failed to resolve base type of '{}'", urn))?
        .with_context(|| format!("No base type for {}", urn))?;

    output::emit(&ty, ctx.pretty(&config))?;
    Ok(())
}

/// Show the reference lineage of an element.
pub fn lineage(ctx: &Context, id: &str) -> Result<()> {
    let urn = parse_urn(id)?;
    let (config, catalog) = ctx.catalog()?;

    let element = catalog
        .element(&urn)
        .with_context(|| format!("Failed to resolve element '{}'", urn))?
        .with_context(|| format!("Element not found: {}", urn))?;

    output::emit(&element.lineage.unwrap_or_default(), ctx.pretty(&config))?;
    Ok(())
}
