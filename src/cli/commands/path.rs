//! path command - Show where a URN is stored in each layer

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::parse_urn;
use crate::cli::Context;
use crate::core::paths::MetastorePaths;
use crate::store::FileStore;
use crate::ui::output;

#[derive(Debug, Serialize)]
struct LayerPath {
    layer: String,
    path: String,
    exists: bool,
}

/// Print the document path of `urn` in every layer, lowest precedence first.
pub fn path(ctx: &Context, urn: &str, kind: Option<&str>) -> Result<()> {
    let urn = parse_urn(urn)?;
    let config = ctx.load_config()?;
    let paths = MetastorePaths::new(config.base_dir());

    let mut entries = Vec::new();
    for layer in config.layers() {
        let store = FileStore::new(layer.clone(), paths.layer_dir(&layer));
        let path = store
            .path_for(&urn, kind)
            .with_context(|| format!("Cannot map '{}' to a path", urn))?;
        entries.push(LayerPath {
            layer,
            exists: path.is_file(),
            path: path.display().to_string(),
        });
    }

    output::emit(&entries, ctx.pretty(&config))?;
    Ok(())
}
