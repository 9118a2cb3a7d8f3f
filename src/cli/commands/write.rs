//! write command - Store a document in the top layer

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use serde_json::Value;

use crate::cli::Context;
use crate::engine::WriteEvent;
use crate::ui::output;

/// Read a document from `file` (or stdin for `-`) and store it.
///
/// Prints the `Created` event, or the `RequestFailed` event and exits with
/// an error.
pub fn write(ctx: &Context, kind: &str, file: &Path) -> Result<()> {
    let contents = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read document from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read '{}'", file.display()))?
    };
    let document: Value = serde_json::from_str(&contents)
        .with_context(|| format!("'{}' is not valid JSON", file.display()))?;

    let (config, catalog) = ctx.catalog()?;
    let pretty = ctx.pretty(&config);

    match catalog.write(kind, document.clone()) {
        Ok(event) => {
            if let WriteEvent::Created { path, .. } = &event {
                output::print(format!("Wrote {}", path.display()), ctx.verbosity);
            }
            output::emit(&event.to_json(), pretty)?;
            Ok(())
        }
        Err(err) => {
            let event = WriteEvent::RequestFailed {
                document,
                reason: err.to_string(),
            };
            output::emit(&event.to_json(), pretty)?;
            bail!("Write failed: {}", err)
        }
    }
}
