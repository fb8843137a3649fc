use std::path::PathBuf;

use anyhow::{Context, Result};

use slate_builder::builder::build_slate;
use slate_builder::snapshot::load_snapshot;

/// Replay a frozen slate through the engine and print the result as JSON.
///
/// Usage: replay <slate.json>
fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: replay <slate.json>")?;
    let snapshot = load_snapshot(&path)?;
    let output = build_slate(&snapshot);
    let json = serde_json::to_string_pretty(&output).context("serialize builder output")?;
    println!("{json}");
    Ok(())
}
