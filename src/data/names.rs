// ============================================================
// Layer 4 — Names Corpus Loader
// ============================================================
// A flat text file of ~8000 names, one per line, all in latin
// transcript. Each name is returned with a leading space, which
// downstream character models use as the start-of-name marker.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn load_names(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Cannot read names corpus '{}'", path.display()))?;

    let names: Vec<String> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!(" {}", line.trim_end()))
        .collect();

    tracing::info!("Loaded {} names from '{}'", names.len(), path.display());
    Ok(names)
}
