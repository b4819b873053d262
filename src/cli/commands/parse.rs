//! Offline extraction of a saved report page.

use std::path::Path;

use anyhow::Context;
use chrono::Local;

use crate::scrapers::extract_report;

/// Run the extractor over `file` and print the record as JSON.
pub fn cmd_parse(file: &Path, id: i64) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("File not found: {}", file.display());
    }

    let body = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let report = extract_report(id, &body, Local::now().date_naive())
        .with_context(|| format!("Failed to extract report from {}", file.display()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
