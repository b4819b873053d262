//! Discover command.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::helpers::{http_fetcher, open_store};
use crate::config::Settings;
use crate::crawl::discover_bound;

/// Run boundary discovery regardless of the stored autofind flag.
pub async fn cmd_discover(settings: &Settings, threshold: Option<u32>) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let fetcher = http_fetcher(settings)?;
    let options = settings.ingest_options();
    let threshold = threshold.unwrap_or(options.miss_threshold);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!(
        "Scanning past the stored bound ({} misses to confirm)...",
        threshold
    ));
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = discover_bound(&fetcher, &store, threshold, options.pacing).await;
    pb.finish_and_clear();
    let discovery = result?;

    if discovery.advanced() {
        println!(
            "{} Upper bound raised from {} to {} ({} requests)",
            style("✓").green(),
            discovery.previous,
            discovery.confirmed,
            discovery.requests
        );
    } else {
        println!(
            "{} No reports past {} ({} requests)",
            style("·").dim(),
            discovery.confirmed,
            discovery.requests
        );
    }

    Ok(())
}
