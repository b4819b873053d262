//! Scrape command: one crawl session against the live site.

use console::style;

use super::helpers::{http_fetcher, open_store};
use crate::config::Settings;
use crate::crawl::{IngestOptions, Ingestor, SessionSummary, StrategyKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyArg {
    /// Ascending from 1 to the stored bound
    Sequential,
    /// Uniformly random identifiers until the bound is covered
    Random,
    /// A single identifier given with --id
    Single,
}

impl StrategyArg {
    pub fn into_kind(self, id: Option<i64>) -> anyhow::Result<StrategyKind> {
        match (self, id) {
            (Self::Sequential, _) => Ok(StrategyKind::Sequential),
            (Self::Random, _) => Ok(StrategyKind::Random),
            (Self::Single, Some(id)) if id > 0 => Ok(StrategyKind::Single(id)),
            (Self::Single, Some(id)) => anyhow::bail!("Invalid report id: {}", id),
            (Self::Single, None) => anyhow::bail!("--strategy single requires --id"),
        }
    }
}

/// Run a crawl session and print its summary.
pub async fn cmd_scrape(
    settings: &Settings,
    kind: StrategyKind,
    truncate: bool,
    discover: bool,
    limit: Option<u64>,
) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let fetcher = http_fetcher(settings)?;

    let options = IngestOptions {
        truncate,
        discover,
        limit,
        ..settings.ingest_options()
    };

    if truncate {
        println!(
            "{} All stored reports will be deleted in {} seconds (Ctrl-C to abort)",
            style("!").yellow().bold(),
            options.truncate_delay.as_secs()
        );
    }

    println!(
        "{} Scraping {} ({} strategy)",
        style("→").cyan(),
        settings.base_url,
        kind.as_str()
    );

    let ingestor = Ingestor::new(fetcher, store, options);
    let summary = ingestor.run(kind).await?;
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    if let Some(discovery) = summary.discovery {
        if discovery.advanced() {
            println!(
                "{} Upper bound raised from {} to {}",
                style("✓").green(),
                discovery.previous,
                discovery.confirmed
            );
        } else {
            println!(
                "{} Upper bound unchanged at {}",
                style("·").dim(),
                discovery.confirmed
            );
        }
    }

    println!(
        "{} Session complete: {} ingested, {} unavailable, {} already stored",
        style("✓").green(),
        style(summary.ingested).bold(),
        summary.placeholders,
        summary.skipped
    );
    println!("  Upper bound: {}", summary.bound);
}
