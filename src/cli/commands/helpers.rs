//! Shared helper functions for CLI commands.

use anyhow::Context;
use console::style;

use crate::config::Settings;
use crate::repository::{ReportRepository, TableCounts};
use crate::scrapers::{HttpClient, HttpPageFetcher};

/// Open the report store, creating the schema and crawl-state row if needed.
pub async fn open_store(settings: &Settings) -> anyhow::Result<ReportRepository> {
    if !settings.is_postgres() {
        settings.ensure_directories()?;
    }

    let ctx = settings.create_db_context()?;
    ctx.init_schema().await?;

    let repo = ctx.reports();
    if repo.ensure_state(settings.initial_bound).await? {
        tracing::info!("Created crawl state with bound {}", settings.initial_bound);
    }
    Ok(repo)
}

/// Build the HTTP fetcher from settings.
pub fn http_fetcher(settings: &Settings) -> anyhow::Result<HttpPageFetcher> {
    let base_url = settings
        .parsed_base_url()
        .with_context(|| format!("Invalid base URL '{}'", settings.base_url))?;
    let client = HttpClient::new(settings.request_timeout(), settings.user_agent.as_deref())
        .context("Failed to build HTTP client")?;

    tracing::debug!("Using user agent: {}", client.user_agent());
    Ok(HttpPageFetcher::new(client, base_url))
}

/// Print one `name: count` line per table, highlighting disagreement.
pub fn print_table_counts(counts: &TableCounts) {
    let expected = counts.status;
    for (table, count) in counts.entries() {
        let value = if count == expected {
            style(count.to_string()).to_string()
        } else {
            style(count.to_string()).red().bold().to_string()
        };
        println!("  {:<12} {}", format!("{}:", table), value);
    }
}
