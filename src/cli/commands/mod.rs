//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod db;
mod discover;
mod helpers;
mod init;
mod parse;
mod scrape;
mod state;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};

use scrape::StrategyArg;

#[derive(Parser)]
#[command(name = "fms")]
#[command(about = "Incremental archiver for FixMyStreet report pages")]
#[command(version)]
pub struct Cli {
    /// Target directory or database file (overrides config file).
    /// Can be a directory containing fmsacquire.db or a .db file directly.
    #[arg(long, short = 't', global = true)]
    target: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory, database schema and crawl state
    Init,

    /// Run one crawl session
    Scrape {
        /// Order in which identifiers are visited
        #[arg(short, long, value_enum, default_value = "sequential")]
        strategy: StrategyArg,
        /// Identifier to fetch (required with --strategy single)
        #[arg(long)]
        id: Option<i64>,
        /// Empty every report table before crawling
        #[arg(long)]
        truncate: bool,
        /// Skip upper-bound discovery for this session
        #[arg(long)]
        no_discover: bool,
        /// Stop after this many fetched reports
        #[arg(short, long)]
        limit: Option<u64>,
    },

    /// Scan past the stored upper bound and save the new ceiling
    Discover {
        /// Consecutive misses that confirm the ceiling
        #[arg(long)]
        threshold: Option<u32>,
    },

    /// Inspect or change the crawl state
    State {
        #[command(subcommand)]
        command: StateCommands,
    },

    /// Database inspection and maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Extract a report from a saved HTML page and print it as JSON
    Parse {
        /// Path to the saved page
        file: PathBuf,
        /// Identifier to assign to the record
        #[arg(long, default_value = "0")]
        id: i64,
    },
}

#[derive(Subcommand)]
enum StateCommands {
    /// Show the stored bound, autofind flag and row count
    Show,
    /// Overwrite the stored upper bound
    SetBound {
        /// New upper bound
        bound: i64,
    },
    /// Enable or disable automatic discovery before each session
    Autofind {
        #[arg(value_enum)]
        toggle: state::Toggle,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Verify every report table has the same number of rows
    Check,
    /// Show connection, crawl state and per-table row counts
    Status,
    /// Delete every stored report (crawl state is kept)
    Truncate {
        /// Skip the confirmation notice and truncate immediately
        #[arg(long)]
        yes: bool,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        target: cli.target,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Scrape {
            strategy,
            id,
            truncate,
            no_discover,
            limit,
        } => {
            let kind = strategy.into_kind(id)?;
            scrape::cmd_scrape(&settings, kind, truncate, !no_discover, limit).await
        }
        Commands::Discover { threshold } => discover::cmd_discover(&settings, threshold).await,
        Commands::State { command } => match command {
            StateCommands::Show => state::cmd_state_show(&settings).await,
            StateCommands::SetBound { bound } => state::cmd_state_set_bound(&settings, bound).await,
            StateCommands::Autofind { toggle } => {
                state::cmd_state_autofind(&settings, toggle).await
            }
        },
        Commands::Db { command } => match command {
            DbCommands::Check => db::cmd_db_check(&settings).await,
            DbCommands::Status => db::cmd_db_status(&settings).await,
            DbCommands::Truncate { yes } => db::cmd_db_truncate(&settings, yes).await,
        },
        Commands::Parse { file, id } => parse::cmd_parse(&file, id),
    }
}
