//! psdb
//!
//! Command line front end for the snapshot price tracker: search the latest
//! catalog, show an edition's price history, list price drops, and refresh
//! the local database from the published copy.

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use psdb_config::PsdbConfig;
use psdb_library::{LibraryError, PriceTracker};
use psdb_update::StoreUpdater;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "psdb")]
#[command(author, version, about = "Track PlayStation Store prices across catalog snapshots", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user, then system config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot database, overriding the configured path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search games in the latest snapshot by name
    Search {
        /// Part of the game name, case-insensitive
        term: String,
    },
    /// Daily price history of one edition of a game
    History {
        /// Concept id of the game
        concept_id: String,
        /// Edition slot (1-5)
        #[arg(default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=5))]
        edition: u8,
    },
    /// Price drops between the two latest snapshots
    Drops,
    /// List snapshot tables in the database
    Snapshots,
    /// Download the published database, install it, and report price drops
    Refresh,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = load_config(&cli)?;
    debug!("Using store {}", config.store.path.display());

    let tracker = PriceTracker::from_config(&config.store);

    match cli.command {
        Commands::Search { term } => {
            let games = tracker
                .search_games(&term)
                .await
                .map_err(|e| explain(e, "Search failed"))?;
            output::games(&games, cli.json)?;
        }
        Commands::History {
            concept_id,
            edition,
        } => {
            let history = history(&tracker, &concept_id, usize::from(edition)).await?;
            output::history(&concept_id, usize::from(edition), &history, cli.json)?;
        }
        Commands::Drops => {
            let drops = tracker
                .price_drops()
                .await
                .map_err(|e| explain(e, "Price comparison failed"))?;
            output::drops(&drops, cli.json)?;
        }
        Commands::Snapshots => {
            let snapshots = tracker
                .snapshots()
                .await
                .map_err(|e| explain(e, "Listing snapshots failed"))?;
            output::snapshots(&snapshots, cli.json)?;
        }
        Commands::Refresh => {
            let updater = StoreUpdater::new(&config.update, &config.store.table_prefix)
                .context("Failed to set up the downloader")?;
            let installed = updater
                .refresh(&config.store.path)
                .await
                .context("Database refresh failed")?;

            let drops = tracker
                .price_drops()
                .await
                .context("Price comparison failed")?;
            if !drops.is_empty() {
                info!("{} price drops detected", drops.len());
            }
            output::refresh(&installed, &drops, cli.json)?;
        }
    }

    Ok(())
}

/// Setup logging to stderr
fn setup_logging(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<PsdbConfig> {
    let mut config = match &cli.config {
        Some(path) => PsdbConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PsdbConfig::load_default().context("Failed to load config")?,
    };

    if let Some(db) = &cli.db {
        config.store.path = db.clone();
    }

    Ok(config)
}

/// Price history that stops scanning on Ctrl-C
async fn history(
    tracker: &PriceTracker,
    concept_id: &str,
    edition: usize,
) -> Result<Vec<psdb_library::PriceDataPoint>> {
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = tracker
        .price_history_with_cancel(concept_id, edition, cancel)
        .await;
    interrupt.abort();

    match result {
        Err(LibraryError::Cancelled) => anyhow::bail!("Interrupted"),
        other => other.map_err(|e| explain(e, "Building price history failed")),
    }
}

/// Turn a query failure into a user-facing error, pointing at `psdb refresh`
/// when nothing has been downloaded yet
fn explain(err: LibraryError, action: &'static str) -> anyhow::Error {
    match err {
        LibraryError::StoreMissing(path) => anyhow::anyhow!(
            "No price database at {}, run `psdb refresh` to download it",
            path.display()
        ),
        other => anyhow::Error::new(other).context(action),
    }
}
