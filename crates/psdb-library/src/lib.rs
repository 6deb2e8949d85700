//! Snapshot time-series engine for psdb
//!
//! The store is one SQLite file holding a full catalog snapshot per table,
//! each table named after its capture time. Everything here is read-only:
//! snapshot discovery, price parsing, price-drop detection, per-day price
//! history and name search over the latest snapshot.

mod catalog;
mod diff;
mod history;
mod price;
mod record;
mod search;
mod store;
mod text;
mod tracker;

#[cfg(test)]
mod fixtures;

pub use catalog::{Snapshot, SnapshotCatalog};
pub use diff::{DEFAULT_EDITION_NAME, DiffEngine, DiscountEvent, diff_records};
pub use history::{HistoryBuilder, PriceDataPoint, dedup_daily};
pub use price::{PriceParser, parse_price};
pub use record::{EditionSlot, ItemRecord, RecordReader};
pub use search::SearchIndex;
pub use store::{SnapshotStore, quote_identifier};
pub use tracker::PriceTracker;

use std::path::PathBuf;
use thiserror::Error;

/// Number of edition slots every snapshot row carries
pub const EDITION_SLOTS: usize = 5;

#[derive(Debug, Error)]
pub enum LibraryError {
    /// No database file has been installed at the store path yet
    #[error("No store installed at {0}")]
    StoreMissing(PathBuf),

    #[error("Store unavailable at {path}: {source}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
