//! Async query surface for front ends
//!
//! Every call opens its own connection on the blocking pool and returns
//! complete results. A store with no database file yet fails with
//! [`LibraryError::StoreMissing`].

use crate::LibraryError;
use crate::catalog::{Snapshot, SnapshotCatalog};
use crate::diff::{DiffEngine, DiscountEvent};
use crate::history::{HistoryBuilder, PriceDataPoint};
use crate::price::PriceParser;
use crate::record::ItemRecord;
use crate::search::SearchIndex;
use crate::store::SnapshotStore;
use psdb_config::StoreConfig;
use rusqlite::Connection;
use tokio_util::sync::CancellationToken;

/// Read-only price queries over a snapshot store
#[derive(Debug, Clone)]
pub struct PriceTracker {
    store: SnapshotStore,
    parser: PriceParser,
}

impl PriceTracker {
    pub fn new(store: SnapshotStore) -> Self {
        Self {
            store,
            parser: PriceParser::default(),
        }
    }

    /// Use a non-default price parser
    pub fn with_parser(mut self, parser: PriceParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(SnapshotStore::from_config(config))
            .with_parser(PriceParser::new(&config.free_token))
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// All snapshots, oldest first
    pub async fn snapshots(&self) -> Result<Vec<Snapshot>, LibraryError> {
        self.query(|conn, prefix, _| SnapshotCatalog::new(conn, prefix).list_all())
            .await
    }

    /// Games in the latest snapshot whose name contains `term`
    pub async fn search_games(&self, term: &str) -> Result<Vec<ItemRecord>, LibraryError> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }

        let term = term.to_string();
        self.query(move |conn, prefix, _| SearchIndex::new(conn, prefix).search(&term))
            .await
    }

    /// Daily price history of one edition of a game
    pub async fn price_history(
        &self,
        concept_id: &str,
        edition_index: usize,
    ) -> Result<Vec<PriceDataPoint>, LibraryError> {
        self.price_history_with_cancel(concept_id, edition_index, CancellationToken::new())
            .await
    }

    /// Like [`price_history`](Self::price_history), stopping early once
    /// `cancel` fires.
    ///
    /// Dropping the returned future before it completes cancels `cancel`, so
    /// the scan stops at the next snapshot instead of running on unobserved.
    pub async fn price_history_with_cancel(
        &self,
        concept_id: &str,
        edition_index: usize,
        cancel: CancellationToken,
    ) -> Result<Vec<PriceDataPoint>, LibraryError> {
        let abandoned = cancel.clone().drop_guard();
        let concept_id = concept_id.to_string();
        let result = self
            .query(move |conn, prefix, parser| {
                HistoryBuilder::new(conn, prefix, parser).history(&concept_id, edition_index, &cancel)
            })
            .await;
        abandoned.disarm();
        result
    }

    /// Price drops between the two most recent snapshots
    pub async fn price_drops(&self) -> Result<Vec<DiscountEvent>, LibraryError> {
        self.query(|conn, prefix, parser| DiffEngine::new(conn, prefix, parser).compare_latest_two())
            .await
    }

    /// Run `f` against a fresh connection on the blocking pool
    async fn query<T, F>(&self, f: F) -> Result<T, LibraryError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str, PriceParser) -> Result<T, LibraryError> + Send + 'static,
    {
        let store = self.store.clone();
        let parser = self.parser.clone();

        tokio::task::spawn_blocking(move || {
            let conn = store.connect()?;
            f(&conn, store.table_prefix(), parser)
        })
        .await
        .map_err(|e| LibraryError::Task(e.to_string()))?
    }
}
