//! Name search over the most recent snapshot

use crate::LibraryError;
use crate::catalog::SnapshotCatalog;
use crate::record::{ItemRecord, RecordReader};
use crate::text::fold_case;
use rusqlite::Connection;

pub struct SearchIndex<'c> {
    catalog: SnapshotCatalog<'c>,
    reader: RecordReader<'c>,
}

impl<'c> SearchIndex<'c> {
    pub fn new(conn: &'c Connection, prefix: &'c str) -> Self {
        Self {
            catalog: SnapshotCatalog::new(conn, prefix),
            reader: RecordReader::new(conn),
        }
    }

    /// Items of the latest snapshot whose name contains `term`, ignoring case.
    ///
    /// A blank term searches nothing. Items without any named edition are
    /// left out. Results are ordered by name.
    pub fn search(&self, term: &str) -> Result<Vec<ItemRecord>, LibraryError> {
        let needle = fold_case(term.trim());
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let Some(latest) = self.catalog.most_recent()? else {
            tracing::debug!("No snapshots to search");
            return Ok(Vec::new());
        };

        let mut matches: Vec<ItemRecord> = self
            .reader
            .read_all(&latest)?
            .into_iter()
            .filter(|record| record.has_editions())
            .filter(|record| fold_case(&record.name).contains(&needle))
            .collect();

        matches.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.concept_id.cmp(&b.concept_id))
        });

        tracing::debug!(term, table = %latest.name, results = matches.len(), "Search finished");
        Ok(matches)
    }
}
