//! Snapshot discovery and chronological ordering
//!
//! A snapshot table is named `<prefix>_dd_MM_yyyy_HH_mm`. Any other table in
//! the store is not a snapshot and is ignored.

use crate::LibraryError;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, params};
use serde::Serialize;

/// Timestamp part of a snapshot table name
pub const TIMESTAMP_FORMAT: &str = "%d_%m_%Y_%H_%M";

/// Length of a `dd_MM_yyyy_HH_mm` stamp
const STAMP_LEN: usize = 16;

/// Separator positions inside a stamp
const STAMP_SEPARATORS: [usize; 4] = [2, 5, 10, 13];

/// One captured catalog state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Table name in the store
    pub name: String,
    /// Wall-clock capture time, minute precision
    pub captured_at: NaiveDateTime,
}

impl Snapshot {
    /// Parse a table name, `None` if it is not a snapshot of `prefix`
    pub fn parse(prefix: &str, name: &str) -> Option<Self> {
        let stamp = name.strip_prefix(prefix)?.strip_prefix('_')?;
        if !is_stamp_shaped(stamp) {
            return None;
        }

        let captured_at = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        Some(Self {
            name: name.to_string(),
            captured_at,
        })
    }

    /// Table name a snapshot captured at `captured_at` is stored under
    pub fn table_name(prefix: &str, captured_at: &NaiveDateTime) -> String {
        format!("{}_{}", prefix, captured_at.format(TIMESTAMP_FORMAT))
    }

    /// Calendar day of the capture
    pub fn day(&self) -> NaiveDate {
        self.captured_at.date()
    }
}

/// Zero-padded `dd_MM_yyyy_HH_mm` check; chrono alone accepts unpadded fields
fn is_stamp_shaped(stamp: &str) -> bool {
    stamp.len() == STAMP_LEN
        && stamp.bytes().enumerate().all(|(i, b)| {
            if STAMP_SEPARATORS.contains(&i) {
                b == b'_'
            } else {
                b.is_ascii_digit()
            }
        })
}

/// Escape `LIKE` wildcards so the prefix matches literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Lists the snapshots held in one store connection
#[derive(Debug, Clone, Copy)]
pub struct SnapshotCatalog<'c> {
    conn: &'c Connection,
    prefix: &'c str,
}

impl<'c> SnapshotCatalog<'c> {
    pub fn new(conn: &'c Connection, prefix: &'c str) -> Self {
        Self { conn, prefix }
    }

    pub fn prefix(&self) -> &'c str {
        self.prefix
    }

    /// Every snapshot, oldest first
    pub fn list_all(&self) -> Result<Vec<Snapshot>, LibraryError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name LIKE ?1 ESCAPE '\\'
             ORDER BY name",
        )?;

        let pattern = format!("{}\\_%", escape_like(self.prefix));
        let names = stmt
            .query_map(params![pattern], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut snapshots: Vec<Snapshot> = names
            .iter()
            .filter_map(|name| {
                let snapshot = Snapshot::parse(self.prefix, name);
                if snapshot.is_none() {
                    tracing::trace!(table = %name, "Not a snapshot table");
                }
                snapshot
            })
            .collect();

        // Stable: equal timestamps keep listing order
        snapshots.sort_by_key(|s| s.captured_at);

        tracing::debug!("Found {} snapshots", snapshots.len());
        Ok(snapshots)
    }

    /// The latest `count` snapshots, oldest first; shorter if fewer exist
    pub fn latest(&self, count: usize) -> Result<Vec<Snapshot>, LibraryError> {
        let mut snapshots = self.list_all()?;
        let skip = snapshots.len().saturating_sub(count);
        Ok(snapshots.split_off(skip))
    }

    /// The newest snapshot, `None` when the store holds no data yet
    pub fn most_recent(&self) -> Result<Option<Snapshot>, LibraryError> {
        Ok(self.list_all()?.pop())
    }
}
