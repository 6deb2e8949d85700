//! Item rows of a snapshot table

use crate::catalog::Snapshot;
use crate::store::quote_identifier;
use crate::{EDITION_SLOTS, LibraryError};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{Connection, Params, params};
use serde::Serialize;
use thiserror::Error;

/// One of the fixed edition positions of an item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditionSlot {
    /// Edition display name; `None` means the item has no edition here
    pub name: Option<String>,
    /// Raw, locale-formatted price token
    pub price: Option<String>,
}

impl EditionSlot {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none()
    }
}

/// A catalog item as captured in one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRecord {
    /// Stable identifier across snapshots
    pub concept_id: String,
    pub name: String,
    /// Slots 1..=5, stored at index 0..=4
    pub slots: [EditionSlot; EDITION_SLOTS],
}

impl ItemRecord {
    /// Slot by 1-based edition index
    pub fn slot(&self, index: usize) -> Option<&EditionSlot> {
        index.checked_sub(1).and_then(|i| self.slots.get(i))
    }

    /// Raw price token of a slot, by 1-based edition index
    pub fn price_token(&self, index: usize) -> Option<&str> {
        self.slot(index).and_then(|slot| slot.price.as_deref())
    }

    /// Named editions with their 1-based index
    pub fn editions(&self) -> impl Iterator<Item = (usize, &EditionSlot)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.name.is_some())
            .map(|(i, slot)| (i + 1, slot))
    }

    /// Whether the item has at least one named edition in this snapshot
    pub fn has_editions(&self) -> bool {
        self.editions().next().is_some()
    }
}

/// Why a row could not become an [`ItemRecord`]
#[derive(Debug, Error)]
enum DecodeError {
    #[error("required column {0} is missing or empty")]
    Missing(&'static str),

    #[error("column {column} holds {found} instead of text")]
    NotText { column: String, found: Type },

    #[error("column {0} is not valid UTF-8")]
    InvalidUtf8(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

fn edition_name_column(index: usize) -> String {
    format!("surum_adi_{index}")
}

fn price_column(index: usize) -> String {
    format!("fiyat_{index}")
}

/// Text value of a column; absent columns, NULL and blank text are `None`
fn optional_text(row: &rusqlite::Row, column: &str) -> Result<Option<String>, DecodeError> {
    let value = match row.get_ref(column) {
        Ok(value) => value,
        Err(rusqlite::Error::InvalidColumnName(_)) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| DecodeError::InvalidUtf8(column.to_string()))?;
            if text.trim().is_empty() {
                Ok(None)
            } else {
                Ok(Some(text.to_string()))
            }
        }
        other => Err(DecodeError::NotText {
            column: column.to_string(),
            found: other.data_type(),
        }),
    }
}

fn required_text(row: &rusqlite::Row, column: &'static str) -> Result<String, DecodeError> {
    optional_text(row, column)?.ok_or(DecodeError::Missing(column))
}

fn decode_row(row: &rusqlite::Row) -> Result<ItemRecord, DecodeError> {
    let concept_id = required_text(row, "concept_id")?;
    let name = required_text(row, "name")?;

    let mut slots: [EditionSlot; EDITION_SLOTS] = Default::default();
    for (i, slot) in slots.iter_mut().enumerate() {
        let index = i + 1;
        slot.name = optional_text(row, &edition_name_column(index))?;
        slot.price = optional_text(row, &price_column(index))?;
    }

    Ok(ItemRecord {
        concept_id,
        name,
        slots,
    })
}

/// Reads item rows out of snapshot tables
#[derive(Debug, Clone, Copy)]
pub struct RecordReader<'c> {
    conn: &'c Connection,
}

impl<'c> RecordReader<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Every decodable item of a snapshot, in table order
    pub fn read_all(&self, snapshot: &Snapshot) -> Result<Vec<ItemRecord>, LibraryError> {
        let sql = format!("SELECT * FROM {}", quote_identifier(&snapshot.name));
        self.read_rows(snapshot, &sql, params![])
    }

    /// The item with `concept_id` in a snapshot, if present and decodable.
    ///
    /// A table without a `concept_id` column holds no items and yields
    /// `None`, the same way [`read_all`](Self::read_all) skips its rows.
    pub fn read_one(
        &self,
        snapshot: &Snapshot,
        concept_id: &str,
    ) -> Result<Option<ItemRecord>, LibraryError> {
        if !self.has_column(snapshot, "concept_id")? {
            tracing::warn!(table = %snapshot.name, "Skipping table without concept_id column");
            return Ok(None);
        }

        let sql = format!(
            "SELECT * FROM {} WHERE concept_id = ?1",
            quote_identifier(&snapshot.name)
        );
        Ok(self
            .read_rows(snapshot, &sql, params![concept_id])?
            .into_iter()
            .next())
    }

    fn has_column(&self, snapshot: &Snapshot, column: &str) -> Result<bool, LibraryError> {
        let stmt = self.conn.prepare(&format!(
            "SELECT * FROM {} LIMIT 0",
            quote_identifier(&snapshot.name)
        ))?;
        Ok(stmt.column_names().contains(&column))
    }

    /// Run a query and decode its rows, skipping rows that don't fit
    fn read_rows<P: Params>(
        &self,
        snapshot: &Snapshot,
        sql: &str,
        params: P,
    ) -> Result<Vec<ItemRecord>, LibraryError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;

        let mut records = Vec::new();
        let mut skipped = 0usize;
        while let Some(row) = rows.next()? {
            match decode_row(row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!(table = %snapshot.name, error = %e, "Skipping undecodable row");
                }
            }
        }

        tracing::debug!(
            table = %snapshot.name,
            rows = records.len(),
            skipped,
            "Read snapshot rows"
        );
        Ok(records)
    }
}
