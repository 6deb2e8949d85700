//! Price-drop detection between two snapshots

use crate::catalog::{Snapshot, SnapshotCatalog};
use crate::price::PriceParser;
use crate::record::{ItemRecord, RecordReader};
use crate::{EDITION_SLOTS, LibraryError};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

/// Label for a priced slot that carries no edition name
pub const DEFAULT_EDITION_NAME: &str = "Standard Edition";

/// A price decrease for one item edition between two snapshots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountEvent {
    pub concept_id: String,
    /// Item name in the newer snapshot
    pub name: String,
    /// 1-based edition slot
    pub edition_index: usize,
    /// Edition name in the newer snapshot
    pub edition_name: String,
    /// Raw price token in the older snapshot
    pub old_price: String,
    /// Raw price token in the newer snapshot
    pub new_price: String,
    pub old_amount: f64,
    pub new_amount: f64,
}

impl DiscountEvent {
    /// Size of the drop relative to the old price, in percent
    pub fn discount_percent(&self) -> f64 {
        if self.old_amount <= 0.0 {
            return 0.0;
        }
        (self.old_amount - self.new_amount) / self.old_amount * 100.0
    }
}

/// Compare two decoded snapshots.
///
/// Walks the newer records in order and, for items also present in the older
/// snapshot, checks slots 1..=5. A slot produces an event only when both
/// sides have a price that parses and the new one is strictly lower.
pub fn diff_records(
    older: &[ItemRecord],
    newer: &[ItemRecord],
    parser: &PriceParser,
) -> Vec<DiscountEvent> {
    let older_by_id: HashMap<&str, &ItemRecord> = older
        .iter()
        .map(|record| (record.concept_id.as_str(), record))
        .collect();

    let mut events = Vec::new();

    for new_record in newer {
        let Some(old_record) = older_by_id.get(new_record.concept_id.as_str()) else {
            continue;
        };

        for index in 1..=EDITION_SLOTS {
            let (Some(old_price), Some(new_price)) =
                (old_record.price_token(index), new_record.price_token(index))
            else {
                continue;
            };

            let (Some(old_amount), Some(new_amount)) =
                (parser.parse(Some(old_price)), parser.parse(Some(new_price)))
            else {
                continue;
            };

            if new_amount < old_amount {
                let edition_name = new_record
                    .slot(index)
                    .and_then(|slot| slot.name.clone())
                    .unwrap_or_else(|| DEFAULT_EDITION_NAME.to_string());

                events.push(DiscountEvent {
                    concept_id: new_record.concept_id.clone(),
                    name: new_record.name.clone(),
                    edition_index: index,
                    edition_name,
                    old_price: old_price.to_string(),
                    new_price: new_price.to_string(),
                    old_amount,
                    new_amount,
                });
            }
        }
    }

    events
}

/// Detects price drops across the latest snapshots of a store
pub struct DiffEngine<'c> {
    catalog: SnapshotCatalog<'c>,
    reader: RecordReader<'c>,
    parser: PriceParser,
}

impl<'c> DiffEngine<'c> {
    pub fn new(conn: &'c Connection, prefix: &'c str, parser: PriceParser) -> Self {
        Self {
            catalog: SnapshotCatalog::new(conn, prefix),
            reader: RecordReader::new(conn),
            parser,
        }
    }

    /// Drops between the two most recent snapshots; empty if fewer than two exist
    pub fn compare_latest_two(&self) -> Result<Vec<DiscountEvent>, LibraryError> {
        let latest = self.catalog.latest(2)?;
        let [older, newer] = latest.as_slice() else {
            tracing::info!(
                "Not enough snapshots to compare ({} found, 2 needed)",
                latest.len()
            );
            return Ok(Vec::new());
        };

        self.compare(older, newer)
    }

    /// Drops from `older` to `newer`
    pub fn compare(
        &self,
        older: &Snapshot,
        newer: &Snapshot,
    ) -> Result<Vec<DiscountEvent>, LibraryError> {
        tracing::info!("Comparing prices: {} -> {}", older.name, newer.name);

        let old_records = self.reader.read_all(older)?;
        let new_records = self.reader.read_all(newer)?;
        let events = diff_records(&old_records, &new_records, &self.parser);

        tracing::debug!("{} price drops detected", events.len());
        Ok(events)
    }
}
