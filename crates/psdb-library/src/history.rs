//! Per-day price history of one item edition

use crate::catalog::SnapshotCatalog;
use crate::price::PriceParser;
use crate::record::RecordReader;
use crate::{EDITION_SLOTS, LibraryError};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// Price of an edition on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceDataPoint {
    pub day: NaiveDate,
    pub price: f64,
}

/// Reduce observations to one point per day, keeping the day's last capture.
///
/// Observations with identical timestamps resolve to the later one in input
/// order. Output is ascending by day.
pub fn dedup_daily(
    observations: impl IntoIterator<Item = (NaiveDateTime, f64)>,
) -> Vec<PriceDataPoint> {
    let mut by_day: BTreeMap<NaiveDate, (NaiveDateTime, f64)> = BTreeMap::new();

    for (captured_at, price) in observations {
        by_day
            .entry(captured_at.date())
            .and_modify(|latest| {
                if captured_at >= latest.0 {
                    *latest = (captured_at, price);
                }
            })
            .or_insert((captured_at, price));
    }

    by_day
        .into_iter()
        .map(|(day, (_, price))| PriceDataPoint { day, price })
        .collect()
}

/// Rebuilds price series from every snapshot in a store
pub struct HistoryBuilder<'c> {
    catalog: SnapshotCatalog<'c>,
    reader: RecordReader<'c>,
    parser: PriceParser,
}

impl<'c> HistoryBuilder<'c> {
    pub fn new(conn: &'c Connection, prefix: &'c str, parser: PriceParser) -> Self {
        Self {
            catalog: SnapshotCatalog::new(conn, prefix),
            reader: RecordReader::new(conn),
            parser,
        }
    }

    /// Daily prices of `concept_id` at 1-based `edition_index`.
    ///
    /// Snapshots without the item, without a price in that slot, or with an
    /// unparseable price contribute nothing. `cancel` is checked before each
    /// snapshot is read.
    pub fn history(
        &self,
        concept_id: &str,
        edition_index: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<PriceDataPoint>, LibraryError> {
        if !(1..=EDITION_SLOTS).contains(&edition_index) {
            tracing::debug!("Edition index {} out of range", edition_index);
            return Ok(Vec::new());
        }

        let snapshots = self.catalog.list_all()?;
        let mut observations = Vec::new();

        for snapshot in &snapshots {
            if cancel.is_cancelled() {
                tracing::debug!(concept_id, "History scan cancelled");
                return Err(LibraryError::Cancelled);
            }

            let Some(record) = self.reader.read_one(snapshot, concept_id)? else {
                continue;
            };

            if let Some(price) = self.parser.parse(record.price_token(edition_index)) {
                observations.push((snapshot.captured_at, price));
            }
        }

        let points = dedup_daily(observations);
        tracing::debug!(
            concept_id,
            edition_index,
            snapshots = snapshots.len(),
            points = points.len(),
            "Built price history"
        );
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Snapshot;
    use crate::fixtures::{self, at};

    fn day(d: u32, m: u32, y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add_snapshot(conn: &Connection, captured_at: NaiveDateTime, editions: &[(&str, &str)]) {
        let table = Snapshot::table_name("games", &captured_at);
        fixtures::create_snapshot(conn, &table);
        fixtures::insert_item(conn, &table, "X", "Game X", editions);
    }

    fn history(conn: &Connection, edition_index: usize) -> Vec<PriceDataPoint> {
        HistoryBuilder::new(conn, "games", PriceParser::default())
            .history("X", edition_index, &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_same_day_last_capture_wins() {
        let conn = Connection::open_in_memory().unwrap();
        add_snapshot(&conn, at(1, 3, 2025, 8, 0), &[("Standard", "10,00")]);
        add_snapshot(&conn, at(1, 3, 2025, 12, 0), &[("Standard", "12,00")]);
        add_snapshot(&conn, at(1, 3, 2025, 18, 0), &[("Standard", "11,00")]);

        assert_eq!(
            history(&conn, 1),
            vec![PriceDataPoint {
                day: day(1, 3, 2025),
                price: 11.0
            }]
        );
    }

    #[test]
    fn test_one_point_per_day_ascending() {
        let conn = Connection::open_in_memory().unwrap();
        // Name order would put the 10th before the 2nd
        add_snapshot(&conn, at(10, 3, 2025, 9, 0), &[("Standard", "30,00")]);
        add_snapshot(&conn, at(2, 3, 2025, 9, 0), &[("Standard", "50,00")]);
        add_snapshot(&conn, at(2, 3, 2025, 21, 0), &[("Standard", "45,00")]);
        add_snapshot(&conn, at(5, 3, 2025, 9, 0), &[("Standard", "40,00")]);

        let points = history(&conn, 1);
        let series: Vec<(NaiveDate, f64)> = points.iter().map(|p| (p.day, p.price)).collect();
        assert_eq!(
            series,
            vec![
                (day(2, 3, 2025), 45.0),
                (day(5, 3, 2025), 40.0),
                (day(10, 3, 2025), 30.0),
            ]
        );
    }

    #[test]
    fn test_skips_missing_and_unparseable() {
        let conn = Connection::open_in_memory().unwrap();
        add_snapshot(&conn, at(1, 3, 2025, 9, 0), &[("Standard", "10,00"), ("Deluxe", "20,00")]);
        add_snapshot(&conn, at(2, 3, 2025, 9, 0), &[("Standard", "10,00")]);
        add_snapshot(&conn, at(3, 3, 2025, 9, 0), &[("Standard", "10,00"), ("Deluxe", "bilinmiyor")]);
        add_snapshot(&conn, at(4, 3, 2025, 9, 0), &[("Standard", "10,00"), ("Deluxe", "18,00")]);
        // Item absent from this snapshot entirely
        fixtures::create_snapshot(&conn, "games_05_03_2025_09_00");

        let days: Vec<NaiveDate> = history(&conn, 2).iter().map(|p| p.day).collect();
        assert_eq!(days, vec![day(1, 3, 2025), day(4, 3, 2025)]);
    }

    #[test]
    fn test_unparseable_last_capture_does_not_hide_earlier_one() {
        let conn = Connection::open_in_memory().unwrap();
        add_snapshot(&conn, at(1, 3, 2025, 9, 0), &[("Standard", "10,00")]);
        add_snapshot(&conn, at(1, 3, 2025, 18, 0), &[("Standard", "???")]);

        assert_eq!(history(&conn, 1).len(), 1);
        assert_eq!(history(&conn, 1)[0].price, 10.0);
    }

    #[test]
    fn test_free_price_is_a_point() {
        let conn = Connection::open_in_memory().unwrap();
        add_snapshot(&conn, at(1, 3, 2025, 9, 0), &[("Standard", "ücretsiz")]);

        let points = history(&conn, 1);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].price, 0.0);
    }

    #[test]
    fn test_no_data() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(history(&conn, 1).is_empty());

        add_snapshot(&conn, at(1, 3, 2025, 9, 0), &[("Standard", "10,00")]);
        assert!(history(&conn, 3).is_empty());
        assert!(history(&conn, 0).is_empty());
        assert!(history(&conn, 6).is_empty());
    }

    #[test]
    fn test_foreign_table_layout_is_skipped() {
        let conn = Connection::open_in_memory().unwrap();
        add_snapshot(&conn, at(1, 3, 2025, 9, 0), &[("Standard", "10,00")]);
        conn.execute_batch("CREATE TABLE games_02_03_2025_09_00 (id TEXT, title TEXT);")
            .unwrap();

        assert_eq!(
            history(&conn, 1),
            vec![PriceDataPoint {
                day: day(1, 3, 2025),
                price: 10.0
            }]
        );
    }

    #[test]
    fn test_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        add_snapshot(&conn, at(1, 3, 2025, 9, 0), &[("Standard", "10,00")]);
        add_snapshot(&conn, at(2, 3, 2025, 9, 0), &[("Standard", "8,00")]);

        assert_eq!(history(&conn, 1), history(&conn, 1));
    }

    #[test]
    fn test_cancelled_scan() {
        let conn = Connection::open_in_memory().unwrap();
        add_snapshot(&conn, at(1, 3, 2025, 9, 0), &[("Standard", "10,00")]);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = HistoryBuilder::new(&conn, "games", PriceParser::default())
            .history("X", 1, &cancel);
        assert!(matches!(result, Err(LibraryError::Cancelled)));
    }

    #[test]
    fn test_dedup_daily_equal_timestamps() {
        let t = at(1, 3, 2025, 9, 0);
        let points = dedup_daily(vec![(t, 5.0), (t, 7.0)]);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].price, 7.0);
    }

    #[test]
    fn test_dedup_daily_out_of_order_input() {
        let points = dedup_daily(vec![
            (at(1, 3, 2025, 18, 0), 11.0),
            (at(1, 3, 2025, 8, 0), 10.0),
        ]);
        assert_eq!(points[0].price, 11.0);
    }
}
