//! Snapshot tables for unit tests

use crate::EDITION_SLOTS;
use crate::store::quote_identifier;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, params};

/// Wall-clock capture time
pub(crate) fn at(day: u32, month: u32, year: i32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// Create an empty snapshot table with the full column set
pub(crate) fn create_snapshot(conn: &Connection, table: &str) {
    let mut columns = vec!["concept_id TEXT".to_string(), "name TEXT".to_string()];
    for i in 1..=EDITION_SLOTS {
        columns.push(format!("surum_adi_{i} TEXT"));
        columns.push(format!("fiyat_{i} TEXT"));
    }

    conn.execute_batch(&format!(
        "CREATE TABLE {} ({});",
        quote_identifier(table),
        columns.join(", ")
    ))
    .unwrap();
}

/// Insert one item; `editions[i]` fills slot `i + 1`, empty strings become NULL
pub(crate) fn insert_item(
    conn: &Connection,
    table: &str,
    concept_id: &str,
    name: &str,
    editions: &[(&str, &str)],
) {
    conn.execute(
        &format!(
            "INSERT INTO {} (concept_id, name) VALUES (?1, ?2)",
            quote_identifier(table)
        ),
        params![concept_id, name],
    )
    .unwrap();

    for (i, (edition, price)) in editions.iter().enumerate() {
        let slot = i + 1;
        let edition = (!edition.is_empty()).then_some(*edition);
        let price = (!price.is_empty()).then_some(*price);
        conn.execute(
            &format!(
                "UPDATE {} SET surum_adi_{slot} = ?1, fiyat_{slot} = ?2 WHERE concept_id = ?3",
                quote_identifier(table)
            ),
            params![edition, price, concept_id],
        )
        .unwrap();
    }
}
