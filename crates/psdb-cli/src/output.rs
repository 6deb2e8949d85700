//! Terminal and JSON rendering of query results

use anyhow::Result;
use psdb_library::{DiscountEvent, ItemRecord, PriceDataPoint, Snapshot};
use psdb_update::InstallResult;
use serde::Serialize;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn games(games: &[ItemRecord], json: bool) -> Result<()> {
    if json {
        return print_json(games);
    }
    if games.is_empty() {
        println!("No games found");
        return Ok(());
    }

    for game in games {
        println!("{}", format_game(game));
    }
    Ok(())
}

fn format_game(game: &ItemRecord) -> String {
    let mut out = format!("{} [{}]", game.name, game.concept_id);
    for (index, edition) in game.editions() {
        out.push_str(&format!(
            "\n  {}. {} - {}",
            index,
            edition.name.as_deref().unwrap_or_default(),
            edition.price.as_deref().unwrap_or("N/A")
        ));
    }
    out
}

pub fn history(
    concept_id: &str,
    edition: usize,
    points: &[PriceDataPoint],
    json: bool,
) -> Result<()> {
    if json {
        return print_json(points);
    }
    if points.is_empty() {
        println!("No price history for {} edition {}", concept_id, edition);
        return Ok(());
    }

    for point in points {
        println!("{}  {:>10.2}", point.day, point.price);
    }
    Ok(())
}

pub fn drops(drops: &[DiscountEvent], json: bool) -> Result<()> {
    if json {
        return print_json(drops);
    }
    if drops.is_empty() {
        println!("No price drops");
        return Ok(());
    }

    for drop in drops {
        println!("{}", format_drop(drop));
    }
    Ok(())
}

fn format_drop(drop: &DiscountEvent) -> String {
    format!(
        "{} ({}): {} -> {} (-{:.0}%)",
        drop.name,
        drop.edition_name,
        drop.old_price,
        drop.new_price,
        drop.discount_percent()
    )
}

pub fn snapshots(snapshots: &[Snapshot], json: bool) -> Result<()> {
    if json {
        return print_json(snapshots);
    }
    if snapshots.is_empty() {
        println!("No snapshots yet");
        return Ok(());
    }

    for snapshot in snapshots {
        println!("{}  {}", snapshot.captured_at.format("%Y-%m-%d %H:%M"), snapshot.name);
    }
    Ok(())
}

#[derive(Serialize)]
struct RefreshReport<'a> {
    bytes: u64,
    snapshots: usize,
    latest: Option<String>,
    drops: &'a [DiscountEvent],
}

pub fn refresh(installed: &InstallResult, drops: &[DiscountEvent], json: bool) -> Result<()> {
    if json {
        return print_json(&RefreshReport {
            bytes: installed.bytes,
            snapshots: installed.snapshots,
            latest: installed.latest.map(|t| t.to_string()),
            drops,
        });
    }

    println!(
        "Installed {} snapshots ({} bytes)",
        installed.snapshots, installed.bytes
    );
    println!("{}", drop_notification(drops.len()));
    for drop in drops {
        println!("  {}", format_drop(drop));
    }
    Ok(())
}

/// One-line summary suitable for a desktop notification
fn drop_notification(count: usize) -> String {
    match count {
        0 => "No new price drops".to_string(),
        1 => "1 price drop detected".to_string(),
        n => format!("{} price drops detected", n),
    }
}
