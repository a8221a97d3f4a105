//! Status command for one-screen venue counts.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use meeple_core::{OccupancyBoard, RiskLevel, VenueId, VenueSnapshot, aggregate};
use meeple_db::Database;

use crate::Config;

/// Counts shown by `meeple status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloorSummary {
    pub active_tables: usize,
    pub occupied_tables: usize,

    /// Open session rows, counting duplicates behind a resolved occupant.
    pub open_sessions: usize,

    pub reservations_today: usize,
    pub conflicted_tables: usize,
    pub high_risk_tables: usize,
}

/// Derives the status counts from one day's snapshot and board.
pub fn summarize(snapshot: &VenueSnapshot, board: &OccupancyBoard) -> FloorSummary {
    let open_sessions = board
        .tables
        .values()
        .filter_map(|status| status.occupant.as_ref())
        .map(|occupant| 1 + occupant.superseded.len())
        .sum();
    let reservations_today = board
        .tables
        .keys()
        .filter_map(|id| snapshot.reservations.get(id))
        .map(Vec::len)
        .sum();

    FloorSummary {
        active_tables: board.tables.len(),
        occupied_tables: board
            .tables
            .values()
            .filter(|status| status.occupant.is_some())
            .count(),
        open_sessions,
        reservations_today,
        conflicted_tables: board
            .tables
            .values()
            .filter(|status| !status.conflicts.is_empty())
            .count(),
        high_risk_tables: board
            .tables
            .values()
            .filter(|status| {
                status
                    .risk
                    .as_ref()
                    .is_some_and(|risk| risk.level == RiskLevel::High)
            })
            .count(),
    }
}

/// Writes the summary block.
pub fn render<W: Write>(
    writer: &mut W,
    venue: &VenueId,
    date: NaiveDate,
    summary: &FloorSummary,
    database_path: &Path,
) -> Result<()> {
    writeln!(writer, "Venue {venue} on {date}")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer)?;
    writeln!(writer, "{:<21} {}", "Active tables:", summary.active_tables)?;
    writeln!(writer, "{:<21} {}", "Occupied tables:", summary.occupied_tables)?;
    writeln!(writer, "{:<21} {}", "Open sessions:", summary.open_sessions)?;
    writeln!(writer, "{:<21} {}", "Reservations today:", summary.reservations_today)?;
    writeln!(writer, "{:<21} {}", "Tables in conflict:", summary.conflicted_tables)?;
    writeln!(writer, "{:<21} {}", "Tables at high risk:", summary.high_risk_tables)?;
    Ok(())
}

/// Runs the status command.
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    venue: &str,
    now: NaiveDateTime,
    config: &Config,
) -> Result<()> {
    let venue = VenueId::new(venue).context("invalid venue id")?;
    let date = now.date();
    let snapshot = db
        .load_snapshot(&venue, date)
        .context("failed to load venue snapshot")?;
    let board = aggregate(&snapshot, now, &config.venue_config())?;
    let summary = summarize(&snapshot, &board);
    render(writer, &venue, date, &summary, &config.database_path)
}
