//! Floor command for showing the per-table occupancy board.
//!
//! This module implements `meeple floor`, which renders every active table
//! of a venue for one day: who holds it, which bookings collide, and how
//! tight the next turnover is.

use std::fmt::Write;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use meeple_core::{
    EndBasis, OccupancyBoard, RiskLevel, TurnoverRisk, VenueConfig, VenueId, aggregate,
    format_minutes,
};
use meeple_db::Database;

// ========== Board Assembly ==========

/// Loads one venue's snapshot and assembles the board for a day.
pub fn build_board(
    db: &mut Database,
    venue: &str,
    date: NaiveDate,
    now: NaiveDateTime,
    tuning: &VenueConfig,
) -> Result<OccupancyBoard> {
    let venue = VenueId::new(venue).context("invalid venue id")?;
    let snapshot = db
        .load_snapshot(&venue, date)
        .context("failed to load venue snapshot")?;
    let board = aggregate(&snapshot, now, tuning)?;
    Ok(board)
}

// ========== Human-Readable Output ==========

/// Format the board for human-readable output.
pub fn format_board(board: &OccupancyBoard) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "FLOOR {} {} (as of {})",
        board.venue_id,
        board.date.format("%Y-%m-%d"),
        board.generated_at.format("%H:%M")
    )
    .unwrap();

    if board.tables.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No active tables for this venue.").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "Hint: run 'meeple tables add --venue {} --label <label>' to set up the floor.",
            board.venue_id
        )
        .unwrap();
        return output;
    }

    for status in board.tables.values() {
        writeln!(output).unwrap();
        writeln!(output, "{} ({})", status.table.label, status.table.id).unwrap();

        if let Some(occupant) = &status.occupant {
            let session = &occupant.session;
            let activity = session
                .game_id
                .as_ref()
                .map_or_else(|| "browsing".to_string(), |game| format!("playing {game}"));
            let mut line = format!(
                "  {activity} since {}",
                session.effective_since().format("%H:%M")
            );
            if occupant.has_duplicates {
                let extra = occupant.superseded.len();
                let plural = if extra == 1 { "" } else { "s" };
                write!(line, " [+{extra} duplicate check-in{plural}]").unwrap();
            }
            writeln!(output, "{line}").unwrap();
        } else {
            writeln!(output, "  free").unwrap();
        }

        for conflict in &status.conflicts {
            writeln!(
                output,
                "  conflict: {} overlaps {} by {} ({})",
                conflict.first,
                conflict.second,
                format_minutes(conflict.overlap_minutes),
                conflict.severity
            )
            .unwrap();
        }

        if let Some(risk) = &status.risk {
            writeln!(output, "{}", format_risk(risk)).unwrap();
        }
    }

    let occupied = board
        .tables
        .values()
        .filter(|status| status.occupant.is_some())
        .count();
    let free = board.tables.len() - occupied;
    let conflicted = board
        .tables
        .values()
        .filter(|status| !status.conflicts.is_empty())
        .count();
    let high_risk = board
        .tables
        .values()
        .filter(|status| {
            status
                .risk
                .as_ref()
                .is_some_and(|risk| risk.level == RiskLevel::High)
        })
        .count();

    writeln!(output).unwrap();
    writeln!(
        output,
        "{occupied} occupied, {free} free, {conflicted} in conflict, {high_risk} at high risk"
    )
    .unwrap();

    output
}

/// One turnover warning line. Estimated ends are labelled as such so staff
/// know the time is an assumption, not a booking.
fn format_risk(risk: &TurnoverRisk) -> String {
    let basis = match risk.current_end.basis {
        EndBasis::SessionEstimate => "estimated",
        EndBasis::ReservationEnd => "booked",
    };
    let freed = risk.current_end.at.format("%H:%M");
    let next = risk.next_start.format("%H:%M");

    if risk.gap_minutes < 0 {
        format!(
            "  turnover {}: {basis} end {freed} runs {} past {} at {next}",
            risk.level,
            format_minutes(-risk.gap_minutes),
            risk.next_reservation
        )
    } else {
        format!(
            "  turnover {}: {basis} end {freed} leaves {} before {} at {next} (buffer {})",
            risk.level,
            format_minutes(risk.gap_minutes),
            risk.next_reservation,
            format_minutes(risk.buffer_minutes)
        )
    }
}

// ========== Public Interface ==========

/// Runs the floor command.
pub fn run(
    db: &mut Database,
    venue: &str,
    date: NaiveDate,
    now: NaiveDateTime,
    json: bool,
    tuning: &VenueConfig,
) -> Result<()> {
    let board = build_board(db, venue, date, now, tuning)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&board)?);
    } else {
        print!("{}", format_board(&board));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveTime;
    use insta::assert_snapshot;
    use meeple_core::{
        GameId, Interval, LiveSession, Reservation, ReservationId, ReservationStatus, SessionId,
        Table, TableId, VenueSnapshot,
    };

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        day().and_hms_opt(hour, min, 0).unwrap()
    }

    fn tid(id: &str) -> TableId {
        TableId::new(id).unwrap()
    }

    fn table(id: &str, label: &str) -> Table {
        Table::new(tid(id), VenueId::new("cafe-main").unwrap(), label)
    }

    fn session(id: &str, table_id: &str, since: NaiveDateTime) -> LiveSession {
        LiveSession::new(SessionId::new(id).unwrap(), tid(table_id), since)
    }

    fn booking(id: &str, table_id: &str, start: (u32, u32), end: (u32, u32)) -> Reservation {
        Reservation::new(
            ReservationId::new(id).unwrap(),
            tid(table_id),
            Interval::new(
                day(),
                NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
                NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            )
            .unwrap(),
            ReservationStatus::Confirmed,
            4,
        )
    }

    fn snapshot(tables: Vec<Table>) -> VenueSnapshot {
        VenueSnapshot {
            venue_id: VenueId::new("cafe-main").unwrap(),
            date: day(),
            tables,
            sessions: HashMap::new(),
            reservations: HashMap::new(),
        }
    }

    #[test]
    fn floor_empty_venue() {
        let board = aggregate(&snapshot(vec![]), at(19, 10), &VenueConfig::default()).unwrap();
        let output = format_board(&board);
        assert_snapshot!(output, @r"
        FLOOR cafe-main 2026-03-14 (as of 19:10)

        No active tables for this venue.

        Hint: run 'meeple tables add --venue cafe-main --label <label>' to set up the floor.
        ");
    }

    #[test]
    fn floor_busy_night() {
        let mut snap = snapshot(vec![table("t-1", "Window 2"), table("t-2", "Big Round")]);

        // A double check-in: the playing row wins, the browsing row is noted.
        let browsing = session("s-1", "t-1", at(18, 40));
        let mut playing = session("s-2", "t-1", at(18, 45));
        playing.game_id = Some(GameId::new("gloomhaven").unwrap());
        playing.started_at = Some(at(19, 0));
        snap.sessions.insert(tid("t-1"), vec![browsing, playing]);

        snap.reservations.insert(
            tid("t-1"),
            vec![
                booking("r-1", "t-1", (20, 30), (22, 0)),
                booking("r-2", "t-1", (21, 30), (23, 0)),
            ],
        );
        snap.reservations
            .insert(tid("t-2"), vec![booking("r-3", "t-2", (19, 30), (21, 0))]);

        let board = aggregate(&snap, at(19, 10), &VenueConfig::default()).unwrap();
        let output = format_board(&board);
        assert_snapshot!(output, @r"
        FLOOR cafe-main 2026-03-14 (as of 19:10)

        Window 2 (t-1)
          playing gloomhaven since 19:00 [+1 duplicate check-in]
          conflict: r-1 overlaps r-2 by 30m (critical)
          turnover high: estimated end 20:30 leaves 0m before r-1 at 20:30 (buffer 15m)

        Big Round (t-2)
          free

        1 occupied, 1 free, 1 in conflict, 1 at high risk
        ");
    }

    #[test]
    fn floor_overrunning_session() {
        let mut snap = snapshot(vec![table("t-1", "Corner")]);
        snap.sessions
            .insert(tid("t-1"), vec![session("s-1", "t-1", at(18, 0))]);
        snap.reservations
            .insert(tid("t-1"), vec![booking("r-9", "t-1", (19, 0), (21, 0))]);

        let board = aggregate(&snap, at(18, 10), &VenueConfig::default()).unwrap();
        let output = format_board(&board);
        assert_snapshot!(output, @r"
        FLOOR cafe-main 2026-03-14 (as of 18:10)

        Corner (t-1)
          browsing since 18:00
          turnover high: estimated end 19:30 runs 30m past r-9 at 19:00

        1 occupied, 0 free, 0 in conflict, 1 at high risk
        ");
    }

    #[test]
    fn floor_reserved_table_without_checkin() {
        // Nobody is seated, but a confirmed booking holds the table right
        // now and the next party is due 10 minutes after it ends.
        let mut snap = snapshot(vec![table("t-1", "Corner")]);
        snap.reservations.insert(
            tid("t-1"),
            vec![
                booking("r-1", "t-1", (19, 0), (20, 30)),
                booking("r-2", "t-1", (20, 40), (22, 0)),
            ],
        );

        let board = aggregate(&snap, at(19, 10), &VenueConfig::default()).unwrap();
        let output = format_board(&board);
        assert_snapshot!(output, @r"
        FLOOR cafe-main 2026-03-14 (as of 19:10)

        Corner (t-1)
          free
          turnover high: booked end 20:30 leaves 10m before r-2 at 20:40 (buffer 15m)

        0 occupied, 1 free, 0 in conflict, 1 at high risk
        ");
    }

    #[test]
    fn floor_json_is_machine_readable() {
        let mut snap = snapshot(vec![table("t-1", "Window 2")]);
        snap.sessions
            .insert(tid("t-1"), vec![session("s-1", "t-1", at(19, 0))]);

        let board = aggregate(&snap, at(19, 10), &VenueConfig::default()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string_pretty(&board).unwrap()).unwrap();

        assert_eq!(value["venue_id"], "cafe-main");
        assert_eq!(value["tables"]["t-1"]["occupant"]["session"]["id"], "s-1");
        assert_eq!(value["tables"]["t-1"]["risk"], serde_json::Value::Null);
    }

    #[test]
    fn build_board_reads_from_storage() {
        let mut db = Database::open_in_memory().unwrap();
        db.insert_table(&table("t-1", "Window 2")).unwrap();
        db.insert_session(&session("s-1", "t-1", at(19, 0))).unwrap();

        let board = build_board(
            &mut db,
            "cafe-main",
            day(),
            at(19, 10),
            &VenueConfig::default(),
        )
        .unwrap();

        assert_eq!(board.tables.len(), 1);
        assert!(board.tables[&tid("t-1")].occupant.is_some());
    }
}
