//! Reserve command: books a slot and flags collisions with existing bookings.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveTime};
use clap::Args;
use meeple_core::{
    Interval, Reservation, ReservationId, ReservationStatus, TableId, VenueId, detect_conflicts,
    format_minutes,
};
use meeple_db::Database;
use uuid::Uuid;

#[derive(Debug, Args)]
pub struct ReserveArgs {
    /// Venue the table belongs to.
    #[arg(long)]
    pub venue: String,

    /// Table to book.
    #[arg(long)]
    pub table: String,

    /// Calendar day of the booking (YYYY-MM-DD).
    #[arg(long)]
    pub date: NaiveDate,

    /// Start of the slot (HH:MM, venue-local).
    #[arg(long)]
    pub start: NaiveTime,

    /// End of the slot (HH:MM, venue-local).
    #[arg(long)]
    pub end: NaiveTime,

    /// Number of guests in the party.
    #[arg(long)]
    pub party: u32,

    /// Guest record to attach (name, phone).
    #[arg(long)]
    pub guest: Option<String>,

    /// Book as pending instead of confirmed.
    #[arg(long)]
    pub pending: bool,
}

/// Books the slot, prints the reservation id, then warns about any
/// overlap with the table's other bookings that day.
pub fn run<W: Write>(writer: &mut W, db: &mut Database, args: &ReserveArgs) -> Result<()> {
    let venue_id = VenueId::new(&args.venue).context("invalid venue id")?;
    let table_id = TableId::new(&args.table).context("invalid table id")?;

    let table = db
        .get_table(&table_id)?
        .with_context(|| format!("table not found: {table_id}"))?;
    if table.venue_id != venue_id {
        bail!("table {table_id} belongs to venue {}", table.venue_id);
    }
    if !table.is_active {
        bail!("table {table_id} is retired");
    }
    if args.party == 0 {
        bail!("party size must be at least 1");
    }

    let interval =
        Interval::new(args.date, args.start, args.end).context("invalid reservation slot")?;
    let status = if args.pending {
        ReservationStatus::Pending
    } else {
        ReservationStatus::Confirmed
    };
    let reservation_id = ReservationId::new(Uuid::new_v4().to_string())
        .context("generated reservation id was invalid")?;
    let mut reservation = Reservation::new(
        reservation_id,
        table_id.clone(),
        interval,
        status,
        args.party,
    );
    reservation.guest_ref = args.guest.clone();

    db.insert_reservation(&reservation)
        .context("failed to record reservation")?;
    tracing::info!(
        reservation_id = %reservation.id,
        table_id = %table_id,
        date = %args.date,
        "booked slot"
    );
    writeln!(writer, "{}", reservation.id)?;

    // The booking is taken either way; collisions are the staff's call.
    let day = db.list_reservations(&table_id, args.date)?;
    for conflict in detect_conflicts(&day)? {
        let other = if conflict.first == reservation.id {
            &conflict.second
        } else if conflict.second == reservation.id {
            &conflict.first
        } else {
            continue;
        };
        writeln!(
            writer,
            "warning: overlaps {other} by {}",
            format_minutes(conflict.overlap_minutes)
        )?;
    }
    Ok(())
}
