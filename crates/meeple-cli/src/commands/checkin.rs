//! Check-in command: opens a live session on a table.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use meeple_core::{GameId, LiveSession, SessionId, TableId, VenueId};
use meeple_db::Database;
use uuid::Uuid;

/// Seats a party at a table and prints the new session id.
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    venue: &str,
    table: &str,
    game: Option<&str>,
    now: NaiveDateTime,
) -> Result<()> {
    let venue_id = VenueId::new(venue).context("invalid venue id")?;
    let table_id = TableId::new(table).context("invalid table id")?;

    let table = db
        .get_table(&table_id)?
        .with_context(|| format!("table not found: {table_id}"))?;
    if table.venue_id != venue_id {
        bail!("table {table_id} belongs to venue {}", table.venue_id);
    }
    if !table.is_active {
        bail!("table {table_id} is retired");
    }

    let session_id =
        SessionId::new(Uuid::new_v4().to_string()).context("generated session id was invalid")?;
    let mut session = LiveSession::new(session_id, table_id, now);
    if let Some(game) = game {
        // A game named at the door starts the play clock immediately.
        session.game_id = Some(GameId::new(game).context("invalid game id")?);
        session.started_at = Some(now);
    }

    db.insert_session(&session)
        .context("failed to record check-in")?;
    tracing::info!(session_id = %session.id, table_id = %session.table_id, "checked in");
    writeln!(writer, "{}", session.id)?;
    Ok(())
}
