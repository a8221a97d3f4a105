//! Assign-game command: marks a browsing session as playing.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use meeple_core::{GameId, SessionId};
use meeple_db::Database;

/// Records which game an open session is playing.
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &str,
    game: &str,
    now: NaiveDateTime,
) -> Result<()> {
    let session_id = SessionId::new(session).context("invalid session id")?;
    let game_id = GameId::new(game).context("invalid game id")?;
    db.assign_game(&session_id, &game_id, now)
        .with_context(|| format!("failed to assign game to session {session_id}"))?;
    tracing::info!(session_id = %session_id, game_id = %game_id, "assigned game");
    writeln!(writer, "Assigned {game_id} to session {session_id}")?;
    Ok(())
}
