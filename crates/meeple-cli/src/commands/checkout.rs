//! Checkout command: closes a live session.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use meeple_core::SessionId;
use meeple_db::Database;

/// Ends the session and frees its table.
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &str,
    now: NaiveDateTime,
) -> Result<()> {
    let session_id = SessionId::new(session).context("invalid session id")?;
    db.end_session(&session_id, now)
        .with_context(|| format!("failed to check out session {session_id}"))?;
    tracing::info!(session_id = %session_id, "checked out");
    writeln!(writer, "Checked out session {session_id}")?;
    Ok(())
}
