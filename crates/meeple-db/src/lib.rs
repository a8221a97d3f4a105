//! Storage layer for the venue floor.
//!
//! Persists tables, live sessions and reservations using `rusqlite`, and
//! assembles the consistent per-venue snapshots the occupancy engine reads.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! For multi-threaded access, either:
//! - Use a `Mutex<Database>` to serialize access
//! - Create a connection pool (e.g., with `r2d2`)
//! - Use separate `Database` instances per thread
//!
//! # Schema
//!
//! ## Date and Time Format
//!
//! All dates and times are venue-local wall clock, stored as TEXT: datetimes
//! as `2026-03-14T19:00:00`, dates as `2026-03-14`, times of day as
//! `19:00:00`. No zone suffix is stored: a 19:00 booking stays a 19:00
//! booking whatever the venue's UTC offset does, and lexicographic ordering
//! matches chronological ordering within a venue.
//!
//! ## Live Sessions
//!
//! Check-in inserts a row with `ended_at` NULL; checkout stamps `ended_at`.
//! Nothing prevents two open rows for the same table - double check-ins and
//! client retries produce exactly that - so readers collapse them through
//! `meeple_core::resolve`. Queries here only ever return open rows.

use std::collections::HashMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use meeple_core::{
    GameId, Interval, LiveSession, Reservation, ReservationId, ReservationStatus, SessionId,
    Table, TableId, VenueId, VenueSnapshot,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored date or time.
    #[error("invalid timestamp for {record_id}: {value}")]
    TimestampParse {
        record_id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored table row fails domain validation.
    #[error("invalid table row {table_id}: {message}")]
    InvalidTable { table_id: String, message: String },
    /// A stored session row fails domain validation.
    #[error("invalid session row {session_id}: {message}")]
    InvalidSession { session_id: String, message: String },
    /// A stored reservation row fails domain validation.
    #[error("invalid reservation row {reservation_id}: {message}")]
    InvalidReservation {
        reservation_id: String,
        message: String,
    },
    /// No open session with the given ID.
    #[error("no open session {session_id}")]
    SessionNotFound { session_id: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tables (
                id TEXT PRIMARY KEY,
                venue_id TEXT NOT NULL,
                label TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_tables_venue ON tables(venue_id);

            CREATE TABLE IF NOT EXISTS live_sessions (
                id TEXT PRIMARY KEY,
                table_id TEXT NOT NULL,
                game_id TEXT,
                started_at TEXT,
                created_at TEXT NOT NULL,
                ended_at TEXT,
                FOREIGN KEY (table_id) REFERENCES tables(id)
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_table_open
                ON live_sessions(table_id, ended_at);

            CREATE TABLE IF NOT EXISTS reservations (
                id TEXT PRIMARY KEY,
                table_id TEXT NOT NULL,
                date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                status TEXT NOT NULL,
                party_size INTEGER NOT NULL,
                guest_ref TEXT,
                FOREIGN KEY (table_id) REFERENCES tables(id)
            );

            CREATE INDEX IF NOT EXISTS idx_reservations_table_date
                ON reservations(table_id, date);
            ",
        )?;
        Ok(())
    }

    /// Registers a table on the floor.
    pub fn insert_table(&mut self, table: &Table) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO tables (id, venue_id, label, is_active) VALUES (?, ?, ?, ?)",
            params![
                table.id.as_str(),
                table.venue_id.as_str(),
                table.label,
                table.is_active,
            ],
        )?;
        Ok(())
    }

    /// Fetches a single table, or `None` when the ID is unknown.
    pub fn get_table(&self, table_id: &TableId) -> Result<Option<Table>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, venue_id, label, is_active FROM tables WHERE id = ?",
                [table_id.as_str()],
                table_row,
            )
            .optional()?;
        row.map(TableRow::into_table).transpose()
    }

    /// Lists a venue's tables, active and retired, ordered by ID.
    pub fn list_tables(&self, venue_id: &VenueId) -> Result<Vec<Table>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, venue_id, label, is_active FROM tables WHERE venue_id = ? ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([venue_id.as_str()], table_row)?;

        let mut tables = Vec::new();
        for row in rows {
            tables.push(row?.into_table()?);
        }
        Ok(tables)
    }

    /// Records a check-in as a new open session row.
    pub fn insert_session(&mut self, session: &LiveSession) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO live_sessions (id, table_id, game_id, started_at, created_at, ended_at)
            VALUES (?, ?, ?, ?, ?, NULL)
            ",
            params![
                session.id.as_str(),
                session.table_id.as_str(),
                session.game_id.as_ref().map(GameId::as_str),
                session.started_at.map(format_datetime),
                format_datetime(session.created_at),
            ],
        )?;
        Ok(())
    }

    /// Puts a game on an open session's table.
    ///
    /// The first game assigned also stamps `started_at`, marking the shift
    /// from browsing to playing. Later reassignments keep the original
    /// start, so swapping games mid-evening does not reset the clock.
    pub fn assign_game(
        &mut self,
        session_id: &SessionId,
        game_id: &GameId,
        at: NaiveDateTime,
    ) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "
            UPDATE live_sessions
            SET game_id = ?, started_at = COALESCE(started_at, ?)
            WHERE id = ? AND ended_at IS NULL
            ",
            params![
                game_id.as_str(),
                format_datetime(at),
                session_id.as_str(),
            ],
        )?;
        if updated == 0 {
            return Err(DbError::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }
        Ok(())
    }

    /// Ends an open session, freeing its table.
    ///
    /// Returns [`DbError::SessionNotFound`] when the ID is unknown or the
    /// session was already checked out.
    pub fn end_session(
        &mut self,
        session_id: &SessionId,
        ended_at: NaiveDateTime,
    ) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE live_sessions SET ended_at = ? WHERE id = ? AND ended_at IS NULL",
            params![format_datetime(ended_at), session_id.as_str()],
        )?;
        if updated == 0 {
            return Err(DbError::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }
        Ok(())
    }

    /// Lists the open sessions on one table.
    ///
    /// A well-behaved floor has zero or one; duplicates from double
    /// check-ins are returned as-is for the caller to collapse.
    pub fn list_active_sessions(&self, table_id: &TableId) -> Result<Vec<LiveSession>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, table_id, game_id, started_at, created_at
            FROM live_sessions
            WHERE table_id = ? AND ended_at IS NULL
            ORDER BY created_at ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map([table_id.as_str()], session_row)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?.into_session()?);
        }
        Ok(sessions)
    }

    /// Books a slot on a table.
    pub fn insert_reservation(&mut self, reservation: &Reservation) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO reservations
                (id, table_id, date, start_time, end_time, status, party_size, guest_ref)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                reservation.id.as_str(),
                reservation.table_id.as_str(),
                format_date(reservation.interval.date()),
                format_time(reservation.interval.start()),
                format_time(reservation.interval.end()),
                reservation.status.as_str(),
                reservation.party_size,
                reservation.guest_ref,
            ],
        )?;
        Ok(())
    }

    /// Lists one table's bookings for a day, ordered by start time.
    ///
    /// Only `confirmed` and `pending` rows are returned; cancelled or
    /// otherwise dead statuses are filtered out in SQL so they never reach
    /// the occupancy engine.
    pub fn list_reservations(
        &self,
        table_id: &TableId,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, table_id, date, start_time, end_time, status, party_size, guest_ref
            FROM reservations
            WHERE table_id = ? AND date = ? AND status IN ('confirmed', 'pending')
            ORDER BY start_time ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(params![table_id.as_str(), format_date(date)], reservation_row)?;

        let mut reservations = Vec::new();
        for row in rows {
            reservations.push(row?.into_reservation()?);
        }
        Ok(reservations)
    }

    /// Loads everything the occupancy engine needs for one venue and day.
    ///
    /// All three reads run inside a single transaction, so the returned
    /// snapshot is one consistent view: a checkout committed halfway through
    /// cannot leave a session visible but its table missing.
    pub fn load_snapshot(
        &mut self,
        venue_id: &VenueId,
        date: NaiveDate,
    ) -> Result<VenueSnapshot, DbError> {
        let tx = self.conn.transaction()?;

        let tables = {
            let mut stmt = tx.prepare(
                "
                SELECT id, venue_id, label, is_active
                FROM tables
                WHERE venue_id = ?
                ORDER BY id ASC
                ",
            )?;
            let rows = stmt.query_map([venue_id.as_str()], table_row)?;

            let mut tables = Vec::new();
            for row in rows {
                tables.push(row?.into_table()?);
            }
            tables
        };

        let sessions = {
            let mut stmt = tx.prepare(
                "
                SELECT s.id, s.table_id, s.game_id, s.started_at, s.created_at
                FROM live_sessions s
                JOIN tables t ON t.id = s.table_id
                WHERE t.venue_id = ? AND s.ended_at IS NULL
                ORDER BY s.table_id ASC, s.id ASC
                ",
            )?;
            let rows = stmt.query_map([venue_id.as_str()], session_row)?;

            let mut sessions: HashMap<TableId, Vec<LiveSession>> = HashMap::new();
            for row in rows {
                let session = row?.into_session()?;
                sessions
                    .entry(session.table_id.clone())
                    .or_default()
                    .push(session);
            }
            sessions
        };

        let reservations = {
            let mut stmt = tx.prepare(
                "
                SELECT r.id, r.table_id, r.date, r.start_time, r.end_time,
                       r.status, r.party_size, r.guest_ref
                FROM reservations r
                JOIN tables t ON t.id = r.table_id
                WHERE t.venue_id = ? AND r.date = ?
                    AND r.status IN ('confirmed', 'pending')
                ORDER BY r.table_id ASC, r.start_time ASC, r.id ASC
                ",
            )?;
            let rows = stmt.query_map(params![venue_id.as_str(), format_date(date)], reservation_row)?;

            let mut reservations: HashMap<TableId, Vec<Reservation>> = HashMap::new();
            for row in rows {
                let reservation = row?.into_reservation()?;
                reservations
                    .entry(reservation.table_id.clone())
                    .or_default()
                    .push(reservation);
            }
            reservations
        };

        tx.commit()?;

        tracing::debug!(
            venue = %venue_id,
            tables = tables.len(),
            sessions = sessions.values().map(Vec::len).sum::<usize>(),
            reservations = reservations.values().map(Vec::len).sum::<usize>(),
            "loaded venue snapshot"
        );

        Ok(VenueSnapshot {
            venue_id: venue_id.clone(),
            date,
            tables,
            sessions,
            reservations,
        })
    }
}

/// A raw `tables` row before domain validation.
#[derive(Debug)]
struct TableRow {
    id: String,
    venue_id: String,
    label: String,
    is_active: bool,
}

fn table_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TableRow> {
    Ok(TableRow {
        id: row.get(0)?,
        venue_id: row.get(1)?,
        label: row.get(2)?,
        is_active: row.get(3)?,
    })
}

impl TableRow {
    fn into_table(self) -> Result<Table, DbError> {
        let Self {
            id,
            venue_id,
            label,
            is_active,
        } = self;
        let table_id = TableId::new(id.clone()).map_err(|err| invalid_table(&id, err))?;
        let venue_id = VenueId::new(venue_id).map_err(|err| invalid_table(&id, err))?;
        Ok(Table {
            id: table_id,
            venue_id,
            label,
            is_active,
        })
    }
}

/// A raw `live_sessions` row before domain validation.
#[derive(Debug)]
struct SessionRow {
    id: String,
    table_id: String,
    game_id: Option<String>,
    started_at: Option<String>,
    created_at: String,
}

fn session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        id: row.get(0)?,
        table_id: row.get(1)?,
        game_id: row.get(2)?,
        started_at: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl SessionRow {
    fn into_session(self) -> Result<LiveSession, DbError> {
        let Self {
            id,
            table_id,
            game_id,
            started_at,
            created_at,
        } = self;
        let session_id = SessionId::new(id.clone()).map_err(|err| invalid_session(&id, err))?;
        let table_id = TableId::new(table_id).map_err(|err| invalid_session(&id, err))?;
        let game_id = game_id
            .map(GameId::new)
            .transpose()
            .map_err(|err| invalid_session(&id, err))?;
        let started_at = started_at
            .map(|value| parse_datetime(&value, &id))
            .transpose()?;
        let created_at = parse_datetime(&created_at, &id)?;
        Ok(LiveSession {
            id: session_id,
            table_id,
            game_id,
            started_at,
            created_at,
        })
    }
}

/// A raw `reservations` row before domain validation.
#[derive(Debug)]
struct ReservationRow {
    id: String,
    table_id: String,
    date: String,
    start_time: String,
    end_time: String,
    status: String,
    party_size: i64,
    guest_ref: Option<String>,
}

fn reservation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReservationRow> {
    Ok(ReservationRow {
        id: row.get(0)?,
        table_id: row.get(1)?,
        date: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        status: row.get(5)?,
        party_size: row.get(6)?,
        guest_ref: row.get(7)?,
    })
}

impl ReservationRow {
    fn into_reservation(self) -> Result<Reservation, DbError> {
        let Self {
            id,
            table_id,
            date,
            start_time,
            end_time,
            status,
            party_size,
            guest_ref,
        } = self;
        let reservation_id =
            ReservationId::new(id.clone()).map_err(|err| invalid_reservation(&id, err))?;
        let table_id = TableId::new(table_id).map_err(|err| invalid_reservation(&id, err))?;
        let date = parse_date(&date, &id)?;
        let start = parse_time(&start_time, &id)?;
        let end = parse_time(&end_time, &id)?;
        let interval =
            Interval::new(date, start, end).map_err(|err| invalid_reservation(&id, err))?;
        let status = status
            .parse::<ReservationStatus>()
            .map_err(|err| invalid_reservation(&id, err))?;
        let party_size = u32::try_from(party_size)
            .map_err(|_| invalid_reservation(&id, "party size out of range"))?;

        let mut reservation =
            Reservation::new(reservation_id, table_id, interval, status, party_size);
        reservation.guest_ref = guest_ref;
        Ok(reservation)
    }
}

fn invalid_table(id: &str, message: impl std::fmt::Display) -> DbError {
    DbError::InvalidTable {
        table_id: id.to_string(),
        message: message.to_string(),
    }
}

fn invalid_session(id: &str, message: impl std::fmt::Display) -> DbError {
    DbError::InvalidSession {
        session_id: id.to_string(),
        message: message.to_string(),
    }
}

fn invalid_reservation(id: &str, message: impl std::fmt::Display) -> DbError {
    DbError::InvalidReservation {
        reservation_id: id.to_string(),
        message: message.to_string(),
    }
}

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Formats a venue-local datetime for storage, truncating sub-second
/// precision.
#[must_use]
pub fn format_datetime(at: NaiveDateTime) -> String {
    at.format(DATETIME_FORMAT).to_string()
}

/// Formats a calendar date for storage.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Formats a time of day for storage.
#[must_use]
pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn parse_datetime(value: &str, record_id: &str) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map_err(|source| {
        DbError::TimestampParse {
            record_id: record_id.to_string(),
            value: value.to_string(),
            source,
        }
    })
}

fn parse_date(value: &str, record_id: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| DbError::TimestampParse {
        record_id: record_id.to_string(),
        value: value.to_string(),
        source,
    })
}

fn parse_time(value: &str, record_id: &str) -> Result<NaiveTime, DbError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|source| DbError::TimestampParse {
        record_id: record_id.to_string(),
        value: value.to_string(),
        source,
    })
}
