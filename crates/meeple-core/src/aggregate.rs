//! Per-table occupancy board for a whole venue and one calendar day.
//!
//! Pure orchestration over an in-memory snapshot: resolve each table's
//! occupant, detect booking conflicts, project the occupancy end and judge
//! turnover risk. Tables are independent, so evaluation runs in parallel
//! and merges into one map. The board is total over active tables; a
//! partial result is never produced.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conflict::{Conflict, ConflictError, detect_conflicts};
use crate::reservation::Reservation;
use crate::risk::{
    EndBasis, OccupancyEnd, TurnoverRisk, VenueConfig, estimate_session_end, evaluate_risk,
};
use crate::session::{LiveSession, ResolveError, ResolvedOccupant, resolve};
use crate::table::Table;
use crate::types::{TableId, VenueId};

/// One consistent view of a venue's floor for one day.
///
/// The storage layer builds this inside a single transaction so sessions
/// and reservations cannot drift apart between reads. Session and
/// reservation rows are keyed by the table they belong to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VenueSnapshot {
    pub venue_id: VenueId,
    pub date: NaiveDate,
    pub tables: Vec<Table>,
    pub sessions: HashMap<TableId, Vec<LiveSession>>,
    pub reservations: HashMap<TableId, Vec<Reservation>>,
}

/// Everything the floor view needs to render one table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableStatus {
    pub table: Table,
    pub occupant: Option<ResolvedOccupant>,
    pub conflicts: Vec<Conflict>,
    pub risk: Option<TurnoverRisk>,
}

/// The assembled board, keyed by table id in stable order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OccupancyBoard {
    pub venue_id: VenueId,
    pub date: NaiveDate,
    pub generated_at: NaiveDateTime,
    pub tables: BTreeMap<TableId, TableStatus>,
}

/// Inconsistent snapshots and per-table precondition failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// Session or reservation rows reference a table the snapshot does not
    /// contain.
    #[error("snapshot references unknown table {table}")]
    UnknownTable { table: TableId },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),
}

/// Builds the occupancy board for every active table in the snapshot.
///
/// Each active table gets an entry even when nothing is booked or seated at
/// it. Inactive tables are skipped and any rows keyed to them are ignored
/// with a warning. Rows keyed to a table absent from the snapshot mean the
/// view is inconsistent and the whole aggregation fails.
///
/// Idempotent: identical input at the same `now` yields an identical board,
/// so callers may re-run it on a refresh tick without coordination.
pub fn aggregate(
    snapshot: &VenueSnapshot,
    now: NaiveDateTime,
    config: &VenueConfig,
) -> Result<OccupancyBoard, AggregateError> {
    let known: HashMap<&TableId, &Table> =
        snapshot.tables.iter().map(|t| (&t.id, t)).collect();

    // Sorted so the reported id is the same whichever map the stray rows
    // sit in and however the hash buckets iterate.
    let mut referenced: Vec<&TableId> = snapshot
        .sessions
        .keys()
        .chain(snapshot.reservations.keys())
        .collect();
    referenced.sort();
    referenced.dedup();
    for id in referenced {
        match known.get(id) {
            None => {
                return Err(AggregateError::UnknownTable { table: (*id).clone() });
            }
            Some(table) if !table.is_active => {
                tracing::warn!(table = %id, "ignoring rows for inactive table");
            }
            Some(_) => {}
        }
    }

    let tables: BTreeMap<TableId, TableStatus> = snapshot
        .tables
        .par_iter()
        .filter(|table| table.is_active)
        .map(|table| Ok((table.id.clone(), table_status(table, snapshot, now, config)?)))
        .collect::<Result<_, AggregateError>>()?;

    Ok(OccupancyBoard {
        venue_id: snapshot.venue_id.clone(),
        date: snapshot.date,
        generated_at: now,
        tables,
    })
}

fn table_status(
    table: &Table,
    snapshot: &VenueSnapshot,
    now: NaiveDateTime,
    config: &VenueConfig,
) -> Result<TableStatus, AggregateError> {
    let sessions = snapshot
        .sessions
        .get(&table.id)
        .map_or(&[][..], Vec::as_slice);
    for session in sessions {
        if session.table_id != table.id {
            return Err(ResolveError::MixedTables {
                session: session.id.clone(),
                expected: table.id.clone(),
                found: session.table_id.clone(),
            }
            .into());
        }
    }

    let reservations = snapshot
        .reservations
        .get(&table.id)
        .map_or(&[][..], Vec::as_slice);
    for reservation in reservations {
        if reservation.table_id != table.id {
            return Err(ConflictError::MixedTables {
                reservation: reservation.id.clone(),
                expected: table.id.clone(),
                found: reservation.table_id.clone(),
            }
            .into());
        }
        if reservation.interval.date() != snapshot.date {
            return Err(ConflictError::MixedDates {
                reservation: reservation.id.clone(),
                expected: snapshot.date,
                found: reservation.interval.date(),
            }
            .into());
        }
    }

    let occupant = resolve(sessions)?;
    let conflicts = detect_conflicts(reservations)?;

    // Projected end of the current occupancy: a live session wins; failing
    // that, a confirmed booking holding the table right now.
    let current_end = if let Some(occupant) = &occupant {
        Some(estimate_session_end(&occupant.session, now, config))
    } else {
        reservations
            .iter()
            .filter(|r| r.is_confirmed() && r.interval.contains(now))
            .max_by_key(|r| (r.interval.end_at(), r.id.clone()))
            .map(|r| OccupancyEnd {
                at: r.interval.end_at(),
                basis: EndBasis::ReservationEnd,
            })
    };

    let next = reservations
        .iter()
        .filter(|r| r.is_confirmed() && r.interval.start_at() > now)
        .min_by_key(|r| (r.interval.start_at(), r.id.clone()));

    let risk = evaluate_risk(current_end, next, config);

    Ok(TableStatus {
        table: table.clone(),
        occupant,
        conflicts,
        risk,
    })
}
