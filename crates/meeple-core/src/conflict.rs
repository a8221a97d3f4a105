//! Double-booking detection over one table's reservations for one day.
//!
//! Every strictly overlapping pair of bookings is reported exactly once.
//! Touching endpoints are back-to-back turnover, not a conflict; the tight
//! gap they leave is the risk evaluator's concern.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reservation::Reservation;
use crate::types::{ReservationId, TableId};

/// Severity of a booking conflict.
///
/// Single tier: any positive overlap means two parties hold the same table
/// at the same time, which staff must resolve before either arrives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Critical,
}

impl ConflictSeverity {
    /// Returns the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One overlapping pair of reservations on a table.
///
/// `first` starts no later than `second`; ties on start time are broken by
/// reservation ID, so the same input always produces the same pair order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conflict {
    pub table_id: TableId,
    pub first: ReservationId,
    pub second: ReservationId,

    /// Whole minutes of overlap, at least 1. Sub-minute overlaps round up.
    pub overlap_minutes: i64,

    pub severity: ConflictSeverity,
}

/// Precondition violations in [`detect_conflicts`] input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConflictError {
    /// A reservation belongs to a different table than the rest.
    #[error("reservation {reservation} belongs to table {found}, expected {expected}")]
    MixedTables {
        reservation: ReservationId,
        expected: TableId,
        found: TableId,
    },

    /// A reservation falls on a different calendar day than the rest.
    #[error("reservation {reservation} is on {found}, expected {expected}")]
    MixedDates {
        reservation: ReservationId,
        expected: chrono::NaiveDate,
        found: chrono::NaiveDate,
    },
}

fn booking_order(a: &Reservation, b: &Reservation) -> Ordering {
    a.interval
        .start()
        .cmp(&b.interval.start())
        .then_with(|| a.id.cmp(&b.id))
}

/// Finds every double-booked pair among one table's reservations for one
/// day. Confirmed and pending bookings both participate; cancelled rows
/// must be filtered out upstream.
///
/// Input spanning more than one table or day is malformed and rejected.
/// The result is independent of input order and stable across repeat runs.
pub fn detect_conflicts(reservations: &[Reservation]) -> Result<Vec<Conflict>, ConflictError> {
    let Some(first) = reservations.first() else {
        return Ok(Vec::new());
    };

    let table_id = &first.table_id;
    let date = first.interval.date();
    for reservation in reservations {
        if reservation.table_id != *table_id {
            return Err(ConflictError::MixedTables {
                reservation: reservation.id.clone(),
                expected: table_id.clone(),
                found: reservation.table_id.clone(),
            });
        }
        if reservation.interval.date() != date {
            return Err(ConflictError::MixedDates {
                reservation: reservation.id.clone(),
                expected: date,
                found: reservation.interval.date(),
            });
        }
    }

    let mut ordered: Vec<&Reservation> = reservations.iter().collect();
    ordered.sort_by(|a, b| booking_order(a, b));

    // Sweep in start order, keeping the set of bookings still open at the
    // current start time. Each reservation pairs with every open one, so a
    // pair is emitted exactly once, earlier booking first.
    let mut conflicts = Vec::new();
    let mut open: Vec<&Reservation> = Vec::new();
    for reservation in ordered {
        open.retain(|o| o.interval.end() > reservation.interval.start());
        for other in &open {
            conflicts.push(Conflict {
                table_id: table_id.clone(),
                first: other.id.clone(),
                second: reservation.id.clone(),
                overlap_minutes: other.interval.overlap_minutes(&reservation.interval),
                severity: ConflictSeverity::Critical,
            });
        }
        open.push(reservation);
    }

    Ok(conflicts)
}
