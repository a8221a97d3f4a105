//! Reservations as the engine sees them.
//!
//! Rows come from the booking flow and are read-only here. Cancelled and
//! completed reservations are excluded upstream; the engine only ever
//! receives confirmed and pending rows.

use serde::{Deserialize, Serialize};

use crate::interval::Interval;
use crate::types::{ReservationId, TableId, ValidationError};

/// Booking lifecycle states that participate in conflict and risk checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[default]
    Confirmed,
    Pending,
}

impl ReservationStatus {
    /// Returns the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Pending => "pending",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "pending" => Ok(Self::Pending),
            _ => Err(ValidationError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// A booked slot for one table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    /// Unique identifier.
    pub id: ReservationId,

    /// The table this booking is assigned to.
    pub table_id: TableId,

    /// The booked slot; carries the calendar day.
    pub interval: Interval,

    /// Lifecycle state. Pending rows count for conflicts but a turnover
    /// warning is only ever raised against a confirmed booking.
    pub status: ReservationStatus,

    /// Number of guests in the party.
    pub party_size: u32,

    /// Free-form pointer to the guest record (name, phone), if captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_ref: Option<String>,
}

impl Reservation {
    /// Creates a reservation with no guest reference.
    pub fn new(
        id: ReservationId,
        table_id: TableId,
        interval: Interval,
        status: ReservationStatus,
        party_size: u32,
    ) -> Self {
        Self {
            id,
            table_id,
            interval,
            status,
            party_size,
            guest_ref: None,
        }
    }

    /// Whether the booking is confirmed.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.status == ReservationStatus::Confirmed
    }
}
