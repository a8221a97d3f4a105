//! Turnover risk: will the current occupant be out before the next booking?
//!
//! A live session has no end time, so its end is projected from venue
//! configuration rather than measured. The projection rides the clock once
//! a session over-runs it, which is why callers re-evaluate periodically
//! instead of caching the result.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::reservation::Reservation;
use crate::session::LiveSession;
use crate::types::{ReservationId, TableId};

/// Venue tuning knobs, all in whole minutes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VenueConfig {
    /// Minimum comfortable gap to clear and reset a table.
    pub buffer_minutes: i64,

    /// Assumed length of a session when projecting its end.
    pub default_session_duration_minutes: i64,

    /// Horizon beyond which an upcoming booking is not yet actionable.
    pub risk_lookahead_minutes: i64,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            buffer_minutes: 15,
            default_session_duration_minutes: 90,
            risk_lookahead_minutes: 120,
        }
    }
}

/// How a projected occupancy end was obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndBasis {
    /// Config-derived estimate from a live session. An assumption, not a
    /// measurement.
    SessionEstimate,

    /// The stated end of a reservation currently holding the table.
    ReservationEnd,
}

impl EndBasis {
    /// Returns the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SessionEstimate => "session_estimate",
            Self::ReservationEnd => "reservation_end",
        }
    }
}

impl std::fmt::Display for EndBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When the table is expected to come free, and on what grounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OccupancyEnd {
    pub at: NaiveDateTime,
    pub basis: EndBasis,
}

/// Risk tiers, ordered so `max` picks the worse one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Returns the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flagged tight turnover on one table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnoverRisk {
    pub table_id: TableId,
    pub current_end: OccupancyEnd,
    pub next_reservation: ReservationId,
    pub next_start: NaiveDateTime,

    /// Whole minutes between projected end and the next booking's start.
    /// Negative when the occupant is projected to run into the booking.
    pub gap_minutes: i64,

    /// The buffer the gap was judged against, for display alongside it.
    pub buffer_minutes: i64,

    pub level: RiskLevel,
}

/// Projects when a live session will end: the time it has been live since
/// plus the configured default duration, floored at `now`. A session
/// already past its projection could end any moment, so the floor keeps the
/// estimate from sitting in the past.
#[must_use]
pub fn estimate_session_end(
    session: &LiveSession,
    now: NaiveDateTime,
    config: &VenueConfig,
) -> OccupancyEnd {
    let projected =
        session.effective_since() + Duration::minutes(config.default_session_duration_minutes);
    OccupancyEnd {
        at: projected.max(now),
        basis: EndBasis::SessionEstimate,
    }
}

/// Judges the gap between the current occupancy's projected end and the
/// next booking. `None` when either side is absent, or when the gap is
/// beyond the lookahead horizon and therefore not yet actionable.
///
/// Tiers against the venue buffer: a gap of zero or less is always High
/// (back-to-back bookings leave no time to turn the table); below one
/// buffer is High, below two buffers Medium, otherwise Low. Shrinking the
/// gap never lowers the level.
#[must_use]
pub fn evaluate_risk(
    current_end: Option<OccupancyEnd>,
    next: Option<&Reservation>,
    config: &VenueConfig,
) -> Option<TurnoverRisk> {
    let current_end = current_end?;
    let next = next?;

    let gap_minutes = (next.interval.start_at() - current_end.at).num_minutes();
    if gap_minutes >= config.risk_lookahead_minutes {
        return None;
    }

    let level = if gap_minutes <= 0 || gap_minutes < config.buffer_minutes {
        RiskLevel::High
    } else if gap_minutes < 2 * config.buffer_minutes {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    Some(TurnoverRisk {
        table_id: next.table_id.clone(),
        current_end,
        next_reservation: next.id.clone(),
        next_start: next.interval.start_at(),
        gap_minutes,
        buffer_minutes: config.buffer_minutes,
        level,
    })
}
