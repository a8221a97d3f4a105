//! Venue-local time intervals.
//!
//! Reservations and occupancy windows are wall-clock slots on a single
//! calendar day (`date` + `start` + `end`), never UTC instants; storing an
//! instant would shift a 19:00 booking when the venue's offset changes.
//! Intervals are half-open (`start` inclusive, `end` exclusive): two slots
//! that touch at an endpoint do not overlap.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing an [`Interval`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IntervalError {
    /// The interval would be empty or run backwards.
    #[error("interval must end after it starts, got {start}..{end}")]
    EmptyOrInverted { start: NaiveTime, end: NaiveTime },
}

/// A venue-local time slot on one calendar day.
///
/// Immutable once constructed; [`Interval::new`] is the only way in, and it
/// rejects `end <= start`. Open-ended occupancy ("guest still here") is not
/// an `Interval`; live sessions model that separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInterval", into = "RawInterval")]
pub struct Interval {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

/// Unvalidated wire shape for [`Interval`] serde.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawInterval {
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

impl TryFrom<RawInterval> for Interval {
    type Error = IntervalError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::new(raw.date, raw.start, raw.end)
    }
}

impl From<Interval> for RawInterval {
    fn from(interval: Interval) -> Self {
        Self {
            date: interval.date,
            start: interval.start,
            end: interval.end,
        }
    }
}

impl Interval {
    /// Creates an interval, rejecting empty or inverted bounds.
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Result<Self, IntervalError> {
        if end <= start {
            return Err(IntervalError::EmptyOrInverted { start, end });
        }
        Ok(Self { date, start, end })
    }

    /// The calendar day this slot belongs to.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Start of the slot (inclusive).
    #[must_use]
    pub const fn start(&self) -> NaiveTime {
        self.start
    }

    /// End of the slot (exclusive).
    #[must_use]
    pub const fn end(&self) -> NaiveTime {
        self.end
    }

    /// Start as a venue-local datetime.
    #[must_use]
    pub fn start_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start)
    }

    /// End as a venue-local datetime.
    #[must_use]
    pub fn end_at(&self) -> NaiveDateTime {
        self.date.and_time(self.end)
    }

    /// Length of the slot in whole minutes.
    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether the given instant falls inside the slot (half-open).
    #[must_use]
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start_at() <= at && at < self.end_at()
    }

    /// Whether two slots strictly overlap.
    ///
    /// Touching endpoints (`a.end == b.start`) is not overlap; back-to-back
    /// bookings are legal and governed by turnover buffers instead.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.date == other.date && self.start < other.end && other.start < self.end
    }

    /// Overlap between two slots in minutes, 0 when disjoint.
    ///
    /// A strictly positive overlap shorter than a minute still reports 1:
    /// any real overlap is a double-booking and must never round down to
    /// "0 minutes".
    #[must_use]
    pub fn overlap_minutes(&self, other: &Self) -> i64 {
        if self.date != other.date {
            return 0;
        }
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if end <= start {
            return 0;
        }
        // `i64::div_ceil` is feature-gated on this toolchain; the overlap is
        // strictly positive here, so ceiling division is `(secs + 59) / 60`.
        ((end - start).num_seconds() + 59) / 60
    }

    /// Whether two slots share exactly one endpoint on the same day.
    #[must_use]
    pub fn abuts(&self, other: &Self) -> bool {
        self.date == other.date && (self.end == other.start || other.end == self.start)
    }
}

/// Formats a minute count as a duration string.
///
/// Returns "Xh Ym" at an hour or more, "Xm" below. Negative input renders
/// as 0m.
#[must_use]
pub fn format_minutes(minutes: i64) -> String {
    if minutes < 0 {
        return "0m".to_string();
    }
    let hours = minutes / 60;
    let rest = minutes % 60;

    if hours >= 1 {
        format!("{hours}h {rest}m")
    } else {
        format!("{rest}m")
    }
}
