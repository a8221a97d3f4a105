//! Core occupancy engine for the venue floor.
//!
//! This crate contains the fundamental types and logic for:
//! - Intervals: venue-local, half-open booking slots
//! - Session resolution: collapsing duplicate check-ins to one occupant
//! - Conflict detection: double-booked reservation pairs per table
//! - Turnover risk: projected occupancy end versus the next booking
//! - Aggregation: the per-table board for a whole venue and day
//!
//! Everything here is pure and synchronous. The engine never reads the
//! clock or touches storage; callers pass `now` and a prefetched snapshot.

pub mod aggregate;
pub mod conflict;
pub mod interval;
pub mod reservation;
pub mod risk;
pub mod session;
pub mod table;
pub mod types;

pub use aggregate::{AggregateError, OccupancyBoard, TableStatus, VenueSnapshot, aggregate};
pub use conflict::{Conflict, ConflictError, ConflictSeverity, detect_conflicts};
pub use interval::{Interval, IntervalError, format_minutes};
pub use reservation::{Reservation, ReservationStatus};
pub use risk::{
    EndBasis, OccupancyEnd, RiskLevel, TurnoverRisk, VenueConfig, estimate_session_end,
    evaluate_risk,
};
pub use session::{LiveSession, ResolveError, ResolvedOccupant, resolve};
pub use table::Table;
pub use types::{GameId, ReservationId, SessionId, TableId, ValidationError, VenueId};
