//! Venue floor tables.

use serde::{Deserialize, Serialize};

use crate::types::{TableId, VenueId};

/// A physical table on the venue floor.
///
/// Sessions and reservations reference tables by [`TableId`]; the table row
/// itself carries only identity and display data. Deactivated tables stay in
/// storage for history but drop off the occupancy board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Table {
    /// Unique identifier.
    pub id: TableId,

    /// The venue this table belongs to.
    pub venue_id: VenueId,

    /// Floor label shown to staff (e.g. "Window 2", "Big Round").
    pub label: String,

    /// Whether the table is currently part of the floor plan.
    pub is_active: bool,
}

impl Table {
    /// Creates an active table with the given label.
    pub fn new(id: TableId, venue_id: VenueId, label: impl Into<String>) -> Self {
        Self {
            id,
            venue_id,
            label: label.into(),
            is_active: true,
        }
    }
}
