//! Live guest sessions and occupancy resolution.
//!
//! Check-in writes are not fenced: a double tap or a client retry can
//! leave more than one "active" row for the same table. The resolver
//! collapses those rows at read time with a deterministic total order, so
//! every caller sees the same single occupant for the same input.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{GameId, SessionId, TableId};

/// One guest check-in at a table, venue-local timestamps.
///
/// A session is open-ended: it has no end time while active, and checkout
/// is handled by the storage layer. The engine only ever sees active rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LiveSession {
    /// Unique identifier.
    pub id: SessionId,

    /// The table the guests checked in at.
    pub table_id: TableId,

    /// The game currently on the table, once one is picked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<GameId>,

    /// When play actually started, if recorded separately from check-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<NaiveDateTime>,

    /// When the check-in row was created.
    pub created_at: NaiveDateTime,
}

impl LiveSession {
    /// Creates a browsing session (no game yet) checked in at `created_at`.
    pub fn new(id: SessionId, table_id: TableId, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            table_id,
            game_id: None,
            started_at: None,
            created_at,
        }
    }

    /// The moment this session has been live since: `started_at` when
    /// recorded, falling back to the row creation time.
    #[must_use]
    pub fn effective_since(&self) -> NaiveDateTime {
        self.started_at.unwrap_or(self.created_at)
    }

    /// Whether a game has been assigned.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.game_id.is_some()
    }
}

/// Precondition violations in [`resolve`] input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A session row belongs to a different table than the rest.
    #[error("session {session} belongs to table {found}, expected {expected}")]
    MixedTables {
        session: SessionId,
        expected: TableId,
        found: TableId,
    },
}

/// The single authoritative occupant of a table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedOccupant {
    /// The winning session.
    pub session: LiveSession,

    /// True when more than one active row existed for the table. A data
    /// quality signal for dashboards and alerting, not an engine error.
    pub has_duplicates: bool,

    /// IDs of the stale rows the winner superseded, in resolution order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superseded: Vec<SessionId>,
}

/// Total order over candidate occupants of one table.
///
/// A session with a game in play outranks a browsing row regardless of
/// timing; within a rank, the most recently live row wins; the session ID
/// settles exact timestamp ties so the order is total.
fn occupancy_order(a: &LiveSession, b: &LiveSession) -> Ordering {
    b.is_playing()
        .cmp(&a.is_playing())
        .then_with(|| b.effective_since().cmp(&a.effective_since()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Collapses the active session rows of one table to a single occupant.
///
/// All rows must belong to the same table; a stray row for another table is
/// rejected rather than silently dropped. Empty input means the table is
/// free of live sessions (reservations still apply independently).
///
/// Pure: any permutation of the same input yields the same occupant.
pub fn resolve(sessions: &[LiveSession]) -> Result<Option<ResolvedOccupant>, ResolveError> {
    let Some(first) = sessions.first() else {
        return Ok(None);
    };

    let table_id = &first.table_id;
    for session in sessions {
        if session.table_id != *table_id {
            return Err(ResolveError::MixedTables {
                session: session.id.clone(),
                expected: table_id.clone(),
                found: session.table_id.clone(),
            });
        }
    }

    let mut ordered: Vec<&LiveSession> = sessions.iter().collect();
    ordered.sort_by(|a, b| occupancy_order(a, b));

    let winner = ordered[0].clone();
    let superseded: Vec<SessionId> = ordered[1..].iter().map(|s| s.id.clone()).collect();

    if !superseded.is_empty() {
        tracing::warn!(
            table = %winner.table_id,
            kept = %winner.id,
            superseded = superseded.len(),
            "collapsed duplicate live sessions"
        );
    }

    Ok(Some(ResolvedOccupant {
        has_duplicates: !superseded.is_empty(),
        superseded,
        session: winner,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn browsing(id: &str, since: NaiveDateTime) -> LiveSession {
        LiveSession {
            id: SessionId::new(id).unwrap(),
            table_id: TableId::new("t-1").unwrap(),
            game_id: None,
            started_at: Some(since),
            created_at: since,
        }
    }

    fn playing(id: &str, since: NaiveDateTime) -> LiveSession {
        LiveSession {
            game_id: Some(GameId::new("gloomhaven").unwrap()),
            ..browsing(id, since)
        }
    }

    #[test]
    fn empty_input_means_free_table() {
        assert_eq!(resolve(&[]).unwrap(), None);
    }

    #[test]
    fn single_session_wins_without_duplicate_flag() {
        let session = browsing("sess-a", at(18, 0));
        let occupant = resolve(std::slice::from_ref(&session)).unwrap().unwrap();

        assert_eq!(occupant.session, session);
        assert!(!occupant.has_duplicates);
        assert!(occupant.superseded.is_empty());
    }

    #[test]
    fn playing_beats_browsing_regardless_of_timing() {
        // The browsing row is newer, but the table demonstrably has a game
        // in play - that row is the occupant.
        let older_playing = playing("sess-a", at(17, 0));
        let newer_browsing = browsing("sess-b", at(19, 0));

        let occupant = resolve(&[newer_browsing, older_playing.clone()])
            .unwrap()
            .unwrap();
        assert_eq!(occupant.session, older_playing);
        assert!(occupant.has_duplicates);
    }

    #[test]
    fn latest_browsing_row_supersedes_stale_duplicate() {
        let stale = browsing("sess-a", at(18, 0));
        let fresh = browsing("sess-b", at(18, 5));

        let occupant = resolve(&[stale, fresh.clone()]).unwrap().unwrap();
        assert_eq!(occupant.session, fresh);
        assert_eq!(occupant.superseded, vec![SessionId::new("sess-a").unwrap()]);
    }

    #[test]
    fn started_at_falls_back_to_created_at() {
        let mut implicit = browsing("sess-a", at(18, 0));
        implicit.started_at = None;
        let explicit = browsing("sess-b", at(17, 0));

        // sess-a has no started_at; its created_at (18:00) is later than
        // sess-b's started_at (17:00), so sess-a wins.
        let occupant = resolve(&[explicit, implicit.clone()]).unwrap().unwrap();
        assert_eq!(occupant.session, implicit);
    }

    #[test]
    fn identical_timestamps_fall_back_to_session_id() {
        let a = browsing("sess-a", at(18, 0));
        let b = browsing("sess-b", at(18, 0));

        let forward = resolve(&[a.clone(), b.clone()]).unwrap().unwrap();
        let reverse = resolve(&[b, a.clone()]).unwrap().unwrap();

        assert_eq!(forward.session, a);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn resolution_is_permutation_independent() {
        let sessions = [
            browsing("sess-a", at(18, 0)),
            playing("sess-b", at(17, 30)),
            browsing("sess-c", at(18, 10)),
        ];
        let orders: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];

        let baseline = resolve(&sessions).unwrap().unwrap();
        for order in orders {
            let permuted: Vec<LiveSession> =
                order.iter().map(|&i| sessions[i].clone()).collect();
            let occupant = resolve(&permuted).unwrap().unwrap();
            assert_eq!(occupant.session, baseline.session);
            assert_eq!(occupant.has_duplicates, baseline.has_duplicates);
        }
    }

    #[test]
    fn superseded_lists_all_losers_deterministically() {
        let sessions = [
            browsing("sess-a", at(18, 0)),
            playing("sess-b", at(17, 30)),
            browsing("sess-c", at(18, 10)),
        ];

        let occupant = resolve(&sessions).unwrap().unwrap();
        assert_eq!(occupant.session.id, SessionId::new("sess-b").unwrap());
        // Losers follow the same total order: newest browsing row first.
        assert_eq!(
            occupant.superseded,
            vec![
                SessionId::new("sess-c").unwrap(),
                SessionId::new("sess-a").unwrap(),
            ]
        );
    }

    #[test]
    fn stray_row_for_another_table_is_rejected() {
        let ours = browsing("sess-a", at(18, 0));
        let mut theirs = browsing("sess-b", at(18, 5));
        theirs.table_id = TableId::new("t-2").unwrap();

        let err = resolve(&[ours, theirs]).unwrap_err();
        assert_eq!(
            err,
            ResolveError::MixedTables {
                session: SessionId::new("sess-b").unwrap(),
                expected: TableId::new("t-1").unwrap(),
                found: TableId::new("t-2").unwrap(),
            }
        );
    }

    #[test]
    fn two_playing_rows_tie_break_on_recency() {
        let first = playing("sess-a", at(17, 0));
        let second = playing("sess-b", at(17, 45));

        let occupant = resolve(&[first, second.clone()]).unwrap().unwrap();
        assert_eq!(occupant.session, second);
    }
}
