//! Triangle and position records.

use super::{PlanType, PositionId, TriangleId, UserId};
use crate::structure::{PositionKey, SLOT_COUNT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One instance of the 15-slot structure.
///
/// Lives from creation until it is cycled, then is hard-deleted together with
/// its positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Triangle {
    pub id: TriangleId,
    pub plan_type: PlanType,
    /// Set once, when the last slot is filled
    pub is_complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub payout_processed: bool,
    pub created_at: DateTime<Utc>,
    /// Store-assigned creation sequence
    pub seq: u64,
}

/// One slot of a triangle.
///
/// `level`, `index` and `key` are fixed at creation; only the occupant changes,
/// and only from empty to a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub triangle_id: TriangleId,
    pub level: u8,
    pub index: u8,
    pub position_key: PositionKey,
    pub occupant_id: Option<UserId>,
    /// Creation sequence; positions of one triangle share its creation and are
    /// ordered by fill order within it
    pub seq: u64,
}

impl Position {
    /// Empty slot for `key` in a triangle created at `triangle_seq`.
    pub fn empty(triangle_id: TriangleId, triangle_seq: u64, key: PositionKey) -> Self {
        Self {
            triangle_id,
            level: key.level(),
            index: key.index(),
            position_key: key,
            occupant_id: None,
            seq: triangle_seq * SLOT_COUNT as u64 + key.ordinal() as u64,
        }
    }

    pub fn id(&self) -> PositionId {
        PositionId::new(self.triangle_id, self.position_key)
    }

    pub fn is_open(&self) -> bool {
        self.occupant_id.is_none()
    }
}

/// A user's current triangle as shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriangleInfo {
    pub triangle: Triangle,
    pub user_position: Position,
    /// Rounded share of filled slots, 0-100
    pub completion_percent: u8,
    pub filled_count: usize,
}

impl TriangleInfo {
    pub fn completion_percent(filled: usize) -> u8 {
        ((filled.min(SLOT_COUNT) * 100 + SLOT_COUNT / 2) / SLOT_COUNT) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_position_coordinates() {
        let t = TriangleId::new();
        let p = Position::empty(t, 3, PositionKey::B2C2);
        assert_eq!((p.level, p.index), (3, 3));
        assert!(p.is_open());
        assert_eq!(p.id(), PositionId::new(t, PositionKey::B2C2));
        assert_eq!(p.seq, 3 * 15 + 6);
    }

    #[test]
    fn completion_percent_rounds() {
        assert_eq!(TriangleInfo::completion_percent(0), 0);
        assert_eq!(TriangleInfo::completion_percent(1), 7);
        assert_eq!(TriangleInfo::completion_percent(7), 47);
        assert_eq!(TriangleInfo::completion_percent(8), 53);
        assert_eq!(TriangleInfo::completion_percent(15), 100);
    }
}
