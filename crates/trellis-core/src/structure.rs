//! The fixed shape of a triangle.
//!
//! A triangle has four levels holding 1, 2, 4 and 8 slots. Every slot has a
//! canonical key; the key of a level-`n` slot names the branch it hangs from
//! (`B1C2` is the second level-3 child under the first level-2 slot).
//!
//! Canonical fill order is ascending `(level, index)`: top first, then
//! left-to-right within each level. [`PositionKey`] derives `Ord` in exactly
//! that order, so sorting keys sorts slots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of slots in every triangle.
pub const SLOT_COUNT: usize = 15;

/// Number of levels in every triangle.
pub const LEVELS: u8 = 4;

/// Canonical label of one of the 15 slots.
///
/// Variants are declared in canonical fill order.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PositionKey {
    A,
    AB1,
    AB2,
    B1C1,
    B1C2,
    B2C1,
    B2C2,
    C1D1,
    C1D2,
    C2D1,
    C2D2,
    C3D1,
    C3D2,
    C4D1,
    C4D2,
}

impl PositionKey {
    /// All keys in canonical fill order.
    pub const ALL: [PositionKey; SLOT_COUNT] = [
        Self::A,
        Self::AB1,
        Self::AB2,
        Self::B1C1,
        Self::B1C2,
        Self::B2C1,
        Self::B2C2,
        Self::C1D1,
        Self::C1D2,
        Self::C2D1,
        Self::C2D2,
        Self::C3D1,
        Self::C3D2,
        Self::C4D1,
        Self::C4D2,
    ];

    /// Position of this key in the canonical fill order (0..15).
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Key at a given fill-order position.
    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    /// Level of the slot, 1 (top) through 4.
    pub fn level(self) -> u8 {
        // Level n starts at ordinal 2^(n-1) - 1.
        (usize::BITS - (self.ordinal() + 1).leading_zeros()) as u8
    }

    /// 0-based index of the slot within its level.
    pub fn index(self) -> u8 {
        (self.ordinal() + 1 - (1 << (self.level() - 1))) as u8
    }

    /// Key at `(level, index)`, if that slot exists.
    pub fn at(level: u8, index: u8) -> Option<Self> {
        if level == 0 || level > LEVELS || index >= level_size(level) {
            return None;
        }
        Self::from_ordinal((1usize << (level - 1)) - 1 + index as usize)
    }

    /// Canonical label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AB1 => "AB1",
            Self::AB2 => "AB2",
            Self::B1C1 => "B1C1",
            Self::B1C2 => "B1C2",
            Self::B2C1 => "B2C1",
            Self::B2C2 => "B2C2",
            Self::C1D1 => "C1D1",
            Self::C1D2 => "C1D2",
            Self::C2D1 => "C2D1",
            Self::C2D2 => "C2D2",
            Self::C3D1 => "C3D1",
            Self::C3D2 => "C3D2",
            Self::C4D1 => "C4D1",
            Self::C4D2 => "C4D2",
        }
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionKey {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| crate::Error::InvalidInput(format!("unknown position key {s:?}")))
    }
}

/// Number of slots on a level (1, 2, 4, 8); zero outside 1..=4.
pub fn level_size(level: u8) -> u8 {
    match level {
        1..=LEVELS => 1 << (level - 1),
        _ => 0,
    }
}

/// One row of the structure table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub level: u8,
    pub index: u8,
    pub key: PositionKey,
}

/// The 15 `(level, index, key)` triples in canonical fill order.
pub fn fill_order() -> impl Iterator<Item = Slot> {
    PositionKey::ALL.into_iter().map(|key| Slot {
        level: key.level(),
        index: key.index(),
        key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fifteen_distinct_keys() {
        let keys: HashSet<_> = fill_order().map(|s| s.key).collect();
        assert_eq!(keys.len(), SLOT_COUNT);
    }

    #[test]
    fn level_sizes() {
        for level in 1..=LEVELS {
            let count = fill_order().filter(|s| s.level == level).count();
            assert_eq!(count, level_size(level) as usize, "level {level}");
        }
        assert_eq!(level_size(0), 0);
        assert_eq!(level_size(5), 0);
    }

    #[test]
    fn fill_order_is_level_then_index() {
        let slots: Vec<_> = fill_order().map(|s| (s.level, s.index)).collect();
        let mut sorted = slots.clone();
        sorted.sort();
        assert_eq!(slots, sorted);
        assert_eq!(slots[0], (1, 0));
        assert_eq!(slots[14], (4, 7));
    }

    #[test]
    fn known_coordinates() {
        assert_eq!((PositionKey::A.level(), PositionKey::A.index()), (1, 0));
        assert_eq!((PositionKey::AB2.level(), PositionKey::AB2.index()), (2, 1));
        assert_eq!((PositionKey::B2C1.level(), PositionKey::B2C1.index()), (3, 2));
        assert_eq!((PositionKey::C3D1.level(), PositionKey::C3D1.index()), (4, 4));
        assert_eq!(PositionKey::at(3, 1), Some(PositionKey::B1C2));
        assert_eq!(PositionKey::at(2, 2), None);
        assert_eq!(PositionKey::at(0, 0), None);
    }

    #[test]
    fn parse_labels() {
        for key in PositionKey::ALL {
            assert_eq!(key.as_str().parse::<PositionKey>().unwrap(), key);
        }
        assert!("AB3".parse::<PositionKey>().is_err());
    }
}
