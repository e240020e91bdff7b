//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for colonists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for animals (hunt targets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimalId(pub Uuid);

impl AnimalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Unique identifier for stockpile zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

/// Unique identifier for reservations, issued sequentially by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub u64);

/// Unique identifier for discrete item instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Distance penalty applied when comparing tiles on different levels
pub const Z_MISMATCH_PENALTY: u32 = 100;

/// Tile position on the colony grid, z is the level (0 = ground)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TilePos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Manhattan distance on the same level; z mismatch adds a flat penalty
    /// since colonists cannot route between levels.
    pub fn manhattan(&self, other: &Self) -> u32 {
        let d = (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs();
        if self.z == other.z {
            d
        } else {
            d + Z_MISMATCH_PENALTY
        }
    }

    /// True when `other` is this tile or one of its four neighbors on the
    /// same level. Hauling drop-off and hunting use this interaction range.
    pub fn is_adjacent(&self, other: &Self) -> bool {
        self.z == other.z && (self.x - other.x).abs() + (self.y - other.y).abs() <= 1
    }

    /// Four cardinal neighbors on the same level
    pub fn neighbors(&self) -> [TilePos; 4] {
        [
            TilePos::new(self.x + 1, self.y, self.z),
            TilePos::new(self.x - 1, self.y, self.z),
            TilePos::new(self.x, self.y + 1, self.z),
            TilePos::new(self.x, self.y - 1, self.z),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_same_level() {
        let a = TilePos::new(1, 2, 0);
        let b = TilePos::new(4, 6, 0);
        assert_eq!(a.manhattan(&b), 7);
        assert_eq!(b.manhattan(&a), 7);
    }

    #[test]
    fn test_manhattan_cross_level_penalty() {
        let a = TilePos::new(0, 0, 0);
        let b = TilePos::new(0, 0, 1);
        assert_eq!(a.manhattan(&b), Z_MISMATCH_PENALTY);
    }

    #[test]
    fn test_adjacency() {
        let a = TilePos::new(5, 5, 0);
        assert!(a.is_adjacent(&a));
        assert!(a.is_adjacent(&TilePos::new(5, 6, 0)));
        assert!(a.is_adjacent(&TilePos::new(4, 5, 0)));
        assert!(!a.is_adjacent(&TilePos::new(6, 6, 0)));
        assert!(!a.is_adjacent(&TilePos::new(5, 6, 1)));
    }

    #[test]
    fn test_id_equality() {
        let a = ZoneId(1);
        let b = ZoneId(1);
        assert_eq!(a, b);
        assert_ne!(a, ZoneId(2));

        let j = JobId::new();
        assert_eq!(j, j);
        assert_ne!(j, JobId::new());
    }
}
