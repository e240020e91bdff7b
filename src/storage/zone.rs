//! Stockpile zones, cells, and admission filters
//!
//! A zone is a named group of storage tiles sharing one filter. Each cell
//! holds either a bounded stack of one fungible resource or a bounded list
//! of discrete items; the two never mix on a tile.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::items::{ItemInstance, ResourceType};
use crate::core::types::{TilePos, ZoneId};

/// Per-zone admission filter
///
/// Resources are filtered by kind; discrete items are filtered by their
/// broad tag class (equipment, food). Untagged oddities are always
/// admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageFilter {
    pub allow_wood: bool,
    pub allow_stone: bool,
    pub allow_scrap: bool,
    pub allow_metal: bool,
    pub allow_power: bool,
    pub allow_raw_food: bool,
    pub allow_meals: bool,
    pub allow_equipment: bool,
}

impl Default for StorageFilter {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl StorageFilter {
    pub fn allow_all() -> Self {
        Self {
            allow_wood: true,
            allow_stone: true,
            allow_scrap: true,
            allow_metal: true,
            allow_power: true,
            allow_raw_food: true,
            allow_meals: true,
            allow_equipment: true,
        }
    }

    pub fn allows_resource(&self, resource: ResourceType) -> bool {
        match resource {
            ResourceType::Wood => self.allow_wood,
            ResourceType::Stone => self.allow_stone,
            ResourceType::Scrap => self.allow_scrap,
            ResourceType::Metal => self.allow_metal,
            ResourceType::Power => self.allow_power,
            ResourceType::RawFood => self.allow_raw_food,
            ResourceType::Meal => self.allow_meals,
        }
    }

    pub fn set_resource(&mut self, resource: ResourceType, allowed: bool) {
        match resource {
            ResourceType::Wood => self.allow_wood = allowed,
            ResourceType::Stone => self.allow_stone = allowed,
            ResourceType::Scrap => self.allow_scrap = allowed,
            ResourceType::Metal => self.allow_metal = allowed,
            ResourceType::Power => self.allow_power = allowed,
            ResourceType::RawFood => self.allow_raw_food = allowed,
            ResourceType::Meal => self.allow_meals = allowed,
        }
    }

    pub fn allows_item(&self, item: &ItemInstance) -> bool {
        if item.has_tag("equipment") {
            self.allow_equipment
        } else if item.has_tag("food") {
            self.allow_raw_food
        } else {
            true
        }
    }
}

/// A named storage area covering one or more cells
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub tiles: AHashSet<TilePos>,
    pub filter: StorageFilter,
}

impl Zone {
    pub fn contains(&self, pos: TilePos) -> bool {
        self.tiles.contains(&pos)
    }
}

/// What a cell currently holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellContents {
    Empty,
    Stack { resource: ResourceType, amount: u32 },
    Items(Vec<ItemInstance>),
}

impl CellContents {
    pub fn is_empty(&self) -> bool {
        match self {
            CellContents::Empty => true,
            CellContents::Stack { amount, .. } => *amount == 0,
            CellContents::Items(items) => items.is_empty(),
        }
    }
}

/// One storage tile with its contents and diagnostic flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub pos: TilePos,
    pub contents: CellContents,
    /// Contents violate the zone filter and no legal destination exists
    pub misplaced: bool,
}

impl Cell {
    pub fn new(pos: TilePos) -> Self {
        Self {
            pos,
            contents: CellContents::Empty,
            misplaced: false,
        }
    }
}

/// Why a store attempt was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The tile is not part of any stockpile zone
    NotStorage,
    /// The zone filter disallows the goods
    Filtered,
    /// Not enough capacity remains on the cell
    Full,
    /// The cell already holds a different kind of contents
    Mixed,
}
