//! Colony map: walkability, structures, loose goods on the ground
//!
//! The map is deliberately thin. The scheduling core only needs to know
//! where agents can walk, which tiles hold blueprints awaiting work, and
//! where loose goods are lying around for the auto-haul scan.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::items::{ItemInstance, MaterialRequirement, ResourceType};
use crate::core::types::TilePos;

/// Structures that can be designated as blueprints and built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    Wall,
    Floor,
    Door,
    SalvagersBench,
    Stove,
    Generator,
}

impl StructureKind {
    /// Construction work required to finish this structure
    pub fn work_required(&self) -> f32 {
        match self {
            StructureKind::Wall => 100.0,
            StructureKind::Floor => 40.0,
            StructureKind::Door => 80.0,
            StructureKind::SalvagersBench => 150.0,
            StructureKind::Stove => 120.0,
            StructureKind::Generator => 200.0,
        }
    }

    /// Bill of materials consumed when construction completes
    pub fn materials(&self) -> Vec<MaterialRequirement> {
        match self {
            StructureKind::Wall => vec![MaterialRequirement::resource(ResourceType::Wood, 2)],
            StructureKind::Floor => vec![MaterialRequirement::resource(ResourceType::Wood, 1)],
            StructureKind::Door => vec![
                MaterialRequirement::resource(ResourceType::Wood, 2),
                MaterialRequirement::resource(ResourceType::Scrap, 1),
            ],
            StructureKind::SalvagersBench => vec![
                MaterialRequirement::resource(ResourceType::Wood, 3),
                MaterialRequirement::resource(ResourceType::Metal, 2),
            ],
            StructureKind::Stove => vec![
                MaterialRequirement::resource(ResourceType::Stone, 2),
                MaterialRequirement::resource(ResourceType::Metal, 1),
            ],
            StructureKind::Generator => vec![
                MaterialRequirement::resource(ResourceType::Metal, 4),
                MaterialRequirement::resource(ResourceType::Scrap, 2),
            ],
        }
    }

    /// Finished walls block movement; everything else stays walkable
    pub fn blocks_movement(&self) -> bool {
        matches!(self, StructureKind::Wall)
    }

    /// True for structures that execute crafting recipes
    pub fn is_workstation(&self) -> bool {
        matches!(self, StructureKind::SalvagersBench | StructureKind::Stove)
    }
}

/// A designated or finished structure on a tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    pub pos: TilePos,
    pub kind: StructureKind,
    pub built: bool,
}

/// A loose stack of one fungible resource lying on the ground
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundPile {
    pub pos: TilePos,
    pub resource: ResourceType,
    pub amount: u32,
}

/// A discrete item lying on the ground
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LooseItem {
    pub pos: TilePos,
    pub item: ItemInstance,
}

/// The colony map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldMap {
    pub width: i32,
    pub height: i32,
    blocked: AHashSet<TilePos>,
    pub structures: Vec<Structure>,
    pub piles: Vec<GroundPile>,
    pub loose_items: Vec<LooseItem>,
}

impl WorldMap {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            blocked: AHashSet::new(),
            structures: Vec::new(),
            piles: Vec::new(),
            loose_items: Vec::new(),
        }
    }

    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    pub fn is_walkable(&self, pos: TilePos) -> bool {
        self.in_bounds(pos) && !self.blocked.contains(&pos)
    }

    pub fn set_blocked(&mut self, pos: TilePos, blocked: bool) {
        if blocked {
            self.blocked.insert(pos);
        } else {
            self.blocked.remove(&pos);
        }
    }

    // --- Structures ---

    pub fn place_blueprint(&mut self, pos: TilePos, kind: StructureKind) {
        self.structures.push(Structure {
            pos,
            kind,
            built: false,
        });
    }

    pub fn structure_at(&self, pos: TilePos) -> Option<&Structure> {
        self.structures.iter().find(|s| s.pos == pos)
    }

    /// Mark the blueprint at `pos` finished, updating walkability
    pub fn finish_structure(&mut self, pos: TilePos) -> bool {
        let mut blocks = None;
        for s in &mut self.structures {
            if s.pos == pos && !s.built {
                s.built = true;
                blocks = Some(s.kind.blocks_movement());
                break;
            }
        }
        match blocks {
            Some(true) => {
                self.blocked.insert(pos);
                true
            }
            Some(false) => true,
            None => false,
        }
    }

    /// Remove a structure or blueprint (operator demolition)
    pub fn demolish(&mut self, pos: TilePos) -> Option<Structure> {
        let idx = self.structures.iter().position(|s| s.pos == pos)?;
        let s = self.structures.swap_remove(idx);
        if s.built && s.kind.blocks_movement() {
            self.blocked.remove(&pos);
        }
        Some(s)
    }

    /// Finished workstations of the given kind
    pub fn workstations(&self, kind: StructureKind) -> impl Iterator<Item = &Structure> + '_ {
        self.structures
            .iter()
            .filter(move |s| s.built && s.kind == kind)
    }

    // --- Ground goods ---

    /// Drop a resource stack on the ground, merging with an existing pile
    /// of the same type on the tile.
    pub fn drop_resource(&mut self, pos: TilePos, resource: ResourceType, amount: u32) {
        if amount == 0 {
            return;
        }
        for pile in &mut self.piles {
            if pile.pos == pos && pile.resource == resource {
                pile.amount += amount;
                return;
            }
        }
        self.piles.push(GroundPile {
            pos,
            resource,
            amount,
        });
    }

    pub fn pile_at(&self, pos: TilePos) -> Option<&GroundPile> {
        self.piles.iter().find(|p| p.pos == pos)
    }

    /// Take up to `amount` from the pile at `pos`, removing it when drained
    pub fn take_pile(&mut self, pos: TilePos, amount: u32) -> Option<(ResourceType, u32)> {
        let idx = self.piles.iter().position(|p| p.pos == pos)?;
        let pile = &mut self.piles[idx];
        let taken = amount.min(pile.amount);
        pile.amount -= taken;
        let resource = pile.resource;
        if pile.amount == 0 {
            self.piles.swap_remove(idx);
        }
        if taken == 0 {
            None
        } else {
            Some((resource, taken))
        }
    }

    pub fn drop_item(&mut self, pos: TilePos, item: ItemInstance) {
        self.loose_items.push(LooseItem { pos, item });
    }

    /// Take one specific item off the tile
    pub fn take_item_by_id(
        &mut self,
        pos: TilePos,
        id: crate::core::types::ItemId,
    ) -> Option<ItemInstance> {
        let idx = self
            .loose_items
            .iter()
            .position(|l| l.pos == pos && l.item.id == id)?;
        Some(self.loose_items.swap_remove(idx).item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walkability_and_bounds() {
        let mut map = WorldMap::new(10, 10);
        let pos = TilePos::new(3, 3, 0);
        assert!(map.is_walkable(pos));
        assert!(!map.is_walkable(TilePos::new(-1, 0, 0)));
        assert!(!map.is_walkable(TilePos::new(10, 0, 0)));

        map.set_blocked(pos, true);
        assert!(!map.is_walkable(pos));
        map.set_blocked(pos, false);
        assert!(map.is_walkable(pos));
    }

    #[test]
    fn test_finish_wall_blocks_tile() {
        let mut map = WorldMap::new(10, 10);
        let pos = TilePos::new(2, 2, 0);
        map.place_blueprint(pos, StructureKind::Wall);
        // Blueprint alone does not block
        assert!(map.is_walkable(pos));

        assert!(map.finish_structure(pos));
        assert!(!map.is_walkable(pos));
        assert!(map.structure_at(pos).unwrap().built);
    }

    #[test]
    fn test_demolish_restores_walkability() {
        let mut map = WorldMap::new(10, 10);
        let pos = TilePos::new(2, 2, 0);
        map.place_blueprint(pos, StructureKind::Wall);
        map.finish_structure(pos);
        assert!(!map.is_walkable(pos));

        let s = map.demolish(pos).expect("structure removed");
        assert_eq!(s.kind, StructureKind::Wall);
        assert!(map.is_walkable(pos));
    }

    #[test]
    fn test_ground_piles_merge_and_drain() {
        let mut map = WorldMap::new(10, 10);
        let pos = TilePos::new(1, 1, 0);
        map.drop_resource(pos, ResourceType::Wood, 3);
        map.drop_resource(pos, ResourceType::Wood, 2);
        assert_eq!(map.pile_at(pos).unwrap().amount, 5);

        let (res, taken) = map.take_pile(pos, 10).unwrap();
        assert_eq!(res, ResourceType::Wood);
        assert_eq!(taken, 5);
        assert!(map.pile_at(pos).is_none());
    }
}
