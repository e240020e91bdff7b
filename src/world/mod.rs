//! World layer: map, harvest nodes, animals, and the pathfinding seam

pub mod animals;
pub mod map;
pub mod nodes;
pub mod pathfinding;

use serde::{Deserialize, Serialize};

use crate::core::types::{AnimalId, TilePos};

pub use animals::{Animal, AnimalSpecies};
pub use map::{GroundPile, LooseItem, Structure, StructureKind, WorldMap};
pub use nodes::{HarvestNode, NodeKind};
pub use pathfinding::{GridPathfinder, Pathfinder, RouteResult};

/// Everything physical outside the stockpile substrate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub map: WorldMap,
    pub nodes: Vec<HarvestNode>,
    pub animals: Vec<Animal>,
}

impl World {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            map: WorldMap::new(width, height),
            nodes: Vec::new(),
            animals: Vec::new(),
        }
    }

    pub fn spawn_node(&mut self, pos: TilePos, kind: NodeKind, capacity: u32) {
        self.nodes.push(HarvestNode::new(pos, kind, capacity));
    }

    pub fn node_at(&self, pos: TilePos) -> Option<&HarvestNode> {
        self.nodes.iter().find(|n| n.pos == pos)
    }

    pub fn node_at_mut(&mut self, pos: TilePos) -> Option<&mut HarvestNode> {
        self.nodes.iter_mut().find(|n| n.pos == pos)
    }

    pub fn spawn_animal(&mut self, species: AnimalSpecies, pos: TilePos) -> AnimalId {
        let animal = Animal::new(species, pos);
        let id = animal.id;
        self.animals.push(animal);
        id
    }

    pub fn animal(&self, id: AnimalId) -> Option<&Animal> {
        self.animals.iter().find(|a| a.id == id)
    }

    pub fn animal_mut(&mut self, id: AnimalId) -> Option<&mut Animal> {
        self.animals.iter_mut().find(|a| a.id == id)
    }
}
