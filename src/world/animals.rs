//! Animals: mobile hunt targets
//!
//! Animals wander, flee when wounded, and drop meat on death. Only the
//! pieces the scheduling core interacts with are modeled here.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{AnimalId, TilePos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimalSpecies {
    Rat,
    Boar,
    Deer,
}

impl AnimalSpecies {
    pub fn max_health(&self) -> f32 {
        match self {
            AnimalSpecies::Rat => 20.0,
            AnimalSpecies::Boar => 60.0,
            AnimalSpecies::Deer => 45.0,
        }
    }

    /// Meat units dropped on death
    pub fn meat_yield(&self) -> u32 {
        match self {
            AnimalSpecies::Rat => 1,
            AnimalSpecies::Boar => 4,
            AnimalSpecies::Deer => 3,
        }
    }

    /// Chance per tick that a wounded animal bolts out of reach
    pub fn flee_chance(&self) -> f64 {
        match self {
            AnimalSpecies::Rat => 0.02,
            AnimalSpecies::Boar => 0.002,
            AnimalSpecies::Deer => 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animal {
    pub id: AnimalId,
    pub species: AnimalSpecies,
    pub pos: TilePos,
    pub health: f32,
    /// Marked by the operator; hunt jobs are only spawned for marked animals
    pub marked_for_hunt: bool,
    pub alive: bool,
    /// A fled animal is out of range and its hunt job becomes invalid
    pub fled: bool,
}

impl Animal {
    pub fn new(species: AnimalSpecies, pos: TilePos) -> Self {
        Self {
            id: AnimalId::new(),
            species,
            pos,
            health: species.max_health(),
            marked_for_hunt: false,
            alive: true,
            fled: false,
        }
    }

    pub fn is_valid_target(&self) -> bool {
        self.alive && !self.fled
    }

    /// Apply hunt damage; returns true if this killed the animal
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.alive {
            return false;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.alive = false;
            true
        } else {
            false
        }
    }

    /// Per-tick behavior: wounded animals may flee
    pub fn tick(&mut self, rng: &mut impl Rng) {
        if !self.alive || self.fled {
            return;
        }
        if self.health < self.species.max_health() && rng.gen_bool(self.species.flee_chance()) {
            self.fled = true;
        }
    }
}
