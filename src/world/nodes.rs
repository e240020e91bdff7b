//! Harvest nodes: finite or regenerating sources of raw resources
//!
//! A node yields its resource as harvest work completes. Trees and crops
//! regenerate slowly; salvage heaps are finite and convert to a depleted
//! husk once stripped.

use serde::{Deserialize, Serialize};

use crate::items::ResourceType;
use crate::core::types::TilePos;

/// What kind of node occupies the tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Tree,
    Rock,
    CropPatch,
    SalvageHeap,
}

impl NodeKind {
    pub fn resource(&self) -> ResourceType {
        match self {
            NodeKind::Tree => ResourceType::Wood,
            NodeKind::Rock => ResourceType::Stone,
            NodeKind::CropPatch => ResourceType::RawFood,
            NodeKind::SalvageHeap => ResourceType::Scrap,
        }
    }

    /// Harvest work per yield cycle
    pub fn work_required(&self) -> f32 {
        match self {
            NodeKind::Tree => 60.0,
            NodeKind::Rock => 90.0,
            NodeKind::CropPatch => 40.0,
            NodeKind::SalvageHeap => 80.0,
        }
    }

    /// Units produced per completed harvest
    pub fn yield_per_harvest(&self) -> u32 {
        match self {
            NodeKind::Tree => 4,
            NodeKind::Rock => 3,
            NodeKind::CropPatch => 5,
            NodeKind::SalvageHeap => 6,
        }
    }

    /// Units regenerated per tick; zero means finite
    pub fn regen_rate(&self) -> f32 {
        match self {
            NodeKind::Tree => 0.002,
            NodeKind::CropPatch => 0.004,
            NodeKind::Rock | NodeKind::SalvageHeap => 0.0,
        }
    }
}

/// A harvestable node anchored to a tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestNode {
    pub pos: TilePos,
    pub kind: NodeKind,
    pub remaining: f32,
    pub max: f32,
    /// Fractional regeneration carry-over
    regen_accum: f32,
    pub depleted: bool,
}

impl HarvestNode {
    pub fn new(pos: TilePos, kind: NodeKind, capacity: u32) -> Self {
        Self {
            pos,
            kind,
            remaining: capacity as f32,
            max: capacity as f32,
            regen_accum: 0.0,
            depleted: false,
        }
    }

    /// Withdraw up to one harvest's yield; returns units actually produced.
    /// Marks the node depleted when a finite node runs dry.
    pub fn harvest(&mut self) -> u32 {
        let want = self.kind.yield_per_harvest() as f32;
        let taken = want.min(self.remaining);
        self.remaining -= taken;
        if self.remaining < 1.0 && self.kind.regen_rate() == 0.0 {
            self.depleted = true;
        }
        taken as u32
    }

    /// Regenerate toward max. Depleted finite nodes stay depleted.
    pub fn regenerate(&mut self) {
        if self.depleted {
            return;
        }
        self.regen_accum += self.kind.regen_rate();
        if self.regen_accum >= 1.0 {
            let whole = self.regen_accum.floor();
            self.remaining = (self.remaining + whole).min(self.max);
            self.regen_accum -= whole;
        }
    }

    pub fn has_yield(&self) -> bool {
        !self.depleted && self.remaining >= 1.0
    }
}
