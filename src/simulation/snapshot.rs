//! Snapshot and restore
//!
//! Captures everything the scheduler needs to resume deterministically:
//! the job pool (claims included), the reservation ledger, stockpile
//! contents, agent states, world state, and the tick counter. Static
//! catalogs (recipes, item defs) and tuning config are reattached on
//! restore rather than serialized.

use serde::{Deserialize, Serialize};

use crate::agents::Agent;
use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::items::ItemCatalog;
use crate::jobs::producers::CraftOrderQueue;
use crate::jobs::registry::JobRegistry;
use crate::recipes::RecipeCatalog;
use crate::simulation::colony::Colony;
use crate::storage::Stockpiles;
use crate::core::types::Tick;
use crate::world::World;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: Tick,
    pub seed: u64,
    pub world: World,
    pub stockpiles: Stockpiles,
    pub registry: JobRegistry,
    pub agents: Vec<Agent>,
    pub craft_orders: CraftOrderQueue,
}

impl Snapshot {
    pub fn capture(colony: &Colony) -> Self {
        Self {
            tick: colony.tick,
            seed: colony.seed,
            world: colony.world.clone(),
            stockpiles: colony.stockpiles.clone(),
            registry: colony.registry.clone(),
            agents: colony.agents.clone(),
            craft_orders: colony.craft_orders.clone(),
        }
    }

    pub fn restore(self, config: SimulationConfig) -> Colony {
        Colony {
            config,
            seed: self.seed,
            tick: self.tick,
            world: self.world,
            stockpiles: self.stockpiles,
            registry: self.registry,
            agents: self.agents,
            recipes: RecipeCatalog::with_defaults(),
            items: ItemCatalog::with_defaults(),
            craft_orders: self.craft_orders,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ResourceType;
    use crate::storage::StorageFilter;
    use crate::core::types::TilePos;

    #[test]
    fn test_json_round_trip_preserves_contents() {
        let mut colony = Colony::new(16, 16, SimulationConfig::default(), 9);
        colony.stockpiles.create_zone(
            "main",
            vec![TilePos::new(0, 0, 0)],
            StorageFilter::allow_all(),
        );
        colony
            .stockpiles
            .store_resource(TilePos::new(0, 0, 0), ResourceType::Scrap, 7)
            .unwrap();
        colony.spawn_agent(Agent::new("Vex", TilePos::new(3, 3, 0)));
        colony.craft_orders.add("cook_meal", 2);
        colony.tick = 17;

        let json = Snapshot::capture(&colony).to_json().unwrap();
        let restored = Snapshot::from_json(&json)
            .unwrap()
            .restore(SimulationConfig::default());

        assert_eq!(restored.tick, 17);
        assert_eq!(restored.seed, 9);
        assert_eq!(restored.agents.len(), 1);
        assert_eq!(restored.agents[0].name, "Vex");
        assert_eq!(
            restored.stockpiles.total_resource(ResourceType::Scrap),
            7
        );
        assert_eq!(restored.craft_orders.outstanding(), 2);
    }
}
