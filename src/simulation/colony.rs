//! The colony: owning container for all simulation state
//!
//! All mutation flows through the registry and stockpile APIs; the
//! colony itself only wires the services together and offers the
//! operator-level entry points (designations, orders, cancellation).

use crate::agents::Agent;
use crate::core::config::SimulationConfig;
use crate::items::ItemCatalog;
use crate::jobs::producers::CraftOrderQueue;
use crate::jobs::registry::JobRegistry;
use crate::recipes::RecipeCatalog;
use crate::storage::Stockpiles;
use crate::core::types::{AgentId, JobId, Tick, TilePos};
use crate::world::World;

pub struct Colony {
    pub config: SimulationConfig,
    /// Seed for the per-tick derived RNG; part of the snapshot so a
    /// restored colony makes identical decisions.
    pub seed: u64,
    pub tick: Tick,
    pub world: World,
    pub stockpiles: Stockpiles,
    pub registry: JobRegistry,
    pub agents: Vec<Agent>,
    pub recipes: RecipeCatalog,
    pub items: ItemCatalog,
    pub craft_orders: CraftOrderQueue,
}

impl Colony {
    pub fn new(width: i32, height: i32, config: SimulationConfig, seed: u64) -> Self {
        let stockpiles = Stockpiles::new(&config);
        Self {
            config,
            seed,
            tick: 0,
            world: World::new(width, height),
            stockpiles,
            registry: JobRegistry::new(),
            agents: Vec::new(),
            recipes: RecipeCatalog::with_defaults(),
            items: ItemCatalog::with_defaults(),
            craft_orders: CraftOrderQueue::new(),
        }
    }

    /// Agents update in spawn order every tick; that order is the claim
    /// race tie-break.
    pub fn spawn_agent(&mut self, agent: Agent) -> AgentId {
        let id = agent.id;
        self.agents.push(agent);
        id
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    /// Externally cancel a job (operator demolished a blueprint, cleared
    /// an order). Routes through the same cleanup as any abandonment:
    /// reservations settle, finished goods drop, the claimant notices its
    /// lost claim on its next step.
    pub fn cancel_job(&mut self, id: JobId) -> bool {
        let Some(job) = self.registry.remove(id) else {
            return false;
        };
        self.stockpiles.release_job(id);
        for (resource, amount) in &job.exec.pending_resources {
            self.world.map.drop_resource(job.target, *resource, *amount);
        }
        for item in &job.exec.pending_items {
            self.world.map.drop_item(job.target, item.clone());
        }
        tracing::info!(job = ?id, kind = %job.job_type, "job cancelled externally");
        true
    }

    /// Place a blueprint and designate its construction in one step.
    /// Double-designating a tile is refused rather than stacking jobs.
    pub fn designate_construction(
        &mut self,
        kind: crate::world::StructureKind,
        pos: TilePos,
        priority: f32,
    ) -> crate::core::error::Result<JobId> {
        if self.registry.has_build_at(pos) {
            return Err(crate::core::error::SimError::MalformedJob(format!(
                "tile {:?} already has a build designation",
                pos
            )));
        }
        self.world.map.place_blueprint(pos, kind);
        self.registry.designate_build(kind, pos, priority, self.tick)
    }

    /// Jobs currently stuck, per reason, for dashboards and tests
    pub fn blocked_jobs(&self) -> Vec<(crate::jobs::job::BlockReason, usize)> {
        self.registry.blocked_counts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::ResourceType;
    use crate::jobs::job::JobType;
    use crate::storage::StorageFilter;
    use crate::world::StructureKind;

    #[test]
    fn test_designate_construction_places_blueprint_and_job() {
        let mut colony = Colony::new(16, 16, SimulationConfig::default(), 1);
        let pos = TilePos::new(4, 4, 0);
        let id = colony
            .designate_construction(StructureKind::Wall, pos, 2.5)
            .unwrap();

        assert!(colony.world.map.structure_at(pos).is_some());
        let job = colony.registry.get(id).unwrap();
        assert_eq!(job.job_type, JobType::Build);
        assert_eq!(job.target, pos);
    }

    #[test]
    fn test_cancel_job_settles_reservations_and_drops_outputs() {
        let mut colony = Colony::new(16, 16, SimulationConfig::default(), 1);
        colony.stockpiles.create_zone(
            "main",
            vec![TilePos::new(0, 0, 0)],
            StorageFilter::allow_all(),
        );
        colony
            .stockpiles
            .store_resource(TilePos::new(0, 0, 0), ResourceType::Wood, 4)
            .unwrap();

        let pos = TilePos::new(4, 4, 0);
        let id = colony
            .designate_construction(StructureKind::Wall, pos, 2.5)
            .unwrap();

        // Simulate the engine having reserved inputs and produced output
        let slices = colony
            .stockpiles
            .find_and_reserve(
                &crate::items::ResourceKey::Resource(ResourceType::Wood),
                2,
                None,
                Some(id),
            )
            .unwrap();
        {
            let job = colony.registry.get_mut(id).unwrap();
            job.exec.reservations = slices.iter().map(|s| s.id).collect();
            job.exec.pending_resources.push((ResourceType::Stone, 3));
        }

        assert!(colony.cancel_job(id));
        assert!(colony.registry.get(id).is_none());
        // Reservation released, not committed
        assert_eq!(colony.stockpiles.total_resource(ResourceType::Wood), 4);
        assert_eq!(colony.stockpiles.ledger().held_count(), 0);
        // Pending output fell to the ground instead of vanishing
        assert_eq!(colony.world.map.pile_at(pos).unwrap().amount, 3);
    }
}
