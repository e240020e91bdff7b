//! Hunting engine
//!
//! The progress accumulator is replaced by a combat sub-step: the agent
//! chips the target's health down each tick within reach. Death drops
//! meat where the animal fell; the loose items then flow through the
//! ordinary auto-haul scan. A dead or fled target invalidates the job.

use crate::agents::Agent;
use crate::engines::{EngineCtx, Progress};
use crate::jobs::job::{BlockReason, Job, JobPayload};

pub fn advance(ctx: &mut EngineCtx, agent: &mut Agent, job: &mut Job, delta: f32) -> Progress {
    let animal_id = match &job.payload {
        JobPayload::Hunt { animal } => *animal,
        _ => return Progress::Blocked(BlockReason::InvalidTarget),
    };

    let damage = ctx.config.hunt_damage_per_tick;
    let (target_pos, valid) = match ctx.world.animal(animal_id) {
        Some(a) => (a.pos, a.is_valid_target()),
        None => return Progress::Blocked(BlockReason::InvalidTarget),
    };
    if !valid {
        return Progress::Blocked(BlockReason::InvalidTarget);
    }

    // The quarry may have moved since the route was planned
    if !agent.pos.is_adjacent(&target_pos) {
        return Progress::Travel(target_pos);
    }

    job.accumulated_progress += delta;
    let killed = match ctx.world.animal_mut(animal_id) {
        Some(a) => a.take_damage(damage),
        None => return Progress::Blocked(BlockReason::InvalidTarget),
    };
    if !killed {
        return Progress::Continuing;
    }

    // Drop the carcass as loose meat for haulers
    let (species, fell_at) = match ctx.world.animal(animal_id) {
        Some(a) => (a.species, a.pos),
        None => return Progress::Blocked(BlockReason::InvalidTarget),
    };
    for _ in 0..species.meat_yield() {
        if let Some(meat) = ctx.items.spawn("raw_meat") {
            ctx.world.map.drop_item(fell_at, meat);
        }
    }
    tracing::debug!(hunter = %agent.name, ?species, "quarry brought down");
    Progress::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::items::ItemCatalog;
    use crate::jobs::job::JobType;
    use crate::recipes::RecipeCatalog;
    use crate::storage::Stockpiles;
    use crate::core::types::TilePos;
    use crate::world::{AnimalSpecies, World};

    struct Fixture {
        world: World,
        stockpiles: Stockpiles,
        recipes: RecipeCatalog,
        items: ItemCatalog,
        config: SimulationConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let config = SimulationConfig::default();
            Self {
                world: World::new(16, 16),
                stockpiles: Stockpiles::new(&config),
                recipes: RecipeCatalog::with_defaults(),
                items: ItemCatalog::with_defaults(),
                config,
            }
        }

        fn ctx(&mut self) -> EngineCtx<'_> {
            EngineCtx {
                world: &mut self.world,
                stockpiles: &mut self.stockpiles,
                recipes: &self.recipes,
                items: &self.items,
                config: &self.config,
                tick: 0,
            }
        }
    }

    fn hunt_job(animal: crate::core::types::AnimalId, pos: TilePos) -> Job {
        Job::new(
            JobType::Hunt,
            JobPayload::Hunt { animal },
            pos,
            4.0,
            1.0,
            0,
        )
    }

    #[test]
    fn test_hunt_kills_and_drops_meat() {
        let mut fx = Fixture::new();
        let den = TilePos::new(6, 6, 0);
        let id = fx.world.spawn_animal(AnimalSpecies::Boar, den);
        let mut job = hunt_job(id, den);
        let mut agent = Agent::new("Hunter", TilePos::new(6, 5, 0));

        let mut outcome = Progress::Continuing;
        for _ in 0..30 {
            outcome = advance(&mut fx.ctx(), &mut agent, &mut job, 1.0);
            if outcome != Progress::Continuing {
                break;
            }
        }
        assert_eq!(outcome, Progress::Completed);
        assert!(!fx.world.animal(id).unwrap().alive);

        let meat_count = fx
            .world
            .map
            .loose_items
            .iter()
            .filter(|l| l.pos == den && l.item.def_id == "raw_meat")
            .count();
        assert_eq!(meat_count as u32, AnimalSpecies::Boar.meat_yield());
    }

    #[test]
    fn test_out_of_reach_requests_travel() {
        let mut fx = Fixture::new();
        let den = TilePos::new(6, 6, 0);
        let id = fx.world.spawn_animal(AnimalSpecies::Deer, den);
        let mut job = hunt_job(id, den);
        let mut agent = Agent::new("Hunter", TilePos::new(0, 0, 0));

        assert_eq!(
            advance(&mut fx.ctx(), &mut agent, &mut job, 1.0),
            Progress::Travel(den)
        );
        // No damage dealt from afar
        assert_eq!(
            fx.world.animal(id).unwrap().health,
            AnimalSpecies::Deer.max_health()
        );
    }

    #[test]
    fn test_fled_target_invalidates_job() {
        let mut fx = Fixture::new();
        let den = TilePos::new(6, 6, 0);
        let id = fx.world.spawn_animal(AnimalSpecies::Rat, den);
        fx.world.animal_mut(id).unwrap().fled = true;

        let mut job = hunt_job(id, den);
        let mut agent = Agent::new("Hunter", TilePos::new(6, 5, 0));
        assert_eq!(
            advance(&mut fx.ctx(), &mut agent, &mut job, 1.0),
            Progress::Blocked(BlockReason::InvalidTarget)
        );
    }

    #[test]
    fn test_already_dead_target_invalidates_job() {
        let mut fx = Fixture::new();
        let den = TilePos::new(6, 6, 0);
        let id = fx.world.spawn_animal(AnimalSpecies::Rat, den);
        fx.world.animal_mut(id).unwrap().take_damage(100.0);

        let mut job = hunt_job(id, den);
        let mut agent = Agent::new("Hunter", TilePos::new(6, 5, 0));
        assert_eq!(
            advance(&mut fx.ctx(), &mut agent, &mut job, 1.0),
            Progress::Blocked(BlockReason::InvalidTarget)
        );
    }
}
