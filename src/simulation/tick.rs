//! Tick orchestration
//!
//! One tick runs, in order: job cooldowns, the stale-claim sweep,
//! relocation sweeps, producers, agent steps in stable spawn order, and
//! world upkeep. The sweep runs before the claim pass so force-released
//! jobs are claimable the same tick; agents update sequentially, which
//! is the documented claim-race tie-break.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::agents::{state, StepCtx};
use crate::jobs::producers;
use crate::simulation::colony::Colony;
use crate::simulation::events::SimEvent;
use crate::storage::relocation;
use crate::core::types::Tick;
use crate::world::Pathfinder;

/// Mixing constant for the per-tick derived RNG stream
const TICK_RNG_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Advance the colony one tick and return what happened
pub fn run_tick(colony: &mut Colony, pathfinder: &dyn Pathfinder) -> Vec<SimEvent> {
    colony.tick += 1;
    let tick = colony.tick;
    let mut events = Vec::new();

    // 1. Cooldowns count down before anything queries candidates
    colony.registry.tick_timers();

    // 2. Liveness: stale claims released before this tick's claim pass
    let expired = colony
        .registry
        .expire_stale(tick, colony.config.stale_claim_max_age);
    for e in expired {
        colony.stockpiles.release_job(e.job);
        events.push(SimEvent::ClaimExpired {
            job: e.job,
            agent: e.agent,
        });
    }

    // 3. Filter-change relocation
    relocation::sweep_filter_mismatch(
        &mut colony.stockpiles,
        &mut colony.registry,
        tick,
        &mut events,
    );

    // 4. Producers
    producers::spawn_haul_jobs(
        &colony.world,
        &colony.stockpiles,
        &mut colony.registry,
        tick,
        &mut events,
    );
    producers::spawn_hunt_jobs(&colony.world, &mut colony.registry, tick, &mut events);
    producers::spawn_craft_jobs(
        &mut colony.craft_orders,
        &colony.world,
        &colony.recipes,
        &mut colony.registry,
        tick,
        &mut events,
    );

    // 5. Agents, in stable spawn order. The RNG stream is derived from
    // (seed, tick) so a restored snapshot replays identically.
    let mut rng = derive_rng(colony.seed, tick);
    {
        let Colony {
            config,
            world,
            stockpiles,
            registry,
            agents,
            recipes,
            items,
            ..
        } = colony;
        for agent in agents.iter_mut() {
            let mut ctx = StepCtx {
                registry: &mut *registry,
                stockpiles: &mut *stockpiles,
                world: &mut *world,
                recipes: &*recipes,
                items: &*items,
                config: &*config,
                pathfinder,
                rng: &mut rng,
                tick,
                events: &mut events,
            };
            state::step(agent, &mut ctx);
        }
    }

    // 6. World upkeep
    for node in colony.world.nodes.iter_mut() {
        node.regenerate();
    }
    for animal in colony.world.animals.iter_mut() {
        animal.tick(&mut rng);
    }
    colony.stockpiles.compact_ledger();

    events
}

fn derive_rng(seed: u64, tick: Tick) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed ^ tick.wrapping_mul(TICK_RNG_SALT))
}

/// Run `n` ticks, discarding events. Test and tooling convenience.
pub fn run_ticks(colony: &mut Colony, pathfinder: &dyn Pathfinder, n: u32) {
    for _ in 0..n {
        run_tick(colony, pathfinder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::Agent;
    use crate::core::config::SimulationConfig;
    use crate::items::ResourceType;
    use crate::storage::StorageFilter;
    use crate::core::types::TilePos;
    use crate::world::GridPathfinder;

    fn small_colony() -> Colony {
        let mut colony = Colony::new(24, 24, SimulationConfig::default(), 42);
        colony.stockpiles.create_zone(
            "main",
            vec![TilePos::new(0, 0, 0), TilePos::new(1, 0, 0)],
            StorageFilter::allow_all(),
        );
        colony
    }

    #[test]
    fn test_tick_advances_clock_and_runs_producers() {
        let mut colony = small_colony();
        colony
            .world
            .map
            .drop_resource(TilePos::new(5, 5, 0), ResourceType::Wood, 3);

        let pf = GridPathfinder::new();
        let events = run_tick(&mut colony, &pf);
        assert_eq!(colony.tick, 1);
        // The auto-haul scan queued a job for the loose pile
        assert!(events
            .iter()
            .any(|e| matches!(e, SimEvent::JobInserted { .. })));
        assert_eq!(colony.registry.len(), 1);
    }

    #[test]
    fn test_expired_claims_are_freed_before_claim_pass() {
        let mut colony = small_colony();
        let pf = GridPathfinder::new();

        // A job claimed by a phantom agent that will never progress
        let job_id = colony
            .registry
            .insert(crate::jobs::job::Job::new(
                crate::jobs::job::JobType::Harvest,
                crate::jobs::job::JobPayload::Harvest,
                TilePos::new(3, 3, 0),
                1.0,
                60.0,
                0,
            ))
            .unwrap();
        colony
            .world
            .spawn_node(TilePos::new(3, 3, 0), crate::world::NodeKind::Tree, 8);
        let phantom = crate::core::types::AgentId::new();
        colony.registry.claim(job_id, phantom, 0).unwrap();

        // An idle worker waits for the job to free up
        colony.spawn_agent(Agent::new("Moss", TilePos::new(2, 3, 0)));

        let max_age = colony.config.stale_claim_max_age;
        let mut claimed_by_worker = false;
        for _ in 0..(max_age + 2) {
            let events = run_tick(&mut colony, &pf);
            let expired = events
                .iter()
                .any(|e| matches!(e, SimEvent::ClaimExpired { job, .. } if *job == job_id));
            let reclaimed = events
                .iter()
                .any(|e| matches!(e, SimEvent::JobClaimed { job, .. } if *job == job_id));
            if expired {
                // Freed jobs must be visible to the same tick's claims
                assert!(reclaimed, "freed job should be claimed the same tick");
                claimed_by_worker = true;
                break;
            }
        }
        assert!(claimed_by_worker, "stale claim never expired");
    }

    #[test]
    fn test_derived_rng_is_deterministic() {
        use rand::RngCore;
        let mut a = derive_rng(42, 7);
        let mut b = derive_rng(42, 7);
        let mut c = derive_rng(42, 8);
        let first = a.next_u64();
        assert_eq!(first, b.next_u64());
        assert_ne!(first, c.next_u64());
    }
}
