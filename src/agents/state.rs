//! Agent execution state machine
//!
//! Idle -> Evaluating -> Moving -> Executing -> Completing/Abandoning ->
//! Idle, with Preempted reachable from any live state when hunger fires.
//! The machine is re-entrant per agent and touches shared state only
//! through the registry and stockpile APIs, so agents stay independent.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::agents::agent::{Agent, AgentState, CarriedGoods, FoodErrand};
use crate::core::config::SimulationConfig;
use crate::engines::{self, EngineCtx, Progress};
use crate::items::{ItemCatalog, ResourceKey, ResourceType};
use crate::jobs::job::{BlockReason, Job, JobPayload};
use crate::jobs::registry::JobRegistry;
use crate::jobs::scoring;
use crate::recipes::RecipeCatalog;
use crate::simulation::events::SimEvent;
use crate::storage::Stockpiles;
use crate::core::types::{JobId, Tick, TilePos};
use crate::world::{Pathfinder, RouteResult, World};

/// Damage per tick once hunger maxes out
const STARVATION_DAMAGE: f32 = 0.05;

/// How close the agent must get to its movement goal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    Exact,
    Adjacent,
}

/// Everything one agent step may touch
pub struct StepCtx<'a> {
    pub registry: &'a mut JobRegistry,
    pub stockpiles: &'a mut Stockpiles,
    pub world: &'a mut World,
    pub recipes: &'a RecipeCatalog,
    pub items: &'a ItemCatalog,
    pub config: &'a SimulationConfig,
    pub pathfinder: &'a dyn Pathfinder,
    pub rng: &'a mut ChaCha8Rng,
    pub tick: Tick,
    pub events: &'a mut Vec<SimEvent>,
}

impl StepCtx<'_> {
    fn engine_ctx(&mut self) -> EngineCtx<'_> {
        EngineCtx {
            world: &mut *self.world,
            stockpiles: &mut *self.stockpiles,
            recipes: self.recipes,
            items: self.items,
            config: self.config,
            tick: self.tick,
        }
    }
}

/// Advance one agent by one tick
pub fn step(agent: &mut Agent, ctx: &mut StepCtx) {
    if !agent.alive {
        return;
    }

    let working = matches!(agent.state, AgentState::Moving | AgentState::Executing);
    agent.needs.tick(ctx.config, working);

    if agent.needs.is_starving() {
        agent.health -= STARVATION_DAMAGE;
        if agent.health <= 0.0 {
            die(agent, ctx);
            return;
        }
    }

    // Preemption fires from any live state, but only when there is
    // actually something to eat; otherwise the colonist keeps working
    // hungry rather than spinning on a hopeless errand.
    if agent.state != AgentState::Preempted
        && agent.needs.needs_food(ctx.config)
        && food_exists(ctx)
    {
        if let Some(job_id) = agent.current_job {
            release_for_preemption(agent, ctx, job_id);
        }
        agent.path.clear();
        agent.state = AgentState::Preempted;
        ctx.events.push(SimEvent::AgentPreempted { agent: agent.id });
    }

    match agent.state {
        AgentState::Idle | AgentState::Evaluating => evaluate(agent, ctx),
        AgentState::Moving => moving(agent, ctx),
        AgentState::Executing => executing(agent, ctx),
        // Transitional states resolve within the tick that sets them
        AgentState::Completing | AgentState::Abandoning => agent.state = AgentState::Idle,
        AgentState::Preempted => preempted(agent, ctx),
    }
}

fn die(agent: &mut Agent, ctx: &mut StepCtx) {
    agent.alive = false;
    agent.state = AgentState::Idle;
    // Whatever it carried falls where it stood; the claim itself is
    // recovered later by the stale sweep.
    if let Some(cargo) = agent.carrying.take() {
        match cargo {
            CarriedGoods::Resource { resource, amount } => {
                ctx.world.map.drop_resource(agent.pos, resource, amount);
            }
            CarriedGoods::Item(item) => ctx.world.map.drop_item(agent.pos, item),
        }
    }
    tracing::warn!(agent = %agent.name, "colonist starved to death");
    ctx.events.push(SimEvent::AgentStarved { agent: agent.id });
}

fn food_exists(ctx: &StepCtx) -> bool {
    ctx.stockpiles.total_resource(ResourceType::Meal) > 0
        || ctx.stockpiles.total_resource(ResourceType::RawFood) > 0
}

// --- Evaluating ---

fn evaluate(agent: &mut Agent, ctx: &mut StepCtx) {
    agent.state = AgentState::Evaluating;

    // A job pointer without a backing claim means the job was cancelled
    // or expired out from under us.
    if let Some(job_id) = agent.current_job {
        if claim_lost(ctx, job_id, agent) {
            reset_after_lost_claim(agent, ctx);
        } else {
            agent.state = AgentState::Moving;
            return;
        }
    }

    let claimed = scoring::try_claim_best(
        ctx.registry,
        ctx.stockpiles,
        ctx.recipes,
        agent.id,
        agent.pos,
        &agent.traits,
        &agent.enabled_jobs,
        ctx.tick,
        ctx.config,
    );

    let job_id = match claimed {
        Some(id) => id,
        None => {
            agent.state = AgentState::Idle;
            wander(agent, ctx);
            return;
        }
    };

    agent.current_job = Some(job_id);
    ctx.events.push(SimEvent::JobClaimed {
        job: job_id,
        agent: agent.id,
    });

    let goal = match ctx.registry.get(job_id) {
        Some(job) => movement_goal(job),
        None => {
            agent.current_job = None;
            agent.state = AgentState::Idle;
            return;
        }
    };

    match route_for(ctx, agent.pos, goal.0, goal.1) {
        Some(path) => {
            agent.path = path;
            agent.state = AgentState::Moving;
        }
        None => {
            // Unreachable target: release with a cooldown so the pool
            // does not thrash on an impossible job.
            ctx.registry
                .release_with_cooldown(job_id, ctx.config.unreachable_cooldown);
            ctx.events.push(SimEvent::JobAbandoned {
                job: job_id,
                agent: agent.id,
                reason: BlockReason::Unreachable,
                requeued: true,
            });
            agent.current_job = None;
            agent.state = AgentState::Idle;
        }
    }
}

fn wander(agent: &mut Agent, ctx: &mut StepCtx) {
    // Keeps the colony visually alive when there is no work
    if ctx.rng.gen_bool(0.05) {
        let neighbors = agent.pos.neighbors();
        let pick = neighbors[ctx.rng.gen_range(0..neighbors.len())];
        if ctx.world.map.is_walkable(pick) {
            agent.pos = pick;
        }
    }
}

// --- Moving ---

fn moving(agent: &mut Agent, ctx: &mut StepCtx) {
    let job_id = match agent.current_job {
        Some(id) => id,
        None => {
            agent.state = AgentState::Idle;
            return;
        }
    };
    if claim_lost(ctx, job_id, agent) {
        reset_after_lost_claim(agent, ctx);
        return;
    }
    // Travel counts as activity for the stale sweep
    ctx.registry.touch(job_id, ctx.tick);

    if agent.path.is_empty() {
        agent.state = AgentState::Executing;
        return;
    }

    let next = agent.path[0];
    if ctx.world.map.is_walkable(next) {
        agent.step_path();
        if agent.path.is_empty() {
            agent.state = AgentState::Executing;
        }
        return;
    }

    // Route blocked mid-travel (a wall went up): re-route to the same goal
    let goal = *agent.path.last().unwrap_or(&next);
    match route_for(ctx, agent.pos, goal, Reach::Exact) {
        Some(path) => agent.path = path,
        None => {
            if let Some(job) = ctx.registry.remove(job_id) {
                abandon(agent, ctx, job, BlockReason::Unreachable);
            } else {
                reset_after_lost_claim(agent, ctx);
            }
        }
    }
}

// --- Executing ---

fn executing(agent: &mut Agent, ctx: &mut StepCtx) {
    let job_id = match agent.current_job {
        Some(id) => id,
        None => {
            agent.state = AgentState::Idle;
            return;
        }
    };
    if claim_lost(ctx, job_id, agent) {
        reset_after_lost_claim(agent, ctx);
        return;
    }

    // Check the job out of the registry for the engine call
    let mut job = match ctx.registry.remove(job_id) {
        Some(j) => j,
        None => {
            reset_after_lost_claim(agent, ctx);
            return;
        }
    };

    let was_blocked = job.blocked;
    let delta = ctx.config.base_work_per_tick * agent.traits.speed;
    let progress = engines::advance(&mut ctx.engine_ctx(), agent, &mut job, delta);

    match progress {
        Progress::Continuing => {
            job.blocked = None;
            job.exec.wait_ticks = 0;
            job.last_activity_tick = Some(ctx.tick);
            ctx.registry.put_back(job);
        }
        Progress::Travel(dest) => {
            job.blocked = None;
            job.last_activity_tick = Some(ctx.tick);
            match route_for(ctx, agent.pos, dest, Reach::Adjacent) {
                Some(path) => {
                    ctx.registry.put_back(job);
                    agent.path = path;
                    agent.state = AgentState::Moving;
                }
                None => abandon(agent, ctx, job, BlockReason::Unreachable),
            }
        }
        Progress::Completed => {
            agent.state = AgentState::Completing;
            ctx.events.push(SimEvent::JobCompleted {
                job: job.id,
                kind: job.job_type,
                agent: agent.id,
            });
            // Engines settle their reservations at consumption; anything
            // still held here would be a leak, so sweep defensively.
            ctx.stockpiles.release_job(job.id);
            agent.current_job = None;
            agent.path.clear();
            agent.state = AgentState::Idle;
        }
        Progress::Blocked(reason) => {
            job.blocked = Some(reason);
            if was_blocked != Some(reason) {
                ctx.events.push(SimEvent::JobBlocked {
                    job: job.id,
                    reason,
                });
            }
            match reason {
                BlockReason::MissingMaterials => {
                    // Tolerate transient stock fluctuations up to a bound
                    job.exec.wait_ticks += 1;
                    job.last_activity_tick = Some(ctx.tick);
                    if job.exec.wait_ticks > ctx.config.material_wait_max {
                        abandon(agent, ctx, job, reason);
                    } else {
                        ctx.registry.put_back(job);
                    }
                }
                BlockReason::NoStorage => {
                    if job.exec.has_pending_output() {
                        // Backpressure: hold the finished goods at the
                        // completion boundary until space frees up. The
                        // stall is activity as far as staleness goes.
                        job.last_activity_tick = Some(ctx.tick);
                        ctx.registry.put_back(job);
                    } else {
                        // A hauler with cargo and no destination left
                        abandon(agent, ctx, job, reason);
                    }
                }
                BlockReason::InvalidTarget | BlockReason::Unreachable => {
                    abandon(agent, ctx, job, reason);
                }
            }
        }
    }
}

// --- Abandon / cancel plumbing ---

fn claim_lost(ctx: &StepCtx, job_id: JobId, agent: &Agent) -> bool {
    match ctx.registry.get(job_id) {
        Some(job) => job.claimant != Some(agent.id),
        None => true,
    }
}

fn reset_after_lost_claim(agent: &mut Agent, ctx: &mut StepCtx) {
    // The canceller already settled the job's reservations; cargo in hand
    // still must not vanish.
    if let Some(cargo) = agent.carrying.take() {
        match cargo {
            CarriedGoods::Resource { resource, amount } => {
                ctx.world.map.drop_resource(agent.pos, resource, amount);
            }
            CarriedGoods::Item(item) => ctx.world.map.drop_item(agent.pos, item),
        }
    }
    agent.current_job = None;
    agent.path.clear();
    agent.state = AgentState::Idle;
}

/// Abandon a checked-out job: cleanup, then requeue or delete it
fn abandon(agent: &mut Agent, ctx: &mut StepCtx, mut job: Job, reason: BlockReason) {
    agent.state = AgentState::Abandoning;
    // Once inputs are consumed the work is spent; the cleanup spills any
    // finished goods to the ground, and requeuing would craft a second
    // batch from fresh inputs.
    let inputs_spent = job.exec.inputs_committed;
    engines::abandon_cleanup(&mut ctx.engine_ctx(), agent, &mut job);

    // A vanished target can never succeed again; everything else goes
    // back to the pool if the job type tolerates it.
    let requeued = match reason {
        BlockReason::InvalidTarget => false,
        _ => !inputs_spent && job.job_type.tolerates_requeue(),
    };
    ctx.events.push(SimEvent::JobAbandoned {
        job: job.id,
        agent: agent.id,
        reason,
        requeued,
    });

    if requeued {
        job.claimant = None;
        job.claim_tick = None;
        job.wait_timer = ctx.config.requeue_cooldown;
        ctx.registry.put_back(job);
    }
    // Non-requeueable jobs (hunt, equip) die with the abandonment

    agent.current_job = None;
    agent.path.clear();
    agent.state = AgentState::Idle;
}

/// Release the current claim for a hunger preemption: cleanup but no
/// cooldown, so another colonist can take the job immediately.
fn release_for_preemption(agent: &mut Agent, ctx: &mut StepCtx, job_id: JobId) {
    let Some(mut job) = ctx.registry.remove(job_id) else {
        agent.current_job = None;
        return;
    };
    let inputs_spent = job.exec.inputs_committed;
    engines::abandon_cleanup(&mut ctx.engine_ctx(), agent, &mut job);
    if !inputs_spent && job.job_type.tolerates_requeue() {
        job.claimant = None;
        job.claim_tick = None;
        ctx.registry.put_back(job);
    }
    agent.current_job = None;
}

// --- Preempted ---

fn preempted(agent: &mut Agent, ctx: &mut StepCtx) {
    match agent.errand.clone() {
        None => start_food_errand(agent, ctx),
        Some(errand) => {
            if !agent.path.is_empty() {
                let next = agent.path[0];
                if ctx.world.map.is_walkable(next) {
                    agent.step_path();
                } else {
                    match route_for(ctx, agent.pos, errand.dest, Reach::Adjacent) {
                        Some(path) => agent.path = path,
                        None => {
                            let _ = ctx.stockpiles.cancel_reservation(errand.reservation);
                            agent.errand = None;
                            agent.state = AgentState::Idle;
                        }
                    }
                }
                return;
            }

            // Arrived: withdraw and eat
            if ctx
                .stockpiles
                .commit_reservation(errand.reservation)
                .is_ok()
            {
                agent.needs.eat(ctx.config.meal_nutrition);
                ctx.events.push(SimEvent::AgentAte { agent: agent.id });
            }
            agent.errand = None;
            agent.state = AgentState::Idle;
        }
    }
}

fn start_food_errand(agent: &mut Agent, ctx: &mut StepCtx) {
    // Meals first, raw food as fallback
    let reserved = ctx
        .stockpiles
        .find_and_reserve(
            &ResourceKey::Resource(ResourceType::Meal),
            1,
            Some(agent.pos),
            None,
        )
        .or_else(|| {
            ctx.stockpiles.find_and_reserve(
                &ResourceKey::Resource(ResourceType::RawFood),
                1,
                Some(agent.pos),
                None,
            )
        });

    let slices = match reserved {
        Some(s) if !s.is_empty() => s,
        _ => {
            agent.state = AgentState::Idle;
            return;
        }
    };
    let slice = &slices[0];

    match route_for(ctx, agent.pos, slice.cell, Reach::Adjacent) {
        Some(path) => {
            agent.errand = Some(FoodErrand {
                dest: slice.cell,
                reservation: slice.id,
            });
            agent.path = path;
        }
        None => {
            let _ = ctx.stockpiles.cancel_reservation(slice.id);
            agent.state = AgentState::Idle;
        }
    }
}

// --- Routing ---

/// Where the agent must stand to start executing this job
fn movement_goal(job: &Job) -> (TilePos, Reach) {
    match &job.payload {
        JobPayload::Build { .. }
        | JobPayload::Craft { .. }
        | JobPayload::Harvest
        | JobPayload::Salvage => (job.target, Reach::Exact),
        JobPayload::Haul { source, .. } => (source.pos(), Reach::Adjacent),
        JobPayload::Hunt { .. } | JobPayload::Equip { .. } => (job.target, Reach::Adjacent),
    }
}

/// Route to the goal, falling back to its neighbors for adjacent reach
fn route_for(ctx: &StepCtx, from: TilePos, goal: TilePos, reach: Reach) -> Option<Vec<TilePos>> {
    match reach {
        Reach::Exact => {
            if from == goal {
                return Some(Vec::new());
            }
            match ctx.pathfinder.find_route(&ctx.world.map, from, goal) {
                RouteResult::Route(path) => Some(path),
                RouteResult::Unreachable => None,
            }
        }
        Reach::Adjacent => {
            if from.is_adjacent(&goal) {
                return Some(Vec::new());
            }
            if let RouteResult::Route(path) = ctx.pathfinder.find_route(&ctx.world.map, from, goal)
            {
                return Some(path);
            }
            let mut neighbors = goal.neighbors();
            neighbors.sort_by_key(|n| (from.manhattan(n), n.z, n.y, n.x));
            for n in neighbors {
                if !ctx.world.map.is_walkable(n) {
                    continue;
                }
                if let RouteResult::Route(path) =
                    ctx.pathfinder.find_route(&ctx.world.map, from, n)
                {
                    return Some(path);
                }
            }
            None
        }
    }
}
