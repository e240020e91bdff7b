//! Execution engines
//!
//! All job types share one contract: `advance` is called once per
//! executing tick and reports whether the job is still running, needs the
//! agent somewhere else first, finished, or cannot proceed. Engines are
//! the only code that commits reservations, and they do so exactly at the
//! moment of consumption.

pub mod construction;
pub mod crafting;
pub mod harvesting;
pub mod hauling;
pub mod hunting;

use crate::agents::Agent;
use crate::core::config::SimulationConfig;
use crate::items::{ItemCatalog, MaterialRequirement};
use crate::jobs::job::{BlockReason, Job, JobPayload, JobType};
use crate::recipes::RecipeCatalog;
use crate::storage::{Stockpiles, StoreQuery};
use crate::core::types::{Tick, TilePos};
use crate::world::World;

/// Outcome of one engine tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Work advanced; call again next tick
    Continuing,
    /// The agent must stand at (or adjacent to) this tile first
    Travel(TilePos),
    /// Side effects applied, the job is done
    Completed,
    /// Cannot proceed; the state machine decides whether to wait or abandon
    Blocked(BlockReason),
}

/// Mutable world access shared by all engines
pub struct EngineCtx<'a> {
    pub world: &'a mut World,
    pub stockpiles: &'a mut Stockpiles,
    pub recipes: &'a RecipeCatalog,
    pub items: &'a ItemCatalog,
    pub config: &'a SimulationConfig,
    pub tick: Tick,
}

/// Dispatch to the engine matching the job type
pub fn advance(ctx: &mut EngineCtx, agent: &mut Agent, job: &mut Job, delta: f32) -> Progress {
    match job.job_type {
        JobType::Build => construction::advance(ctx, agent, job, delta),
        JobType::Craft => crafting::advance(ctx, agent, job, delta),
        JobType::Haul => hauling::advance(ctx, agent, job, delta),
        JobType::Harvest | JobType::Salvage => harvesting::advance(ctx, agent, job, delta),
        JobType::Hunt => hunting::advance(ctx, agent, job, delta),
        JobType::Equip => hauling::advance_equip(ctx, agent, job, delta),
    }
}

/// Reserve every requirement or nothing at all.
///
/// Holds created for earlier requirements are cancelled if a later one
/// cannot be satisfied, so a blocked job never pins partial inputs.
pub(crate) fn reserve_all_inputs(
    ctx: &mut EngineCtx,
    job: &mut Job,
    requirements: &[MaterialRequirement],
) -> bool {
    let mut acquired = Vec::new();
    for req in requirements {
        match ctx
            .stockpiles
            .find_and_reserve(&req.key, req.amount, Some(job.target), Some(job.id))
        {
            Some(slices) => acquired.extend(slices.into_iter().map(|s| s.id)),
            None => {
                for id in acquired {
                    // Freshly created holds, cancel cannot fail
                    let _ = ctx.stockpiles.cancel_reservation(id);
                }
                return false;
            }
        }
    }
    job.exec.reservations = acquired;
    job.exec.inputs_reserved = true;
    true
}

/// Commit every input reservation held by the job
pub(crate) fn commit_inputs(ctx: &mut EngineCtx, job: &mut Job) {
    for id in job.exec.reservations.drain(..) {
        if let Err(e) = ctx.stockpiles.commit_reservation(id) {
            tracing::error!(job = ?job.id, error = %e, "input commit failed");
        }
    }
    job.exec.inputs_committed = true;
}

/// Try to place every pending output into storage, searching for a cell
/// per good. Anything that finds no legal destination stays pending and
/// the job blocks on storage instead of discarding the product.
pub(crate) fn flush_outputs(ctx: &mut EngineCtx, job: &mut Job, from: TilePos) -> Progress {
    let mut remaining_resources = Vec::new();
    for (resource, amount) in job.exec.pending_resources.drain(..) {
        let dest = ctx
            .stockpiles
            .find_store_cell(StoreQuery::Resource { resource, amount }, Some(from));
        let stored = match dest {
            Some(cell) => ctx.stockpiles.store_resource(cell, resource, amount).is_ok(),
            None => false,
        };
        if !stored {
            remaining_resources.push((resource, amount));
        }
    }
    job.exec.pending_resources = remaining_resources;

    let mut remaining_items = Vec::new();
    for item in job.exec.pending_items.drain(..) {
        let dest = ctx
            .stockpiles
            .find_store_cell(StoreQuery::Item(&item), Some(from));
        let stored = match dest {
            Some(cell) => ctx.stockpiles.store_item(cell, &item).is_ok(),
            None => false,
        };
        if !stored {
            remaining_items.push(item);
        }
    }
    job.exec.pending_items = remaining_items;

    if job.exec.has_pending_output() {
        Progress::Blocked(BlockReason::NoStorage)
    } else {
        Progress::Completed
    }
}

/// Undo engine bookkeeping when a job is abandoned or cancelled.
///
/// Live input reservations are cancelled, carried cargo and finished
/// goods drop to the ground at the agent's feet. Goods are never
/// silently destroyed.
pub fn abandon_cleanup(ctx: &mut EngineCtx, agent: &mut Agent, job: &mut Job) {
    for id in job.exec.reservations.drain(..) {
        // Committed inputs are already consumed; cancelling them fails
        // harmlessly through the exactly-once guard.
        let _ = ctx.stockpiles.cancel_reservation(id);
    }

    if let Some(cargo) = agent.carrying.take() {
        match cargo {
            crate::agents::CarriedGoods::Resource { resource, amount } => {
                ctx.world.map.drop_resource(agent.pos, resource, amount);
            }
            crate::agents::CarriedGoods::Item(item) => {
                ctx.world.map.drop_item(agent.pos, item);
            }
        }
    }

    for (resource, amount) in job.exec.pending_resources.drain(..) {
        ctx.world.map.drop_resource(agent.pos, resource, amount);
    }
    for item in job.exec.pending_items.drain(..) {
        ctx.world.map.drop_item(agent.pos, item);
    }

    job.exec = Default::default();
    job.blocked = None;
}

/// Requirements a job's engine will reserve up front
pub(crate) fn input_requirements(job: &Job, recipes: &RecipeCatalog) -> Vec<MaterialRequirement> {
    match &job.payload {
        JobPayload::Build { structure } => structure.materials(),
        JobPayload::Craft { recipe_id } => recipes
            .get(recipe_id)
            .map(|r| r.inputs.clone())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
