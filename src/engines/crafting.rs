//! Crafting engine
//!
//! Same shape as construction, but outputs go to storage instead of
//! mutating the tile. Inputs are committed exactly once when the work
//! finishes; finished goods that find no legal storage hold the job in a
//! no-storage block until space frees up or a filter changes.

use crate::agents::Agent;
use crate::engines::{
    commit_inputs, flush_outputs, input_requirements, reserve_all_inputs, EngineCtx, Progress,
};
use crate::jobs::job::{BlockReason, Job, JobPayload};
use crate::recipes::RecipeOutput;

pub fn advance(ctx: &mut EngineCtx, _agent: &mut Agent, job: &mut Job, delta: f32) -> Progress {
    let recipe_id = match &job.payload {
        JobPayload::Craft { recipe_id } => recipe_id.clone(),
        _ => return Progress::Blocked(BlockReason::InvalidTarget),
    };
    let recipe = match ctx.recipes.get(&recipe_id) {
        Some(r) => r.clone(),
        None => return Progress::Blocked(BlockReason::InvalidTarget),
    };

    // The workstation must still stand
    match ctx.world.map.structure_at(job.target) {
        Some(s) if s.built && s.kind == recipe.workstation => {}
        _ => return Progress::Blocked(BlockReason::InvalidTarget),
    }

    // Backpressure: finished goods still waiting for storage
    if job.exec.inputs_committed {
        return flush_outputs(ctx, job, job.target);
    }

    if !job.exec.inputs_reserved {
        let requirements = input_requirements(job, ctx.recipes);
        if !reserve_all_inputs(ctx, job, &requirements) {
            return Progress::Blocked(BlockReason::MissingMaterials);
        }
    }

    job.accumulated_progress += delta;
    if !job.is_complete() {
        return Progress::Continuing;
    }

    // Consume inputs and materialize outputs, exactly once
    commit_inputs(ctx, job);
    for output in &recipe.outputs {
        match output {
            RecipeOutput::Resource(resource, amount) => {
                job.exec.pending_resources.push((*resource, *amount));
            }
            RecipeOutput::Item(def_id, count) => {
                for _ in 0..*count {
                    match ctx.items.spawn(def_id) {
                        Some(item) => job.exec.pending_items.push(item),
                        None => {
                            tracing::error!(def = %def_id, "recipe output references unknown item");
                        }
                    }
                }
            }
        }
    }

    flush_outputs(ctx, job, job.target)
}
