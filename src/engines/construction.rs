//! Construction engine
//!
//! Reserves the full bill of materials up front, accumulates work while
//! the agent stands at the blueprint, and on completion commits every
//! input and converts the blueprint into its finished structure.

use crate::agents::Agent;
use crate::engines::{commit_inputs, input_requirements, reserve_all_inputs, EngineCtx, Progress};
use crate::jobs::job::{BlockReason, Job};

pub fn advance(ctx: &mut EngineCtx, _agent: &mut Agent, job: &mut Job, delta: f32) -> Progress {
    // The blueprint can vanish mid-job (operator demolition, another
    // builder finishing a duplicate designation).
    match ctx.world.map.structure_at(job.target) {
        Some(s) if !s.built => {}
        _ => return Progress::Blocked(BlockReason::InvalidTarget),
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

    commit_inputs(ctx, job);
    ctx.world.map.finish_structure(job.target);
    tracing::info!(pos = ?job.target, "structure finished");
    Progress::Completed
}
