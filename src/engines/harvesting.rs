//! Harvesting engine, shared by harvest and salvage jobs
//!
//! Accumulates work against a node, withdraws one yield cycle on
//! completion, and sends the output through the same store-with-search
//! path as crafting. A node depleted by someone else mid-job is an
//! invalid target; a finite node stripped by this job converts to its
//! depleted husk.

use crate::agents::Agent;
use crate::engines::{flush_outputs, EngineCtx, Progress};
use crate::jobs::job::{BlockReason, Job};

pub fn advance(ctx: &mut EngineCtx, _agent: &mut Agent, job: &mut Job, delta: f32) -> Progress {
    // Finished goods still waiting for storage space
    if job.exec.has_pending_output() {
        return flush_outputs(ctx, job, job.target);
    }

    let node = match ctx.world.node_at_mut(job.target) {
        Some(n) => n,
        None => return Progress::Blocked(BlockReason::InvalidTarget),
    };
    if !node.has_yield() {
        return Progress::Blocked(BlockReason::InvalidTarget);
    }

    job.accumulated_progress += delta;
    if !job.is_complete() {
        return Progress::Continuing;
    }

    let produced = node.harvest();
    let resource = node.kind.resource();
    if node.depleted {
        tracing::debug!(pos = ?job.target, "node stripped bare");
    }
    if produced > 0 {
        job.exec.pending_resources.push((resource, produced));
    }
    flush_outputs(ctx, job, job.target)
}
