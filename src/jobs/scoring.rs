//! Claim protocol: scoring and atomic claim of the best candidate
//!
//! Scores blend job priority, a distance falloff, the agent's per-category
//! bias, and an urgency bonus that grows with unclaimed age. Ties break by
//! insertion order, oldest first, so equal work cannot starve.

use ahash::AHashSet;
use ordered_float::OrderedFloat;

use crate::agents::WorkerTraits;
use crate::core::config::SimulationConfig;
use crate::jobs::job::{Job, JobType};
use crate::jobs::registry::JobRegistry;
use crate::recipes::RecipeCatalog;
use crate::storage::Stockpiles;
use crate::core::types::{AgentId, JobId, Tick, TilePos};

/// Score one candidate job for an agent at `pos`
pub fn score_job(
    job: &Job,
    pos: TilePos,
    traits: &WorkerTraits,
    tick: Tick,
    config: &SimulationConfig,
) -> f32 {
    let priority = job.priority * config.priority_weight;
    let distance = pos.manhattan(&job.target) as f32 * config.distance_cost;
    let bias = traits.scoring_bias(job.job_type.category());
    let age = tick.saturating_sub(job.created_tick) as f32;
    let urgency = (age * config.urgency_rate).min(config.urgency_cap);

    priority - distance + bias + urgency
}

/// Rank candidate ids best-first. Stable under equal scores: the job
/// inserted earliest wins.
pub fn rank_candidates(
    candidates: &[&Job],
    pos: TilePos,
    traits: &WorkerTraits,
    tick: Tick,
    config: &SimulationConfig,
) -> Vec<JobId> {
    let mut scored: Vec<(OrderedFloat<f32>, u64, JobId)> = candidates
        .iter()
        .map(|job| {
            (
                OrderedFloat(score_job(job, pos, traits, tick, config)),
                job.seq,
                job.id,
            )
        })
        .collect();
    // Highest score first; seq ascending breaks ties
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, _, id)| id).collect()
}

/// Query, rank, and claim the best available job for an agent.
///
/// A lost claim race falls through to the next candidate instead of
/// idling; attempts are bounded by `claim_attempts_per_tick`.
pub fn try_claim_best(
    registry: &mut JobRegistry,
    stockpiles: &Stockpiles,
    recipes: &RecipeCatalog,
    agent: AgentId,
    pos: TilePos,
    traits: &WorkerTraits,
    enabled: &AHashSet<JobType>,
    tick: Tick,
    config: &SimulationConfig,
) -> Option<JobId> {
    let ranked = {
        let candidates = registry.query_candidates(enabled, stockpiles, recipes);
        if candidates.is_empty() {
            return None;
        }
        rank_candidates(&candidates, pos, traits, tick, config)
    };

    for id in ranked.into_iter().take(config.claim_attempts_per_tick) {
        if registry.claim(id, agent, tick).is_ok() {
            return Some(id);
        }
    }
    None
}
