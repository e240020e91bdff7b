//! The shared job pool
//!
//! All producers insert through here, all agents claim through here, and
//! nothing else mutates a job's claimant. Claims are compare-and-set;
//! the stale-claim sweep is the pool's only liveness guarantee against
//! agents that die or wedge mid-job.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::jobs::job::{BlockReason, Job, JobType};
use crate::recipes::RecipeCatalog;
use crate::storage::Stockpiles;
use crate::core::types::{AgentId, JobId, Tick, TilePos};
use crate::world::StructureKind;

pub use crate::jobs::job::{HaulCargo, HaulSource, JobPayload};

/// A job force-released by the stale-claim sweep
#[derive(Debug, Clone, Copy)]
pub struct ExpiredClaim {
    pub job: JobId,
    pub agent: AgentId,
}

/// High bits of registry-assigned job ids
const JOB_ID_NAMESPACE: u128 = 0x5c7a_9b00_0000_0000_0000_0000_0000_0000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRegistry {
    jobs: AHashMap<JobId, Job>,
    next_seq: u64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a job into the pool. Fails only on malformed metadata.
    ///
    /// The final id is derived from the insertion sequence, not random,
    /// so a restored snapshot assigns the same ids to the same future
    /// insertions and replays bit-identically.
    pub fn insert(&mut self, mut job: Job) -> Result<JobId> {
        job.validate().map_err(SimError::MalformedJob)?;
        job.seq = self.next_seq;
        job.id = JobId(uuid::Uuid::from_u128(
            JOB_ID_NAMESPACE | u128::from(self.next_seq),
        ));
        self.next_seq += 1;
        let id = job.id;
        tracing::debug!(job = ?id, kind = %job.job_type, "job inserted");
        self.jobs.insert(id, job);
        Ok(id)
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// Unclaimed jobs eligible for `enabled` job types whose prerequisite
    /// materials are plausibly available (cheap existence check, not a
    /// reservation). Sorted by insertion order; scoring re-ranks them.
    pub fn query_candidates(
        &self,
        enabled: &AHashSet<JobType>,
        stockpiles: &Stockpiles,
        recipes: &RecipeCatalog,
    ) -> Vec<&Job> {
        let mut out: Vec<&Job> = self
            .jobs
            .values()
            .filter(|j| !j.is_claimed() && j.wait_timer == 0 && enabled.contains(&j.job_type))
            .filter(|j| Self::plausibly_supplied(j, stockpiles, recipes))
            .collect();
        out.sort_by_key(|j| j.seq);
        out
    }

    fn plausibly_supplied(job: &Job, stockpiles: &Stockpiles, recipes: &RecipeCatalog) -> bool {
        match (&job.job_type, &job.payload) {
            (JobType::Build, JobPayload::Build { structure }) => structure
                .materials()
                .iter()
                .all(|req| stockpiles.plausibly_available(&req.key, req.amount)),
            (JobType::Craft, JobPayload::Craft { recipe_id }) => match recipes.get(recipe_id) {
                Some(recipe) => recipe
                    .inputs
                    .iter()
                    .all(|req| stockpiles.plausibly_available(&req.key, req.amount)),
                None => false,
            },
            (JobType::Equip, JobPayload::Equip { tags }) => {
                stockpiles.total_matching_items(tags) >= 1
            }
            _ => true,
        }
    }

    /// Atomic compare-and-set claim. Fails if another agent got there
    /// first within this tick's update loop.
    pub fn claim(&mut self, id: JobId, agent: AgentId, tick: Tick) -> Result<()> {
        let job = self.jobs.get_mut(&id).ok_or(SimError::JobNotFound(id))?;
        if job.claimant.is_some() {
            return Err(SimError::AlreadyClaimed(id));
        }
        job.claimant = Some(agent);
        job.claim_tick = Some(tick);
        job.last_activity_tick = Some(tick);
        Ok(())
    }

    /// Clear the claimant without removing the job
    pub fn release(&mut self, id: JobId) {
        if let Some(job) = self.jobs.get_mut(&id) {
            job.claimant = None;
            job.claim_tick = None;
            job.blocked = None;
        }
    }

    /// Clear the claimant and keep the job out of candidate queries for
    /// `cooldown` ticks. Used for unreachable targets and requeues.
    pub fn release_with_cooldown(&mut self, id: JobId, cooldown: u32) {
        if let Some(job) = self.jobs.get_mut(&id) {
            job.claimant = None;
            job.claim_tick = None;
            job.blocked = None;
            job.wait_timer = cooldown;
        }
    }

    /// Remove a job from the pool entirely
    pub fn remove(&mut self, id: JobId) -> Option<Job> {
        self.jobs.remove(&id)
    }

    /// Return a checked-out job without touching its sequence number.
    /// The state machine removes a job while its engine runs, then puts
    /// it back here.
    pub(crate) fn put_back(&mut self, job: Job) {
        self.jobs.insert(job.id, job);
    }

    /// Record engine activity so the stale sweep leaves the claim alone
    pub fn touch(&mut self, id: JobId, tick: Tick) {
        if let Some(job) = self.jobs.get_mut(&id) {
            job.last_activity_tick = Some(tick);
        }
    }

    /// Force-release claims that made no progress for `max_age` ticks.
    /// Runs before the tick's claim pass so freed jobs are immediately
    /// visible. Returns the released claims, oldest insertion first.
    pub fn expire_stale(&mut self, tick: Tick, max_age: Tick) -> Vec<ExpiredClaim> {
        let mut expired: Vec<(u64, ExpiredClaim)> = Vec::new();
        for job in self.jobs.values_mut() {
            let agent = match job.claimant {
                Some(a) => a,
                None => continue,
            };
            let last = job.last_activity_tick.or(job.claim_tick).unwrap_or(0);
            if tick.saturating_sub(last) > max_age {
                tracing::warn!(job = ?job.id, agent = ?agent, "stale claim force-released");
                job.claimant = None;
                job.claim_tick = None;
                job.blocked = None;
                // Reset per-claimant bookkeeping; committed inputs and
                // finished goods survive so nothing is double-consumed
                // or lost when another agent resumes the job.
                job.exec.reservations.clear();
                job.exec.inputs_reserved = false;
                job.exec.wait_ticks = 0;
                job.exec.picked_up = false;
                job.exec.research_done = false;
                expired.push((job.seq, ExpiredClaim { job: job.id, agent }));
            }
        }
        expired.sort_by_key(|(seq, _)| *seq);
        expired.into_iter().map(|(_, e)| e).collect()
    }

    /// Count down claim cooldowns. Called once per tick before claims.
    pub fn tick_timers(&mut self) {
        for job in self.jobs.values_mut() {
            if job.wait_timer > 0 {
                job.wait_timer -= 1;
            }
        }
    }

    /// True if any haul job (claimed or not) picks up at `pos`
    pub fn has_haul_from(&self, pos: TilePos) -> bool {
        self.jobs.values().any(|j| {
            matches!(
                &j.payload,
                JobPayload::Haul { source, .. } if source.pos() == pos
            )
        })
    }

    /// True if an unfinished build job targets `pos`
    pub fn has_build_at(&self, pos: TilePos) -> bool {
        self.jobs
            .values()
            .any(|j| j.job_type == JobType::Build && j.target == pos)
    }

    /// Diagnostic roll-up: how many jobs are stuck, by reason
    pub fn blocked_counts(&self) -> Vec<(BlockReason, usize)> {
        let mut counts: AHashMap<BlockReason, usize> = AHashMap::new();
        for job in self.jobs.values() {
            if let Some(reason) = job.blocked {
                *counts.entry(reason).or_insert(0) += 1;
            }
        }
        let mut out: Vec<_> = counts.into_iter().collect();
        out.sort_by_key(|(r, _)| format!("{}", r));
        out
    }

    /// Convenience for producers: designate a build at a blueprint tile
    pub fn designate_build(
        &mut self,
        structure: StructureKind,
        pos: TilePos,
        priority: f32,
        tick: Tick,
    ) -> Result<JobId> {
        self.insert(Job::new(
            JobType::Build,
            JobPayload::Build { structure },
            pos,
            priority,
            structure.work_required(),
            tick,
        ))
    }
}
