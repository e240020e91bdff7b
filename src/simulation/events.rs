//! Events generated during simulation ticks
//!
//! Returned by `run_tick` for logging and diagnostics; the scheduling
//! core itself never reads them back.

use crate::jobs::job::{BlockReason, JobType};
use crate::core::types::{AgentId, JobId, TilePos};

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A producer inserted a job into the registry
    JobInserted { job: JobId, kind: JobType },
    /// An agent won the claim race for a job
    JobClaimed { job: JobId, agent: AgentId },
    /// A job finished and was removed
    JobCompleted {
        job: JobId,
        kind: JobType,
        agent: AgentId,
    },
    /// A claim was given up; the job was requeued or deleted
    JobAbandoned {
        job: JobId,
        agent: AgentId,
        reason: BlockReason,
        requeued: bool,
    },
    /// The stale-claim sweep force-released a claim
    ClaimExpired { job: JobId, agent: AgentId },
    /// An executing job entered a blocked state
    JobBlocked { job: JobId, reason: BlockReason },
    /// Hunger pulled an agent off its work
    AgentPreempted { agent: AgentId },
    AgentAte { agent: AgentId },
    AgentStarved { agent: AgentId },
    /// A filter change queued a relocation haul
    RelocationQueued { job: JobId, from: TilePos },
}
