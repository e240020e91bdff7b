//! Job model: a schedulable unit of work
//!
//! Jobs are anchored to a tile (or a mobile target entity for hunts) and
//! carry typed metadata for their execution engine. A job is claimed by at
//! most one agent at a time; the registry enforces that.

use serde::{Deserialize, Serialize};

use crate::items::{ItemInstance, ResourceType, Tag};
use crate::core::types::{AgentId, AnimalId, ItemId, JobId, ReservationId, Tick, TilePos};
use crate::world::StructureKind;

/// The seven kinds of work colonists perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    Build,
    Haul,
    Craft,
    Harvest,
    Salvage,
    Hunt,
    Equip,
}

impl JobType {
    /// Category used for per-agent opt-in and trait bonuses
    pub fn category(&self) -> JobCategory {
        match self {
            JobType::Build => JobCategory::Construction,
            JobType::Haul => JobCategory::Hauling,
            JobType::Craft => JobCategory::Crafting,
            JobType::Harvest | JobType::Salvage => JobCategory::Harvesting,
            JobType::Hunt => JobCategory::Hunting,
            JobType::Equip => JobCategory::Equipment,
        }
    }

    /// Whether an abandoned job of this type goes back to the pool.
    /// Hunt and equip targets are volatile, so those jobs are deleted.
    pub fn tolerates_requeue(&self) -> bool {
        !matches!(self, JobType::Hunt | JobType::Equip)
    }

    pub fn all() -> [JobType; 7] {
        [
            JobType::Build,
            JobType::Haul,
            JobType::Craft,
            JobType::Harvest,
            JobType::Salvage,
            JobType::Hunt,
            JobType::Equip,
        ]
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobType::Build => "build",
            JobType::Haul => "haul",
            JobType::Craft => "craft",
            JobType::Harvest => "harvest",
            JobType::Salvage => "salvage",
            JobType::Hunt => "hunt",
            JobType::Equip => "equip",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobCategory {
    Construction,
    Hauling,
    Crafting,
    Harvesting,
    Hunting,
    Equipment,
}

/// Why an executing job cannot currently proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockReason {
    MissingMaterials,
    NoStorage,
    InvalidTarget,
    Unreachable,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BlockReason::MissingMaterials => "missing-materials",
            BlockReason::NoStorage => "no-storage",
            BlockReason::InvalidTarget => "invalid-target",
            BlockReason::Unreachable => "unreachable",
        };
        write!(f, "{}", s)
    }
}

/// What a hauling job carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HaulCargo {
    Resource { resource: ResourceType, amount: u32 },
    Item { item_id: ItemId },
}

/// Where a hauling job picks up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HaulSource {
    /// A loose pile or item on the ground
    Ground(TilePos),
    /// A stockpile cell; pick-up goes through the reservation ledger
    Stockpile(TilePos),
}

impl HaulSource {
    pub fn pos(&self) -> TilePos {
        match self {
            HaulSource::Ground(p) | HaulSource::Stockpile(p) => *p,
        }
    }
}

/// Typed metadata per job type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobPayload {
    Build {
        structure: StructureKind,
    },
    Haul {
        cargo: HaulCargo,
        source: HaulSource,
        /// Chosen at job creation; the engine re-searches once if it
        /// becomes invalid before drop-off
        dest: Option<TilePos>,
    },
    Craft {
        recipe_id: String,
    },
    Harvest,
    Salvage,
    Hunt {
        animal: AnimalId,
    },
    Equip {
        tags: Vec<Tag>,
    },
}

/// Engine bookkeeping that survives snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecState {
    /// Live input reservations held by this job
    pub reservations: Vec<ReservationId>,
    pub inputs_reserved: bool,
    pub inputs_committed: bool,
    /// Consecutive ticks spent blocked on materials
    pub wait_ticks: u32,
    /// Hauling: pick-up already happened
    pub picked_up: bool,
    /// Hauling/equip: the single destination re-search was used
    pub research_done: bool,
    /// Finished goods awaiting storage space (backpressure)
    pub pending_resources: Vec<(ResourceType, u32)>,
    pub pending_items: Vec<ItemInstance>,
}

impl ExecState {
    pub fn has_pending_output(&self) -> bool {
        !self.pending_resources.is_empty() || !self.pending_items.is_empty()
    }
}

/// A unit of work in the shared pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub job_type: JobType,
    pub payload: JobPayload,
    /// Anchor tile; hunts re-target the animal's live position
    pub target: TilePos,
    /// Higher is more urgent
    pub priority: f32,
    pub required_progress: f32,
    pub accumulated_progress: f32,
    pub claimant: Option<AgentId>,
    /// Tick of the current claim, for staleness detection
    pub claim_tick: Option<Tick>,
    /// Last tick the job made progress or legitimately waited
    pub last_activity_tick: Option<Tick>,
    pub created_tick: Tick,
    /// Insertion sequence assigned by the registry; the scoring tie-break
    pub seq: u64,
    /// Ticks until the job becomes claimable again (cooldowns)
    pub wait_timer: u32,
    /// Diagnostic: why the job is currently stuck, if it is
    pub blocked: Option<BlockReason>,
    pub exec: ExecState,
}

impl Job {
    pub fn new(
        job_type: JobType,
        payload: JobPayload,
        target: TilePos,
        priority: f32,
        required_progress: f32,
        tick: Tick,
    ) -> Self {
        Self {
            id: JobId::new(),
            job_type,
            payload,
            target,
            priority,
            required_progress,
            accumulated_progress: 0.0,
            claimant: None,
            claim_tick: None,
            last_activity_tick: None,
            created_tick: tick,
            seq: 0,
            wait_timer: 0,
            blocked: None,
            exec: ExecState::default(),
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claimant.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.accumulated_progress >= self.required_progress
    }

    /// Structural validity check run at insertion
    pub fn validate(&self) -> Result<(), String> {
        match (&self.job_type, &self.payload) {
            (JobType::Build, JobPayload::Build { .. })
            | (JobType::Harvest, JobPayload::Harvest)
            | (JobType::Salvage, JobPayload::Salvage)
            | (JobType::Hunt, JobPayload::Hunt { .. }) => Ok(()),
            (JobType::Craft, JobPayload::Craft { recipe_id }) => {
                if recipe_id.is_empty() {
                    Err("craft job with empty recipe id".into())
                } else {
                    Ok(())
                }
            }
            (JobType::Haul, JobPayload::Haul { cargo, .. }) => match cargo {
                HaulCargo::Resource { amount: 0, .. } => {
                    Err("haul job with zero amount".into())
                }
                _ => Ok(()),
            },
            (JobType::Equip, JobPayload::Equip { tags }) => {
                if tags.is_empty() {
                    Err("equip job with no tags".into())
                } else {
                    Ok(())
                }
            }
            (ty, payload) => Err(format!(
                "payload {:?} does not match job type {}",
                payload, ty
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(JobType::Build.category(), JobCategory::Construction);
        assert_eq!(JobType::Salvage.category(), JobCategory::Harvesting);
        assert_eq!(JobType::Hunt.category(), JobCategory::Hunting);
    }

    #[test]
    fn test_requeue_tolerance() {
        assert!(JobType::Build.tolerates_requeue());
        assert!(JobType::Haul.tolerates_requeue());
        assert!(!JobType::Hunt.tolerates_requeue());
        assert!(!JobType::Equip.tolerates_requeue());
    }

    #[test]
    fn test_validate_rejects_mismatched_payload() {
        let job = Job::new(
            JobType::Build,
            JobPayload::Harvest,
            TilePos::new(0, 0, 0),
            1.0,
            10.0,
            0,
        );
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_haul() {
        let job = Job::new(
            JobType::Haul,
            JobPayload::Haul {
                cargo: HaulCargo::Resource {
                    resource: ResourceType::Wood,
                    amount: 0,
                },
                source: HaulSource::Ground(TilePos::new(0, 0, 0)),
                dest: None,
            },
            TilePos::new(0, 0, 0),
            1.0,
            10.0,
            0,
        );
        assert!(job.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        let job = Job::new(
            JobType::Equip,
            JobPayload::Equip {
                tags: vec!["weapon".into()],
            },
            TilePos::new(0, 0, 0),
            1.0,
            5.0,
            0,
        );
        assert!(job.validate().is_ok());
    }
}
