//! Colonist model
//!
//! An agent owns at most one job claim at a time. Trait weights come from
//! an external personality generator and are consumed here as opaque
//! numbers; the claim protocol adds them into its score.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::agents::needs::Needs;
use crate::items::{ItemInstance, ResourceType};
use crate::jobs::job::{JobCategory, JobType};
use crate::core::types::{AgentId, JobId, ReservationId, TilePos};

/// Lifecycle states of the execution state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentState {
    Idle,
    Evaluating,
    Moving,
    Executing,
    Completing,
    Abandoning,
    /// A vital need interrupted the current job
    Preempted,
}

/// Opaque scoring weights from the personality generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerTraits {
    /// Work-rate multiplier applied to each executing tick
    pub speed: f32,
    /// Additive claim-score bonus per job category
    bonuses: AHashMap<JobCategory, f32>,
}

impl Default for WorkerTraits {
    fn default() -> Self {
        Self {
            speed: 1.0,
            bonuses: AHashMap::new(),
        }
    }
}

impl WorkerTraits {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            bonuses: AHashMap::new(),
        }
    }

    pub fn scoring_bias(&self, category: JobCategory) -> f32 {
        self.bonuses.get(&category).copied().unwrap_or(0.0)
    }

    pub fn set_bias(&mut self, category: JobCategory, bonus: f32) {
        self.bonuses.insert(category, bonus);
    }
}

/// Goods an agent carries between haul phases
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CarriedGoods {
    Resource { resource: ResourceType, amount: u32 },
    Item(ItemInstance),
}

/// The food-fetch detour taken while preempted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodErrand {
    pub dest: TilePos,
    pub reservation: ReservationId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub pos: TilePos,
    pub state: AgentState,
    pub current_job: Option<JobId>,
    /// Job types this colonist opts into
    pub enabled_jobs: AHashSet<JobType>,
    pub traits: WorkerTraits,
    pub needs: Needs,
    pub carrying: Option<CarriedGoods>,
    pub equipment: Vec<ItemInstance>,
    /// Remaining route, consumed front to back
    pub path: Vec<TilePos>,
    pub errand: Option<FoodErrand>,
    pub health: f32,
    pub alive: bool,
}

impl Agent {
    pub fn new(name: impl Into<String>, pos: TilePos) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            pos,
            state: AgentState::Idle,
            current_job: None,
            enabled_jobs: JobType::all().into_iter().collect(),
            traits: WorkerTraits::default(),
            needs: Needs::default(),
            carrying: None,
            equipment: Vec::new(),
            path: Vec::new(),
            errand: None,
            health: 100.0,
            alive: true,
        }
    }

    pub fn with_traits(mut self, traits: WorkerTraits) -> Self {
        self.traits = traits;
        self
    }

    pub fn with_enabled_jobs(mut self, types: impl IntoIterator<Item = JobType>) -> Self {
        self.enabled_jobs = types.into_iter().collect();
        self
    }

    pub fn is_idle(&self) -> bool {
        self.current_job.is_none() && matches!(self.state, AgentState::Idle)
    }

    /// Follow one step of the current route. Returns the tile stepped to.
    pub fn step_path(&mut self) -> Option<TilePos> {
        if self.path.is_empty() {
            return None;
        }
        let next = self.path.remove(0);
        self.pos = next;
        Some(next)
    }

    pub fn has_equipped(&self, tag: &str) -> bool {
        self.equipment.iter().any(|i| i.has_tag(tag))
    }
}
