//! Simulation configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other.

use crate::core::types::Tick;

/// Configuration for the scheduling core
///
/// These values have been tuned to produce stable colony behavior.
/// Changing them will affect work throughput and pacing.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    // === CLAIM PROTOCOL ===
    /// Score contribution per point of job priority
    ///
    /// At 10.0, one priority level outweighs 20 tiles of distance
    /// (with the default distance_cost of 0.5), so urgent work wins
    /// unless it is very far away.
    pub priority_weight: f32,

    /// Score penalty per tile of Manhattan distance to the job
    ///
    /// Monotonically decreasing distance weight: near jobs are preferred
    /// among equal-priority work without running real pathfinding.
    pub distance_cost: f32,

    /// Score bonus per tick of unclaimed job age
    ///
    /// Keeps old low-priority work from being buried forever under a
    /// steady stream of fresh jobs. Capped by `urgency_cap`.
    pub urgency_rate: f32,

    /// Maximum total urgency bonus a job can accumulate
    pub urgency_cap: f32,

    /// Maximum claim attempts per agent per tick
    ///
    /// When a claim races and loses, the agent falls through to the next
    /// candidate instead of idling. This bounds the retry loop.
    pub claim_attempts_per_tick: usize,

    // === LIVENESS ===
    /// Ticks without progress before a claim is force-released
    ///
    /// The only liveness guarantee against an agent that claimed a job
    /// and then died or got stuck. Must comfortably exceed the longest
    /// legitimate travel time across the map.
    pub stale_claim_max_age: Tick,

    /// Ticks an engine may wait in a missing-materials block before the
    /// job is abandoned and requeued for another agent
    pub material_wait_max: u32,

    /// Cooldown ticks before an unreachable job becomes claimable again
    ///
    /// Prevents thrashing on jobs whose target no route can reach.
    pub unreachable_cooldown: u32,

    /// Cooldown ticks after an ordinary abandonment before re-claim
    pub requeue_cooldown: u32,

    // === WORK RATES ===
    /// Base work units contributed per executing tick, before the
    /// agent's speed trait multiplier
    pub base_work_per_tick: f32,

    /// Damage dealt per attack tick by a hunting colonist
    pub hunt_damage_per_tick: f32,

    // === NEEDS ===
    /// Hunger accumulated per tick (0.0 fed, 1.0 starving)
    ///
    /// At 0.0004 a colonist crosses the preemption threshold in about
    /// 1750 ticks of work, long enough to finish most jobs first.
    pub hunger_per_tick: f32,

    /// Hunger level that preempts the current job for a food errand
    pub hunger_preempt_threshold: f32,

    /// Hunger satisfied by one consumed meal or raw food unit
    pub meal_nutrition: f32,

    /// Fatigue accumulated per executing tick; idle ticks recover it
    pub fatigue_per_work_tick: f32,

    /// Fatigue recovered per idle tick
    pub fatigue_recovery_per_tick: f32,

    // === STORAGE ===
    /// Units of one fungible resource a stockpile cell can hold
    pub cell_capacity: u32,

    /// Discrete item instances a stockpile cell can hold
    pub cell_item_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            // Claim protocol
            priority_weight: 10.0,
            distance_cost: 0.5,
            urgency_rate: 0.01,
            urgency_cap: 5.0,
            claim_attempts_per_tick: 4,

            // Liveness
            stale_claim_max_age: 400,
            material_wait_max: 120,
            unreachable_cooldown: 180,
            requeue_cooldown: 30,

            // Work rates
            base_work_per_tick: 1.0,
            hunt_damage_per_tick: 6.0,

            // Needs
            hunger_per_tick: 0.0004,
            hunger_preempt_threshold: 0.7,
            meal_nutrition: 0.5,
            fatigue_per_work_tick: 0.0006,
            fatigue_recovery_per_tick: 0.002,

            // Storage
            cell_capacity: 100,
            cell_item_capacity: 10,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.claim_attempts_per_tick == 0 {
            return Err("claim_attempts_per_tick must be at least 1".into());
        }

        // A material wait longer than the stale sweep would let the sweep
        // steal jobs that are legitimately waiting.
        if u64::from(self.material_wait_max) >= self.stale_claim_max_age {
            return Err(format!(
                "material_wait_max ({}) must be < stale_claim_max_age ({})",
                self.material_wait_max, self.stale_claim_max_age
            ));
        }

        if !(0.0..=1.0).contains(&self.hunger_preempt_threshold) {
            return Err(format!(
                "hunger_preempt_threshold ({}) must be within 0.0..=1.0",
                self.hunger_preempt_threshold
            ));
        }

        if self.cell_capacity == 0 || self.cell_item_capacity == 0 {
            return Err("cell capacities must be positive".into());
        }

        if self.base_work_per_tick <= 0.0 {
            return Err("base_work_per_tick must be positive".into());
        }

        Ok(())
    }
}
