//! Vital needs that can preempt job execution

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;

/// Hunger and fatigue on a 0..1 scale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Needs {
    /// 0.0 = fed, 1.0 = starving
    pub hunger: f32,
    /// 0.0 = fresh, 1.0 = exhausted
    pub fatigue: f32,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            hunger: 0.1,
            fatigue: 0.0,
        }
    }
}

impl Needs {
    /// Advance needs one tick. Working agents tire; idle ones recover.
    pub fn tick(&mut self, config: &SimulationConfig, working: bool) {
        self.hunger = (self.hunger + config.hunger_per_tick).min(1.0);
        if working {
            self.fatigue = (self.fatigue + config.fatigue_per_work_tick).min(1.0);
        } else {
            self.fatigue = (self.fatigue - config.fatigue_recovery_per_tick).max(0.0);
        }
    }

    /// True once hunger crosses the preemption threshold
    pub fn needs_food(&self, config: &SimulationConfig) -> bool {
        self.hunger >= config.hunger_preempt_threshold
    }

    pub fn is_starving(&self) -> bool {
        self.hunger >= 1.0
    }

    /// Consume one food unit's worth of nutrition
    pub fn eat(&mut self, nutrition: f32) {
        self.hunger = (self.hunger - nutrition).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hunger_accumulates_to_threshold() {
        let config = SimulationConfig::default();
        let mut needs = Needs {
            hunger: 0.0,
            fatigue: 0.0,
        };
        assert!(!needs.needs_food(&config));

        let ticks_needed =
            (config.hunger_preempt_threshold / config.hunger_per_tick).ceil() as u32;
        for _ in 0..ticks_needed {
            needs.tick(&config, true);
        }
        assert!(needs.needs_food(&config));
    }

    #[test]
    fn test_eat_reduces_hunger() {
        let config = SimulationConfig::default();
        let mut needs = Needs {
            hunger: 0.8,
            fatigue: 0.0,
        };
        needs.eat(config.meal_nutrition);
        assert!(!needs.needs_food(&config));
        assert!(needs.hunger > 0.0);

        needs.eat(10.0);
        assert_eq!(needs.hunger, 0.0);
    }

    #[test]
    fn test_fatigue_rises_working_recovers_idle() {
        let config = SimulationConfig::default();
        let mut needs = Needs::default();
        for _ in 0..100 {
            needs.tick(&config, true);
        }
        let tired = needs.fatigue;
        assert!(tired > 0.0);

        for _ in 0..100 {
            needs.tick(&config, false);
        }
        assert!(needs.fatigue < tired);
    }
}
