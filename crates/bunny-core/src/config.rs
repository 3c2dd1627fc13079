//! Configuration types for the simulation.

use crate::{Error, Kind, Result};
use serde::{Deserialize, Serialize};

/// Largest grid `validate` accepts, in cells
pub const MAX_GRID_CELLS: usize = 1 << 24;

/// World configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the world grid
    pub width: i32,
    /// Height of the world grid
    pub height: i32,
}

impl WorldConfig {
    /// Number of cells on the grid
    pub fn capacity(&self) -> usize {
        (self.width.max(0) as usize).saturating_mul(self.height.max(0) as usize)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
        }
    }
}

/// Aging, death and breeding parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Non-infected agents die once their age exceeds this
    pub death_age: u32,
    /// Infected agents die once their age reaches this
    pub infected_death_age: u32,
    /// Minimum age to breed, to attack, and to count as an adult in combat
    pub breeding_age: u32,
    /// Chance a newborn (or seeded agent) is infected regardless of its parents
    pub mutation_probability: f64,
    /// Fathers must share the mother's kind
    pub require_same_kind: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            death_age: 10,
            infected_death_age: 50,
            breeding_age: 2,
            mutation_probability: 0.02,
            require_same_kind: false,
        }
    }
}

/// When a pressure release ("long hard winter") fires
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureTrigger {
    /// Population strictly above a fixed count
    Absolute(usize),
    /// Population strictly above this fraction of grid capacity
    Fraction(f64),
}

impl PressureTrigger {
    pub fn is_exceeded(&self, population: usize, capacity: usize) -> bool {
        match *self {
            PressureTrigger::Absolute(limit) => population > limit,
            PressureTrigger::Fraction(fraction) => population as f64 > fraction * capacity as f64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureConfig {
    pub trigger: PressureTrigger,
    /// Fraction of the pre-release population that survives
    pub target_fraction: f64,
}

impl PressureConfig {
    /// Population left after a release starting from `population` agents (rounded down)
    pub fn target(&self, population: usize) -> usize {
        (population as f64 * self.target_fraction).floor() as usize
    }
}

impl Default for PressureConfig {
    fn default() -> Self {
        Self {
            trigger: PressureTrigger::Absolute(1000),
            target_fraction: 0.5,
        }
    }
}

/// Which interaction model runs after breeding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictModel {
    /// Infected agents convert one neighbor each per turn
    Infection,
    /// Adult males attack a random neighbor
    Combat,
}

/// Apex predator parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApexConfig {
    pub enabled: bool,
    /// Chebyshev radius of the strike around the apex; also the margin of its track
    pub effect_radius: i32,
    /// House that is warded by the apex instead of killed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward_kind: Option<Kind>,
}

impl Default for ApexConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            effect_radius: 2,
            ward_kind: Some(Kind::Targaryen),
        }
    }
}

/// How the initial population is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPlan {
    /// `count` agents with random sex, house and color
    Random { count: usize },
    /// One male and one female per house
    PairPerHouse,
}

impl SeedPlan {
    pub fn population(&self) -> usize {
        match self {
            SeedPlan::Random { count } => *count,
            SeedPlan::PairPerHouse => Kind::HOUSES.len() * 2,
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of turns the driver runs (0 = until the population dies out)
    pub num_turns: u64,
    /// Random seed for reproducibility
    pub seed: u64,
    pub world: WorldConfig,
    pub lifecycle: LifecycleConfig,
    pub pressure: PressureConfig,
    /// Radius of the breeding/infection/combat neighborhood
    pub neighborhood_radius: i32,
    pub conflict: ConflictModel,
    pub apex: ApexConfig,
    pub seed_plan: SeedPlan,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::infection()
    }
}

impl SimulationConfig {
    /// Open-breeding world where infection spreads ring by ring
    pub fn infection() -> Self {
        Self {
            num_turns: 0,
            seed: 0,
            world: WorldConfig::default(),
            lifecycle: LifecycleConfig::default(),
            pressure: PressureConfig::default(),
            neighborhood_radius: 1,
            conflict: ConflictModel::Infection,
            apex: ApexConfig::default(),
            seed_plan: SeedPlan::Random { count: 5 },
        }
    }

    /// House-bound breeding, combat between houses and a dragon on patrol
    pub fn combat() -> Self {
        Self {
            num_turns: 0,
            seed: 0,
            world: WorldConfig {
                width: 75,
                height: 75,
            },
            lifecycle: LifecycleConfig {
                require_same_kind: true,
                ..LifecycleConfig::default()
            },
            pressure: PressureConfig {
                trigger: PressureTrigger::Fraction(0.9),
                target_fraction: 0.5,
            },
            neighborhood_radius: 1,
            conflict: ConflictModel::Combat,
            apex: ApexConfig {
                enabled: true,
                ..ApexConfig::default()
            },
            seed_plan: SeedPlan::PairPerHouse,
        }
    }

    /// Agents present before the first turn, including the apex
    pub fn seed_population(&self) -> usize {
        self.seed_plan.population() + usize::from(self.apex.enabled)
    }

    /// Reject configurations that cannot run, before any turn is played
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        if self.world.width <= 0 || self.world.height <= 0 {
            return invalid(format!(
                "grid must be non-empty, got {}x{}",
                self.world.width, self.world.height
            ));
        }
        if self.world.capacity() > MAX_GRID_CELLS {
            return invalid(format!(
                "grid of {}x{} exceeds the limit of {} cells",
                self.world.width, self.world.height, MAX_GRID_CELLS
            ));
        }
        if !(0.0..=1.0).contains(&self.lifecycle.mutation_probability) {
            return invalid(format!(
                "mutation_probability must be within [0, 1], got {}",
                self.lifecycle.mutation_probability
            ));
        }
        if !(0.0..=1.0).contains(&self.pressure.target_fraction) {
            return invalid(format!(
                "target_fraction must be within [0, 1], got {}",
                self.pressure.target_fraction
            ));
        }
        if let PressureTrigger::Fraction(fraction) = self.pressure.trigger {
            if !(fraction.is_finite() && fraction > 0.0) {
                return invalid(format!("pressure fraction must be positive, got {fraction}"));
            }
        }
        if self.neighborhood_radius < 1 {
            return invalid(format!(
                "neighborhood_radius must be at least 1, got {}",
                self.neighborhood_radius
            ));
        }
        let side = self.world.width.max(self.world.height);
        if self.neighborhood_radius > side {
            return invalid(format!(
                "neighborhood_radius {} is larger than the grid side {}",
                self.neighborhood_radius, side
            ));
        }
        if self.apex.enabled {
            let radius = self.apex.effect_radius;
            if radius < 0 {
                return invalid(format!("apex effect_radius must not be negative, got {radius}"));
            }
            if self.world.width != self.world.height {
                return invalid("the apex track needs a square grid".to_string());
            }
            if radius > self.world.width {
                return invalid(format!(
                    "apex effect_radius {} is larger than the grid side {}",
                    radius, self.world.width
                ));
            }
            if self.world.width < radius.saturating_mul(2).saturating_add(2) {
                return invalid(format!(
                    "grid of size {} is too small for an apex track with margin {}",
                    self.world.width, radius
                ));
            }
            if let Some(ward) = self.apex.ward_kind {
                if !ward.is_house() {
                    return invalid(format!("ward kind must be a house, got {ward}"));
                }
            }
        }
        if self.seed_population() > self.world.capacity() {
            return invalid(format!(
                "seed population {} exceeds grid capacity {}",
                self.seed_population(),
                self.world.capacity()
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(SimulationConfig::infection().validate().is_ok());
        assert!(SimulationConfig::combat().validate().is_ok());
        assert_eq!(SimulationConfig::combat().seed_population(), 9);
    }

    #[test]
    fn test_pressure_trigger() {
        let absolute = PressureTrigger::Absolute(1000);
        assert!(!absolute.is_exceeded(1000, 2500));
        assert!(absolute.is_exceeded(1001, 2500));

        let fraction = PressureTrigger::Fraction(0.9);
        assert!(!fraction.is_exceeded(90, 100));
        assert!(fraction.is_exceeded(91, 100));
    }

    #[test]
    fn test_pressure_target_rounds_down() {
        let pressure = PressureConfig::default();
        assert_eq!(pressure.target(1001), 500);
        assert_eq!(pressure.target(7), 3);
    }

    #[test]
    fn test_seed_population_over_capacity_rejected() {
        let config = SimulationConfig {
            world: WorldConfig {
                width: 2,
                height: 2,
            },
            seed_plan: SeedPlan::Random { count: 5 },
            ..SimulationConfig::infection()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_values_rejected() {
        let mut huge = SimulationConfig::infection();
        huge.world = WorldConfig {
            width: 50_000,
            height: 50_000,
        };
        assert!(matches!(huge.validate(), Err(Error::InvalidConfig(_))));

        let mut wide = SimulationConfig::infection();
        wide.world = WorldConfig {
            width: i32::MAX,
            height: i32::MAX,
        };
        assert!(matches!(wide.validate(), Err(Error::InvalidConfig(_))));

        let mut reach = SimulationConfig::infection();
        reach.neighborhood_radius = i32::MAX;
        assert!(matches!(reach.validate(), Err(Error::InvalidConfig(_))));

        let mut strike = SimulationConfig::combat();
        strike.apex.effect_radius = 1_500_000_000;
        assert!(matches!(strike.validate(), Err(Error::InvalidConfig(_))));

        let mut widest = SimulationConfig::infection();
        widest.neighborhood_radius = 50;
        assert!(widest.validate().is_ok());
    }

    #[test]
    fn test_apex_needs_square_grid() {
        let mut config = SimulationConfig::combat();
        config.world.height = 60;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::combat();
        config.world = WorldConfig {
            width: 5,
            height: 5,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_probability_bounds() {
        let mut config = SimulationConfig::infection();
        config.lifecycle.mutation_probability = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = SimulationConfig::combat();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"world": {"width": 20}, "conflict": "combat"}"#).unwrap();
        assert_eq!(config.world.width, 20);
        assert_eq!(config.world.height, 50);
        assert_eq!(config.conflict, ConflictModel::Combat);
        assert_eq!(config.lifecycle.death_age, 10);
    }
}
