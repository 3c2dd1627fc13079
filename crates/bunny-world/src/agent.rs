//! Agent state and the newborn trait rule.

use crate::rng::{random_color, random_house, random_name, random_sex, RandomSource};
use bunny_core::{AgentId, Color, Kind, LifecycleConfig, Position, Sex};
use serde::{Deserialize, Serialize};

/// A bunny in the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub sex: Sex,
    pub age: u32,
    pub color: Color,
    pub kind: Kind,
    /// Wins every fight until the end of the next combat phase
    #[serde(default)]
    pub invincible: bool,
    /// Cell currently holding this agent; maintained by the world
    #[serde(default)]
    pub(crate) position: Option<Position>,
}

impl Agent {
    pub fn new(id: AgentId, name: String, sex: Sex, color: Color, kind: Kind) -> Self {
        Self {
            id,
            name,
            sex,
            age: 0,
            color,
            kind,
            invincible: false,
            position: None,
        }
    }

    /// Fresh agent with a random id and name
    pub fn spawn<R: RandomSource + ?Sized>(rng: &mut R, sex: Sex, color: Color, kind: Kind) -> Self {
        let id = AgentId::from_random_bits(rng.next_u128());
        Self::new(id, random_name(rng), sex, color, kind)
    }

    /// Seed-time agent: random sex, and either a random house and color or,
    /// with `infection_probability`, an infected agent
    pub fn random<R: RandomSource + ?Sized>(rng: &mut R, infection_probability: f64) -> Self {
        let sex = random_sex(rng);
        if rng.uniform_bool(infection_probability) {
            Self::spawn(rng, sex, Color::White, Kind::WhiteWalker)
        } else {
            let color = random_color(rng);
            let kind = random_house(rng);
            Self::spawn(rng, sex, color, kind)
        }
    }

    /// The apex predator
    pub fn apex<R: RandomSource + ?Sized>(rng: &mut R) -> Self {
        Self::spawn(rng, Sex::Male, Color::Red, Kind::Dragon)
    }

    /// Newborn of a mother with `mother_color` and a father of `father_kind`.
    ///
    /// Sex is a fair coin. With `mutation_probability` the newborn is infected
    /// (and white) regardless of its parents.
    pub fn newborn<R: RandomSource + ?Sized>(
        rng: &mut R,
        mother_color: Color,
        father_kind: Kind,
        mutation_probability: f64,
    ) -> Self {
        let sex = random_sex(rng);
        if rng.uniform_bool(mutation_probability) {
            Self::spawn(rng, sex, Color::White, Kind::WhiteWalker)
        } else {
            Self::spawn(rng, sex, mother_color, father_kind)
        }
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn tick(&mut self) {
        self.age += 1;
    }

    pub fn is_adult(&self, lifecycle: &LifecycleConfig) -> bool {
        self.age >= lifecycle.breeding_age
    }

    /// Old enough to die this turn
    pub fn is_past_lifespan(&self, lifecycle: &LifecycleConfig) -> bool {
        if self.kind.is_immortal() {
            false
        } else if self.kind.is_infected() {
            self.age >= lifecycle.infected_death_age
        } else {
            self.age > lifecycle.death_age
        }
    }

    pub fn is_breeding_female(&self, lifecycle: &LifecycleConfig) -> bool {
        self.kind.is_breedable() && self.sex == Sex::Female && self.is_adult(lifecycle)
    }

    /// Adult male of a breedable kind: a candidate father, and an attacker in combat
    pub fn is_breeding_male(&self, lifecycle: &LifecycleConfig) -> bool {
        self.kind.is_breedable() && self.sex == Sex::Male && self.is_adult(lifecycle)
    }

    /// Turn into the infected kind, keeping name, sex and age
    pub fn turn_infected(&mut self) {
        self.kind = Kind::WhiteWalker;
        self.color = Color::White;
        self.invincible = false;
    }

    pub fn glyph(&self, lifecycle: &LifecycleConfig) -> char {
        self.kind.glyph(self.is_adult(lifecycle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn agent(kind: Kind, sex: Sex, age: u32) -> Agent {
        let mut a = Agent::new(AgentId::new(), "TEST".to_string(), sex, Color::Grey, kind);
        a.age = age;
        a
    }

    #[test]
    fn test_agent_creation() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let agent = Agent::spawn(&mut rng, Sex::Female, Color::Gold, Kind::Stark);
        assert_eq!(agent.age, 0);
        assert_eq!(agent.kind, Kind::Stark);
        assert!(agent.position().is_none());
        assert!(!agent.invincible);
    }

    #[test]
    fn test_lifespan_boundaries() {
        let lifecycle = LifecycleConfig::default();
        assert!(!agent(Kind::Stark, Sex::Male, 10).is_past_lifespan(&lifecycle));
        assert!(agent(Kind::Stark, Sex::Male, 11).is_past_lifespan(&lifecycle));
        assert!(!agent(Kind::WhiteWalker, Sex::Male, 49).is_past_lifespan(&lifecycle));
        assert!(agent(Kind::WhiteWalker, Sex::Male, 50).is_past_lifespan(&lifecycle));
        assert!(!agent(Kind::Dragon, Sex::Male, 10_000).is_past_lifespan(&lifecycle));
    }

    #[test]
    fn test_breeding_roles() {
        let lifecycle = LifecycleConfig::default();
        assert!(agent(Kind::Lannister, Sex::Female, 2).is_breeding_female(&lifecycle));
        assert!(!agent(Kind::Lannister, Sex::Female, 1).is_breeding_female(&lifecycle));
        assert!(!agent(Kind::WhiteWalker, Sex::Female, 5).is_breeding_female(&lifecycle));
        assert!(agent(Kind::Targaryen, Sex::Male, 3).is_breeding_male(&lifecycle));
        assert!(!agent(Kind::Dragon, Sex::Male, 3).is_breeding_male(&lifecycle));
    }

    #[test]
    fn test_newborn_inherits_mother_color_and_father_kind() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..50 {
            let baby = Agent::newborn(&mut rng, Color::Silver, Kind::Baratheon, 0.0);
            assert_eq!(baby.color, Color::Silver);
            assert_eq!(baby.kind, Kind::Baratheon);
            assert_eq!(baby.age, 0);
        }
    }

    #[test]
    fn test_newborn_mutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let baby = Agent::newborn(&mut rng, Color::Silver, Kind::Baratheon, 1.0);
        assert_eq!(baby.kind, Kind::WhiteWalker);
        assert_eq!(baby.color, Color::White);
    }

    #[test]
    fn test_turn_infected_keeps_identity() {
        let mut a = agent(Kind::Targaryen, Sex::Female, 4);
        a.invincible = true;
        let id = a.id;
        a.turn_infected();
        assert_eq!(a.id, id);
        assert_eq!(a.age, 4);
        assert_eq!(a.sex, Sex::Female);
        assert_eq!(a.kind, Kind::WhiteWalker);
        assert!(!a.invincible);
    }
}
