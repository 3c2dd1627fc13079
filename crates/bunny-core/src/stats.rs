//! Per-turn statistics and population census.

use crate::{Kind, Sex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why an agent left the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    OldAge,
    PressureRelease,
    Combat,
    ApexStrike,
}

impl DeathCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeathCause::OldAge => "old_age",
            DeathCause::PressureRelease => "pressure_release",
            DeathCause::Combat => "combat",
            DeathCause::ApexStrike => "apex_strike",
        }
    }
}

/// What happened during one turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnStats {
    pub turn: u64,
    pub births: u32,
    pub deaths_old_age: u32,
    pub deaths_pressure: u32,
    pub deaths_combat: u32,
    pub deaths_apex: u32,
    pub conversions: u32,
    /// Population after the turn
    pub population: usize,
    /// Relocation was skipped because the population exceeded the grid
    pub capacity_warning: bool,
}

impl TurnStats {
    pub fn new(turn: u64) -> Self {
        Self {
            turn,
            ..Self::default()
        }
    }

    pub fn record_death(&mut self, cause: DeathCause) {
        match cause {
            DeathCause::OldAge => self.deaths_old_age += 1,
            DeathCause::PressureRelease => self.deaths_pressure += 1,
            DeathCause::Combat => self.deaths_combat += 1,
            DeathCause::ApexStrike => self.deaths_apex += 1,
        }
    }

    pub fn total_deaths(&self) -> u32 {
        self.deaths_old_age + self.deaths_pressure + self.deaths_combat + self.deaths_apex
    }
}

/// Head count of a population, broken down by kind and sex
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Census {
    pub total: usize,
    pub males: usize,
    pub females: usize,
    pub adults: usize,
    pub by_kind: BTreeMap<String, usize>,
    total_age: u64,
}

impl Census {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one agent; `adult_age` is the breeding age
    pub fn record(&mut self, kind: Kind, sex: Sex, age: u32, adult_age: u32) {
        self.total += 1;
        match sex {
            Sex::Male => self.males += 1,
            Sex::Female => self.females += 1,
        }
        if age >= adult_age {
            self.adults += 1;
        }
        *self.by_kind.entry(kind.name().to_string()).or_insert(0) += 1;
        self.total_age += age as u64;
    }

    pub fn count_of(&self, kind: Kind) -> usize {
        self.by_kind.get(kind.name()).copied().unwrap_or(0)
    }

    pub fn mean_age(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.total_age as f64 / self.total as f64
        }
    }

    /// Houses still represented, i.e. the ones not yet wiped out
    pub fn surviving_houses(&self) -> Vec<Kind> {
        Kind::HOUSES
            .into_iter()
            .filter(|kind| self.count_of(*kind) > 0)
            .collect()
    }
}
