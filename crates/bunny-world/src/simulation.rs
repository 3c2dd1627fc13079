//! Turn engine for a bunny world.

use crate::agent::Agent;
use crate::apex::ApexTrack;
use crate::grid::Grid;
use crate::lifecycle::{Frame, LifecycleSink};
use crate::population::Population;
use crate::rng::{random_color, take_random, RandomSource};
use crate::snapshot::Snapshot;
use bunny_core::{
    AgentId, ConflictModel, DeathCause, Error, Kind, Position, Result, SeedPlan, Sex,
    SimulationConfig, TurnStats,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use tracing::{debug, info, instrument, trace, warn};

/// Steps of a turn, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Aging,
    Culling,
    PressureRelease,
    Relocation,
    Breeding,
    Conflict,
    ApexStrike,
}

impl Phase {
    pub const ORDER: [Phase; 7] = [
        Phase::Aging,
        Phase::Culling,
        Phase::PressureRelease,
        Phase::Relocation,
        Phase::Breeding,
        Phase::Conflict,
        Phase::ApexStrike,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Aging => "aging",
            Phase::Culling => "culling",
            Phase::PressureRelease => "pressure_release",
            Phase::Relocation => "relocation",
            Phase::Breeding => "breeding",
            Phase::Conflict => "conflict",
            Phase::ApexStrike => "apex_strike",
        }
    }
}

/// A world and everything needed to advance it one turn at a time.
///
/// The population registry owns the agents; the grid only holds their ids.
/// Every phase leaves the two in agreement (see [`Simulation::check_consistency`]).
pub struct Simulation<R: RandomSource = ChaCha8Rng> {
    pub(crate) config: SimulationConfig,
    pub(crate) grid: Grid,
    pub(crate) population: Population,
    pub(crate) apex: Option<ApexTrack>,
    pub(crate) turn: u64,
    pub(crate) rng: R,
}

impl Simulation<ChaCha8Rng> {
    /// Seeded world using `config.seed`
    pub fn from_config(config: SimulationConfig) -> Result<Self> {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::new(config, rng)
    }
}

impl<R: RandomSource> Simulation<R> {
    /// Validate the configuration and populate a fresh world according to its seed plan
    pub fn new(config: SimulationConfig, rng: R) -> Result<Self> {
        config.validate()?;

        let mut sim = Self::empty(config, rng);

        if sim.config.apex.enabled {
            let dragon = Agent::apex(&mut sim.rng);
            let track = ApexTrack::start(
                dragon.id,
                sim.grid.width,
                sim.config.apex.effect_radius,
                &mut sim.rng,
            );
            sim.insert_at(dragon, track.position)?;
            sim.apex = Some(track);
        }

        let mutation_probability = sim.config.lifecycle.mutation_probability;
        match sim.config.seed_plan.clone() {
            SeedPlan::Random { count } => {
                for _ in 0..count {
                    let agent = Agent::random(&mut sim.rng, mutation_probability);
                    sim.insert_random(agent)?;
                }
            }
            SeedPlan::PairPerHouse => {
                for kind in Kind::HOUSES {
                    for sex in [Sex::Male, Sex::Female] {
                        let color = random_color(&mut sim.rng);
                        let agent = Agent::spawn(&mut sim.rng, sex, color, kind);
                        sim.insert_random(agent)?;
                    }
                }
            }
        }

        info!(
            event = "world_seeded",
            width = sim.grid.width,
            height = sim.grid.height,
            population = sim.population.count(),
            conflict = ?sim.config.conflict,
            apex = sim.apex.is_some(),
            "World seeded"
        );

        Ok(sim)
    }

    /// Rebuild a world from explicit placements.
    ///
    /// Fails on duplicate ids, out-of-bounds or shared cells, and on an apex
    /// that is missing, misplaced or off its track. `apex` must be given
    /// exactly when the configuration enables it.
    pub fn seed(
        config: SimulationConfig,
        rng: R,
        placements: Vec<(Agent, Position)>,
        apex: Option<ApexTrack>,
    ) -> Result<Self> {
        config.validate()?;

        let mut sim = Self::empty(config, rng);

        let mut seen = HashSet::with_capacity(placements.len());
        for (agent, pos) in placements {
            if !seen.insert(agent.id) {
                return Err(Error::InvalidSnapshot(format!(
                    "agent {} appears more than once",
                    agent.id
                )));
            }
            sim.insert_at(agent, pos)?;
        }

        match (sim.config.apex.enabled, apex) {
            (false, None) => {}
            (true, Some(track)) => {
                let placed = sim
                    .population
                    .get(track.agent_id)
                    .filter(|agent| agent.kind.is_immortal())
                    .and_then(|agent| agent.position());
                if placed != Some(track.position) {
                    return Err(Error::InvalidSnapshot(format!(
                        "apex {} is not placed at {}",
                        track.agent_id, track.position
                    )));
                }
                if !track.is_on_track(sim.grid.width, sim.config.apex.effect_radius) {
                    return Err(Error::InvalidSnapshot(format!(
                        "apex at {} heading {:?} is off its track",
                        track.position, track.heading
                    )));
                }
                sim.apex = Some(track);
            }
            (true, None) => {
                return Err(Error::InvalidSnapshot(
                    "the apex is enabled but no apex state was given".to_string(),
                ))
            }
            (false, Some(_)) => {
                return Err(Error::InvalidSnapshot(
                    "apex state given but the apex is disabled".to_string(),
                ))
            }
        }

        Ok(sim)
    }

    /// Rebuild the world captured by `snapshot`
    pub fn restore(config: SimulationConfig, snapshot: Snapshot, rng: R) -> Result<Self> {
        snapshot.check_version()?;

        let mut placements = Vec::with_capacity(snapshot.agents.len());
        for agent in snapshot.agents {
            let pos = agent.position().ok_or_else(|| {
                Error::InvalidSnapshot(format!("agent {} has no position", agent.id))
            })?;
            placements.push((agent, pos));
        }

        let mut sim = Self::seed(config, rng, placements, snapshot.apex)?;
        sim.turn = snapshot.turn;

        info!(
            event = "world_restored",
            turn = sim.turn,
            population = sim.population.count(),
            "World restored from snapshot"
        );

        Ok(sim)
    }

    fn empty(config: SimulationConfig, rng: R) -> Self {
        Self {
            grid: Grid::from_config(&config.world),
            population: Population::new(),
            apex: None,
            turn: 0,
            rng,
            config,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn apex(&self) -> Option<&ApexTrack> {
        self.apex.as_ref()
    }

    /// Number of turns played so far
    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn is_extinct(&self) -> bool {
        self.population.is_empty()
    }

    /// Capture the world in a flat, serializable form
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.turn, self.population.iter().cloned().collect(), self.apex)
    }

    /// Play one turn
    pub fn advance_turn(&mut self, sink: &mut dyn LifecycleSink) -> Result<TurnStats> {
        self.advance_turn_observed(sink, |_, _| {})
    }

    /// Play one turn, calling `observe` after each phase
    #[instrument(skip(self, sink, observe), fields(turn = self.turn + 1))]
    pub fn advance_turn_observed<F>(
        &mut self,
        sink: &mut dyn LifecycleSink,
        mut observe: F,
    ) -> Result<TurnStats>
    where
        F: FnMut(Phase, &Self),
    {
        self.turn += 1;
        let mut stats = TurnStats::new(self.turn);

        for phase in Phase::ORDER {
            match phase {
                Phase::Aging => self.age_population(),
                Phase::Culling => self.cull_elderly(&mut stats, sink),
                Phase::PressureRelease => self.release_pressure(&mut stats, sink),
                Phase::Relocation => self.relocate(&mut stats, sink)?,
                Phase::Breeding => self.breed(&mut stats, sink)?,
                Phase::Conflict => {
                    match self.config.conflict {
                        ConflictModel::Infection => self.spread_infection(&mut stats, sink),
                        ConflictModel::Combat => self.resolve_combat(&mut stats, sink)?,
                    }
                    // wards last for one conflict phase
                    for agent in self.population.iter_mut() {
                        agent.invincible = false;
                    }
                }
                Phase::ApexStrike => self.apex_strike(&mut stats, sink),
            }
            trace!(
                phase = phase.as_str(),
                population = self.population.count(),
                "Phase complete"
            );
            observe(phase, &*self);
        }

        stats.population = self.population.count();

        let frame = Frame {
            turn: self.turn,
            stats: &stats,
            grid: &self.grid,
            population: &self.population,
            lifecycle: &self.config.lifecycle,
        };
        sink.on_turn_complete(&frame);

        debug!(
            event = "turn_stats",
            turn = stats.turn,
            population = stats.population,
            births = stats.births,
            deaths_old_age = stats.deaths_old_age,
            deaths_pressure = stats.deaths_pressure,
            deaths_combat = stats.deaths_combat,
            deaths_apex = stats.deaths_apex,
            conversions = stats.conversions,
            "Turn statistics"
        );

        Ok(stats)
    }

    /// Verify that every agent sits on the cell recorded for it and that the grid holds nobody else
    pub fn check_consistency(&self) -> Result<()> {
        for agent in self.population.iter() {
            let pos = agent.position().ok_or_else(|| {
                Error::Inconsistent(format!("agent {} has no cell", agent.id))
            })?;
            if self.grid.at(pos) != Some(agent.id) {
                return Err(Error::Inconsistent(format!(
                    "agent {} records {} but the cell holds {:?}",
                    agent.id,
                    pos,
                    self.grid.at(pos)
                )));
            }
        }
        if self.grid.occupied_count() != self.population.count() {
            return Err(Error::Inconsistent(format!(
                "{} occupied cells for {} agents",
                self.grid.occupied_count(),
                self.population.count()
            )));
        }
        if let Some(track) = &self.apex {
            if self.grid.at(track.position) != Some(track.agent_id) {
                return Err(Error::Inconsistent(format!(
                    "apex {} is not at {}",
                    track.agent_id, track.position
                )));
            }
        }
        Ok(())
    }

    fn age_population(&mut self) {
        for agent in self.population.iter_mut() {
            agent.tick();
        }
    }

    fn cull_elderly(&mut self, stats: &mut TurnStats, sink: &mut dyn LifecycleSink) {
        let lifecycle = &self.config.lifecycle;
        let doomed: Vec<AgentId> = self
            .population
            .iter()
            .filter(|agent| agent.is_past_lifespan(lifecycle))
            .map(|agent| agent.id)
            .collect();

        for id in doomed {
            self.kill(id, DeathCause::OldAge, stats, sink);
        }
    }

    /// Kill random mortal agents until the population is back at its target
    fn release_pressure(&mut self, stats: &mut TurnStats, sink: &mut dyn LifecycleSink) {
        let before = self.population.count();
        let pressure = &self.config.pressure;
        if !pressure.trigger.is_exceeded(before, self.grid.capacity()) {
            return;
        }
        let target = pressure.target(before);

        let mut candidates: Vec<AgentId> = self
            .population
            .iter()
            .filter(|agent| !agent.kind.is_immortal())
            .map(|agent| agent.id)
            .collect();

        while self.population.count() > target {
            let Some(victim) = take_random(&mut self.rng, &mut candidates) else {
                break;
            };
            self.kill(victim, DeathCause::PressureRelease, stats, sink);
        }

        info!(
            event = "pressure_release",
            turn = self.turn,
            before = before,
            target = target,
            after = self.population.count(),
            "A long hard winter thinned the population"
        );
    }

    /// Clear the grid and scatter everyone again, the apex first on its track
    fn relocate(&mut self, stats: &mut TurnStats, sink: &mut dyn LifecycleSink) -> Result<()> {
        let population = self.population.count();
        let capacity = self.grid.capacity();
        if population > capacity {
            warn!(
                event = "relocation_skipped",
                population = population,
                capacity = capacity,
                "Population exceeds grid capacity"
            );
            stats.capacity_warning = true;
            sink.on_capacity_warning(population, capacity);
            return Ok(());
        }

        self.grid.clear();
        for agent in self.population.iter_mut() {
            agent.position = None;
        }

        let mut apex_id = None;
        if let Some(track) = self.apex.as_mut() {
            track.advance(self.grid.width, self.config.apex.effect_radius);
            let (id, pos) = (track.agent_id, track.position);
            self.grid.place(id, pos)?;
            if let Some(dragon) = self.population.get_mut(id) {
                dragon.position = Some(pos);
            }
            apex_id = Some(id);
        }

        for id in self.population.ids() {
            if Some(id) == apex_id {
                continue;
            }
            let pos = self.grid.place_random_empty(id, &mut self.rng)?;
            if let Some(agent) = self.population.get_mut(id) {
                agent.position = Some(pos);
            }
        }

        Ok(())
    }

    /// Put an agent on a specific empty cell and register it
    pub(crate) fn insert_at(&mut self, mut agent: Agent, pos: Position) -> Result<()> {
        self.grid.place(agent.id, pos)?;
        agent.position = Some(pos);
        self.population.add(agent);
        Ok(())
    }

    /// Put an agent on a random empty cell and register it
    pub(crate) fn insert_random(&mut self, mut agent: Agent) -> Result<Position> {
        let pos = self.grid.place_random_empty(agent.id, &mut self.rng)?;
        agent.position = Some(pos);
        self.population.add(agent);
        Ok(pos)
    }

    /// Register a newborn on `pos` and announce it
    pub(crate) fn deliver(
        &mut self,
        baby: Agent,
        pos: Position,
        stats: &mut TurnStats,
        sink: &mut dyn LifecycleSink,
    ) -> Result<()> {
        let id = baby.id;
        self.insert_at(baby, pos)?;
        stats.births += 1;
        if let Some(baby) = self.population.get(id) {
            sink.on_birth(baby);
        }
        Ok(())
    }

    /// Remove an agent from both the registry and its cell. Killing an agent
    /// that is already gone does nothing.
    pub(crate) fn kill(
        &mut self,
        id: AgentId,
        cause: DeathCause,
        stats: &mut TurnStats,
        sink: &mut dyn LifecycleSink,
    ) {
        let Some(agent) = self.population.remove(id) else {
            return;
        };
        if let Some(pos) = agent.position() {
            if self.grid.at(pos) == Some(id) {
                self.grid.remove(pos);
            }
        }
        stats.record_death(cause);
        sink.on_death(&agent, cause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{EventLog, NullSink};
    use crate::rng::testing::ScriptedRandom;
    use bunny_core::{Color, PressureTrigger, WorldConfig};

    fn small_config(width: i32, height: i32) -> SimulationConfig {
        SimulationConfig {
            world: WorldConfig { width, height },
            seed_plan: SeedPlan::Random { count: 0 },
            ..SimulationConfig::infection()
        }
    }

    fn bunny(kind: Kind, sex: Sex, age: u32) -> Agent {
        let mut agent = Agent::new(AgentId::new(), "TEST".to_string(), sex, Color::Brown, kind);
        agent.age = age;
        agent
    }

    #[test]
    fn test_new_seeds_random_plan() {
        let config = SimulationConfig {
            seed_plan: SeedPlan::Random { count: 12 },
            ..small_config(10, 10)
        };
        let sim = Simulation::from_config(config).unwrap();
        assert_eq!(sim.population().count(), 12);
        assert_eq!(sim.turn(), 0);
        sim.check_consistency().unwrap();
    }

    #[test]
    fn test_new_seeds_pairs_and_apex() {
        let sim = Simulation::from_config(SimulationConfig::combat()).unwrap();
        let census = sim.population().census(&sim.config().lifecycle);
        assert_eq!(census.total, 9);
        assert_eq!(census.count_of(Kind::Dragon), 1);
        for kind in Kind::HOUSES {
            assert_eq!(census.count_of(kind), 2);
        }
        let track = sim.apex().unwrap();
        assert_eq!(track.position.x, track.position.y);
        sim.check_consistency().unwrap();
    }

    #[test]
    fn test_kill_is_idempotent() {
        let lone = bunny(Kind::Stark, Sex::Male, 1);
        let id = lone.id;
        let mut sim = Simulation::seed(
            small_config(4, 4),
            ScriptedRandom::new(&[], &[]),
            vec![(lone, Position::new(1, 1))],
            None,
        )
        .unwrap();

        let mut stats = TurnStats::new(1);
        let mut log = EventLog::new();
        sim.kill(id, DeathCause::Combat, &mut stats, &mut log);
        sim.kill(id, DeathCause::Combat, &mut stats, &mut log);
        assert_eq!(stats.deaths_combat, 1);
        assert_eq!(log.events.len(), 1);
        assert!(sim.grid().at(Position::new(1, 1)).is_none());
        sim.check_consistency().unwrap();
    }

    #[test]
    fn test_seed_rejects_duplicates_and_shared_cells() {
        let a = bunny(Kind::Stark, Sex::Male, 1);
        let result = Simulation::seed(
            small_config(4, 4),
            ScriptedRandom::new(&[], &[]),
            vec![(a.clone(), Position::new(0, 0)), (a, Position::new(1, 0))],
            None,
        );
        assert!(matches!(result, Err(Error::InvalidSnapshot(_))));

        let result = Simulation::seed(
            small_config(4, 4),
            ScriptedRandom::new(&[], &[]),
            vec![
                (bunny(Kind::Stark, Sex::Male, 1), Position::new(2, 2)),
                (bunny(Kind::Stark, Sex::Female, 1), Position::new(2, 2)),
            ],
            None,
        );
        assert!(matches!(result, Err(Error::OccupiedCell(_))));
    }

    #[test]
    fn test_pressure_release_spares_immortals() {
        let mut config = small_config(10, 10);
        config.pressure.trigger = PressureTrigger::Absolute(4);

        let mut placements = vec![(bunny(Kind::Dragon, Sex::Male, 7), Position::new(0, 0))];
        for i in 1..=6 {
            placements.push((bunny(Kind::Baratheon, Sex::Female, 1), Position::new(i, 0)));
        }
        let mut sim =
            Simulation::seed(config, ChaCha8Rng::seed_from_u64(2), placements, None).unwrap();

        let mut stats = TurnStats::new(1);
        sim.release_pressure(&mut stats, &mut NullSink);
        // 7 agents, target floor(7 / 2) = 3
        assert_eq!(sim.population().count(), 3);
        assert_eq!(stats.deaths_pressure, 4);
        assert_eq!(sim.population().census(&sim.config.lifecycle).count_of(Kind::Dragon), 1);
        sim.check_consistency().unwrap();
    }

    #[test]
    fn test_pressure_release_stops_when_only_immortals_remain() {
        let mut config = small_config(10, 10);
        config.pressure.trigger = PressureTrigger::Absolute(1);
        config.pressure.target_fraction = 0.0;

        let placements = vec![
            (bunny(Kind::Dragon, Sex::Male, 7), Position::new(0, 0)),
            (bunny(Kind::Dragon, Sex::Male, 7), Position::new(1, 0)),
            (bunny(Kind::Stark, Sex::Male, 7), Position::new(2, 0)),
        ];
        let mut sim =
            Simulation::seed(config, ChaCha8Rng::seed_from_u64(2), placements, None).unwrap();

        let mut stats = TurnStats::new(1);
        sim.release_pressure(&mut stats, &mut NullSink);
        assert_eq!(sim.population().count(), 2);
    }

    #[test]
    fn test_relocation_skipped_over_capacity() {
        let mut sim = Simulation::seed(
            small_config(3, 3),
            ChaCha8Rng::seed_from_u64(8),
            vec![(bunny(Kind::Stark, Sex::Male, 1), Position::new(1, 1))],
            None,
        )
        .unwrap();
        // shrink the grid behind the engine's back
        sim.grid = Grid::new(1, 0);
        let mut stats = TurnStats::new(1);
        let mut log = EventLog::new();
        sim.relocate(&mut stats, &mut log).unwrap();
        assert!(stats.capacity_warning);
        assert_eq!(
            log.events,
            vec![crate::lifecycle::LifecycleEvent::CapacityWarning {
                population: 1,
                capacity: 0
            }]
        );
    }

    #[test]
    fn test_relocation_keeps_everyone() {
        let config = SimulationConfig {
            seed_plan: SeedPlan::Random { count: 30 },
            ..small_config(6, 6)
        };
        let mut sim = Simulation::from_config(config).unwrap();
        let before: HashSet<AgentId> = sim.population().ids().into_iter().collect();
        let mut stats = TurnStats::new(1);
        sim.relocate(&mut stats, &mut NullSink).unwrap();
        let after: HashSet<AgentId> = sim.population().ids().into_iter().collect();
        assert_eq!(before, after);
        sim.check_consistency().unwrap();
    }
}
