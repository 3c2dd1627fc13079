//! Lifecycle notifications consumed by presentation layers.

use crate::agent::Agent;
use crate::grid::Grid;
use crate::population::Population;
use bunny_core::{AgentId, DeathCause, Kind, LifecycleConfig, TurnStats};
use tracing::{debug, event, info, warn, Level};

/// Read-only view of the world at the end of a turn
pub struct Frame<'a> {
    pub turn: u64,
    pub stats: &'a TurnStats,
    pub grid: &'a Grid,
    pub population: &'a Population,
    pub lifecycle: &'a LifecycleConfig,
}

impl Frame<'_> {
    /// Occupant glyph at every cell, one line per row, two columns per cell
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.grid.capacity() * 2 + self.grid.height as usize);
        for y in 0..self.grid.height {
            for x in 0..self.grid.width {
                let glyph = self
                    .grid
                    .at(bunny_core::Position::new(x, y))
                    .and_then(|id| self.population.get(id))
                    .map(|agent| agent.glyph(self.lifecycle))
                    .unwrap_or(' ');
                out.push(glyph);
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }
}

/// Receiver of lifecycle events. Every method defaults to a no-op.
pub trait LifecycleSink {
    fn on_birth(&mut self, _agent: &Agent) {}

    fn on_death(&mut self, _agent: &Agent, _cause: DeathCause) {}

    /// A noble of house `former` turned into the infected kind
    fn on_conversion(&mut self, _agent: &Agent, _former: Kind) {}

    fn on_turn_complete(&mut self, _frame: &Frame<'_>) {}

    /// Relocation was skipped because the population does not fit on the grid
    fn on_capacity_warning(&mut self, _population: usize, _capacity: usize) {}
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LifecycleSink for NullSink {}

/// Emits structured `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LifecycleSink for TracingSink {
    fn on_birth(&mut self, agent: &Agent) {
        debug!(
            event = "birth",
            agent_id = %agent.id,
            name = %agent.name,
            kind = %agent.kind,
            sex = %agent.sex,
            color = %agent.color,
            "Agent born"
        );
    }

    fn on_death(&mut self, agent: &Agent, cause: DeathCause) {
        debug!(
            event = "death",
            agent_id = %agent.id,
            name = %agent.name,
            kind = %agent.kind,
            age = agent.age,
            cause = cause.as_str(),
            "Agent died"
        );
    }

    fn on_conversion(&mut self, agent: &Agent, former: Kind) {
        debug!(
            event = "conversion",
            agent_id = %agent.id,
            name = %agent.name,
            former_kind = %former,
            age = agent.age,
            "Agent turned infected"
        );
    }

    fn on_turn_complete(&mut self, frame: &Frame<'_>) {
        let stats = frame.stats;
        info!(
            event = "turn_complete",
            turn = frame.turn,
            population = stats.population,
            births = stats.births,
            deaths = stats.total_deaths(),
            conversions = stats.conversions,
            "Turn complete"
        );

        event!(
            Level::INFO,
            gauge_name = "population_total",
            gauge_value = stats.population,
            turn = frame.turn,
            "Population gauge"
        );
    }

    fn on_capacity_warning(&mut self, population: usize, capacity: usize) {
        warn!(
            event = "capacity_warning",
            population = population,
            capacity = capacity,
            "Not enough space on the grid, relocation skipped"
        );
    }
}

/// A recorded lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Birth(AgentId),
    Death(AgentId, DeathCause),
    Conversion(AgentId, Kind),
    TurnComplete { turn: u64, population: usize },
    CapacityWarning { population: usize, capacity: usize },
}

/// Keeps every event in order; handy for tests and replays
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<LifecycleEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn births(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, LifecycleEvent::Birth(_)))
            .count()
    }

    pub fn deaths(&self, cause: DeathCause) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, LifecycleEvent::Death(_, c) if *c == cause))
            .count()
    }
}

impl LifecycleSink for EventLog {
    fn on_birth(&mut self, agent: &Agent) {
        self.events.push(LifecycleEvent::Birth(agent.id));
    }

    fn on_death(&mut self, agent: &Agent, cause: DeathCause) {
        self.events.push(LifecycleEvent::Death(agent.id, cause));
    }

    fn on_conversion(&mut self, agent: &Agent, former: Kind) {
        self.events.push(LifecycleEvent::Conversion(agent.id, former));
    }

    fn on_turn_complete(&mut self, frame: &Frame<'_>) {
        self.events.push(LifecycleEvent::TurnComplete {
            turn: frame.turn,
            population: frame.population.count(),
        });
    }

    fn on_capacity_warning(&mut self, population: usize, capacity: usize) {
        self.events.push(LifecycleEvent::CapacityWarning {
            population,
            capacity,
        });
    }
}
