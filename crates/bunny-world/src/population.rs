//! Registry of live agents.

use crate::agent::Agent;
use crate::rng::{choose, RandomSource};
use bunny_core::{AgentId, Census, LifecycleConfig};
use std::collections::HashMap;

/// Owns every live agent. Removal swaps the last agent into the hole, so
/// iteration order is stable between mutations but otherwise unspecified.
#[derive(Debug, Clone, Default)]
pub struct Population {
    agents: Vec<Agent>,
    index: HashMap<AgentId, usize>,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent; an agent with the same id is replaced
    pub fn add(&mut self, agent: Agent) {
        match self.index.get(&agent.id) {
            Some(&slot) => self.agents[slot] = agent,
            None => {
                self.index.insert(agent.id, self.agents.len());
                self.agents.push(agent);
            }
        }
    }

    /// Remove an agent; removing an absent id is a no-op returning `None`
    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let slot = self.index.remove(&id)?;
        let agent = self.agents.swap_remove(slot);
        if let Some(moved) = self.agents.get(slot) {
            self.index.insert(moved.id, slot);
        }
        Some(agent)
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.index.get(&id).map(|&slot| &self.agents[slot])
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        match self.index.get(&id) {
            Some(&slot) => Some(&mut self.agents[slot]),
            None => None,
        }
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn count(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.agents.iter_mut()
    }

    /// Ids in iteration order, detached from the registry so it can be mutated
    pub fn ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(|agent| agent.id).collect()
    }

    /// Collect every agent matching `predicate`, then draw one uniformly.
    ///
    /// `None` when nothing matches; callers treat that as a silent skip.
    pub fn pick_random<R, P>(&self, rng: &mut R, predicate: P) -> Option<AgentId>
    where
        R: RandomSource + ?Sized,
        P: Fn(&Agent) -> bool,
    {
        let candidates: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|agent| predicate(agent))
            .map(|agent| agent.id)
            .collect();
        choose(rng, &candidates).copied()
    }

    pub fn census(&self, lifecycle: &LifecycleConfig) -> Census {
        let mut census = Census::new();
        for agent in &self.agents {
            census.record(agent.kind, agent.sex, agent.age, lifecycle.breeding_age);
        }
        census
    }
}
