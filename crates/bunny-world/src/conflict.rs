//! Infection, combat and the apex strike.

use crate::agent::Agent;
use crate::lifecycle::LifecycleSink;
use crate::rng::{choose, RandomSource};
use crate::simulation::Simulation;
use bunny_core::{AgentId, DeathCause, LifecycleConfig, Position, Result, TurnStats};
use std::collections::HashSet;
use tracing::debug;

/// How a fight between two agents ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    DefenderDies,
    AttackerDies,
    /// The attacker caught the infection from its target
    AttackerConverts,
    /// The defender dies and the attacker's newborn takes her cell
    DefenderReplaced,
}

/// Decide a fight. The first matching rule wins:
/// 1. an invincible attacker wins, otherwise an invincible defender wins
/// 2. attacking an infected agent converts the attacker
/// 3. juveniles lose
/// 4. an adult female is slain and replaced by the attacker's newborn
/// 5. the house dominance table
pub fn resolve(attacker: &Agent, defender: &Agent, lifecycle: &LifecycleConfig) -> Outcome {
    if attacker.invincible {
        Outcome::DefenderDies
    } else if defender.invincible {
        Outcome::AttackerDies
    } else if defender.kind.is_infected() {
        Outcome::AttackerConverts
    } else if !defender.is_adult(lifecycle) {
        Outcome::DefenderDies
    } else if defender.sex == bunny_core::Sex::Female {
        Outcome::DefenderReplaced
    } else if attacker.kind.dominates(defender.kind) {
        Outcome::DefenderDies
    } else {
        Outcome::AttackerDies
    }
}

impl<R: RandomSource> Simulation<R> {
    /// Each infected agent marks one random healthy neighbor; all marks convert together
    /// after the scan, so new converts never spread in the turn they turn.
    pub(crate) fn spread_infection(&mut self, stats: &mut TurnStats, sink: &mut dyn LifecycleSink) {
        let radius = self.config.neighborhood_radius;
        let mut pending: Vec<AgentId> = Vec::new();
        let mut marked: HashSet<AgentId> = HashSet::new();

        let carriers: Vec<Position> = self
            .grid
            .occupied()
            .filter(|(_, id)| {
                self.population
                    .get(*id)
                    .is_some_and(|agent| agent.kind.is_infected())
            })
            .map(|(pos, _)| pos)
            .collect();

        for pos in carriers {
            let victims: Vec<AgentId> = self
                .grid
                .neighborhood(pos, radius, false)
                .filter_map(|cell| self.grid.at(cell))
                .filter(|id| {
                    !marked.contains(id)
                        && self.population.get(*id).is_some_and(|agent| {
                            !agent.kind.is_infected() && !agent.kind.is_immortal()
                        })
                })
                .collect();

            if let Some(&victim) = choose(&mut self.rng, &victims) {
                marked.insert(victim);
                pending.push(victim);
            }
        }

        for id in pending {
            if let Some(agent) = self.population.get_mut(id) {
                let former = agent.kind;
                agent.turn_infected();
                stats.conversions += 1;
                sink.on_conversion(agent, former);
            }
        }
    }

    /// Every adult male of a breedable kind attacks one random neighbor of
    /// another mortal kind.
    ///
    /// Attackers come from a row-major pass made before the first fight; one
    /// that has died or been replaced by then is skipped.
    pub(crate) fn resolve_combat(
        &mut self,
        stats: &mut TurnStats,
        sink: &mut dyn LifecycleSink,
    ) -> Result<()> {
        let lifecycle = self.config.lifecycle.clone();
        let radius = self.config.neighborhood_radius;
        let roster: Vec<(Position, AgentId)> = self.grid.occupied().collect();

        for (pos, attacker_id) in roster {
            if self.grid.at(pos) != Some(attacker_id) {
                continue;
            }
            let Some(attacker) = self.population.get(attacker_id) else {
                continue;
            };
            if !attacker.is_breeding_male(&lifecycle) {
                continue;
            }

            let targets: Vec<Position> = self.grid.neighborhood(pos, radius, false).collect();
            let Some(&target_pos) = choose(&mut self.rng, &targets) else {
                continue;
            };
            let Some(defender) = self
                .grid
                .at(target_pos)
                .and_then(|id| self.population.get(id))
            else {
                continue;
            };
            if defender.kind == attacker.kind || defender.kind.is_immortal() {
                continue;
            }

            let outcome = resolve(attacker, defender, &lifecycle);
            let (attacker_kind, defender_id, defender_color) =
                (attacker.kind, defender.id, defender.color);
            debug!(
                event = "combat",
                attacker = %attacker_kind,
                defender = %defender.kind,
                outcome = ?outcome,
                "Fight"
            );

            match outcome {
                Outcome::DefenderDies => {
                    self.kill(defender_id, DeathCause::Combat, stats, sink);
                }
                Outcome::AttackerDies => {
                    self.kill(attacker_id, DeathCause::Combat, stats, sink);
                }
                Outcome::AttackerConverts => {
                    if let Some(attacker) = self.population.get_mut(attacker_id) {
                        let former = attacker.kind;
                        attacker.turn_infected();
                        stats.conversions += 1;
                        sink.on_conversion(attacker, former);
                    }
                }
                Outcome::DefenderReplaced => {
                    self.kill(defender_id, DeathCause::Combat, stats, sink);
                    let baby = Agent::newborn(
                        &mut self.rng,
                        defender_color,
                        attacker_kind,
                        lifecycle.mutation_probability,
                    );
                    self.deliver(baby, target_pos, stats, sink)?;
                }
            }
        }

        Ok(())
    }

    /// Everyone within the apex's reach dies, except the warded house, which
    /// is made invincible for the next conflict phase instead.
    pub(crate) fn apex_strike(&mut self, stats: &mut TurnStats, sink: &mut dyn LifecycleSink) {
        let Some(track) = self.apex else {
            return;
        };
        let ward = self.config.apex.ward_kind;

        let in_reach: Vec<AgentId> = self
            .grid
            .window(track.position, self.config.apex.effect_radius)
            .cells()
            .filter_map(|cell| self.grid.at(cell))
            .filter(|id| *id != track.agent_id)
            .collect();

        for id in in_reach {
            let Some(agent) = self.population.get_mut(id) else {
                continue;
            };
            if agent.kind.is_immortal() {
                continue;
            }
            if Some(agent.kind) == ward {
                agent.invincible = true;
            } else {
                self.kill(id, DeathCause::ApexStrike, stats, sink);
            }
        }
    }
}
