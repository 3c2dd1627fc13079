//! Breeding phase.

use crate::agent::Agent;
use crate::lifecycle::LifecycleSink;
use crate::rng::{choose, RandomSource};
use crate::simulation::Simulation;
use bunny_core::{AgentId, Position, Result, TurnStats};
use tracing::trace;

impl<R: RandomSource> Simulation<R> {
    /// Every adult female of a breedable kind gets a randomly chosen father and,
    /// if her neighborhood has room, one newborn next to her.
    ///
    /// Mothers are taken from a row-major pass over the grid made before the
    /// first birth, so newborns never breed in the turn they are born. They do
    /// take their cell right away, so later mothers cannot use it.
    pub(crate) fn breed(&mut self, stats: &mut TurnStats, sink: &mut dyn LifecycleSink) -> Result<()> {
        let lifecycle = self.config.lifecycle.clone();
        let radius = self.config.neighborhood_radius;

        let mothers: Vec<(Position, AgentId)> = self
            .grid
            .occupied()
            .filter(|(_, id)| {
                self.population
                    .get(*id)
                    .is_some_and(|agent| agent.is_breeding_female(&lifecycle))
            })
            .collect();

        for (pos, mother_id) in mothers {
            let Some(mother) = self.population.get(mother_id) else {
                continue;
            };
            let (mother_kind, mother_color) = (mother.kind, mother.color);

            let father = self.population.pick_random(&mut self.rng, |agent| {
                agent.is_breeding_male(&lifecycle)
                    && (!lifecycle.require_same_kind || agent.kind == mother_kind)
            });
            let Some(father_kind) = father
                .and_then(|id| self.population.get(id))
                .map(|agent| agent.kind)
            else {
                trace!(mother_id = %mother_id, "No father available");
                continue;
            };

            let nursery: Vec<Position> = self.grid.neighborhood(pos, radius, true).collect();
            let Some(&cell) = choose(&mut self.rng, &nursery) else {
                trace!(mother_id = %mother_id, "No room next to the mother");
                continue;
            };

            let baby = Agent::newborn(
                &mut self.rng,
                mother_color,
                father_kind,
                lifecycle.mutation_probability,
            );
            self.deliver(baby, cell, stats, sink)?;
        }

        Ok(())
    }
}
