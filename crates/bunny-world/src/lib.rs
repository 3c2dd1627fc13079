//! Bunny world simulation engine.
//!
//! A grid of bunnies that age, breed, die and, depending on the configured
//! conflict model, either spread an infection or fight between houses, with
//! an optional dragon patrolling the grid. [`Simulation::advance_turn`] plays
//! one turn.

pub mod agent;
pub mod apex;
mod breeding;
pub mod conflict;
pub mod grid;
pub mod lifecycle;
pub mod neighborhood;
pub mod population;
pub mod rng;
pub mod simulation;
pub mod snapshot;

pub use agent::Agent;
pub use apex::{ApexTrack, Heading};
pub use conflict::{resolve, Outcome};
pub use grid::Grid;
pub use lifecycle::{EventLog, Frame, LifecycleEvent, LifecycleSink, NullSink, TracingSink};
pub use population::Population;
pub use rng::RandomSource;
pub use simulation::{Phase, Simulation};
pub use snapshot::Snapshot;
