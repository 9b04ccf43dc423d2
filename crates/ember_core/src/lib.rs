//! # Ember Core
//!
//! Deterministic simulation core for autonomous firefighting units on a
//! grid world.
//!
//! This crate contains **only** the simulation logic:
//! - No rendering (redraw notifications go through a narrow sink trait)
//! - No file IO (world descriptions arrive as strings)
//! - No system randomness (fire spread uses an explicitly seeded RNG)
//!
//! The simulation is a single logical timeline: a time-bucketed event
//! queue drives unit movement, fire interventions and tank refills tick
//! by tick, and a dispatcher assigns idle units to burning fires after
//! each drained tick.
//!
//! ## Crate Structure
//!
//! - [`grid`] - Terrain lookup and cardinal-neighbor queries
//! - [`pathfinding`] - A* search with unit-dependent movement cost
//! - [`units`] - Unit kinds, capability table and per-unit state
//! - [`world`] - Fires and the shared simulation state
//! - [`event`] - The event catalog and its transition logic
//! - [`scheduler`] - Event queue, tick loop and driver surface
//! - [`dispatcher`] - Fire-to-unit assignment policies
//! - [`loader`] - Textual world description parser

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod dispatcher;
pub mod error;
pub mod event;
pub mod grid;
pub mod loader;
pub mod pathfinding;
pub mod render;
pub mod rng;
pub mod scheduler;
pub mod units;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::dispatcher::DispatchPolicy;
    pub use crate::error::{Result, SimError};
    pub use crate::event::{Event, FireTarget, PostMove};
    pub use crate::grid::{Coord, Direction, Grid, Terrain};
    pub use crate::render::{NullSink, RenderSink};
    pub use crate::scheduler::{RunOutcome, SimConfig, Simulation, Tick};
    pub use crate::units::{Unit, UnitId, UnitKind};
    pub use crate::world::{Fire, FireId, WorldState};
}
