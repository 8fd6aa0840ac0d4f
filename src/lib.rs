//! Diffusion-Limited Aggregation on a square lattice.
//!
//! Walkers are released one at a time from the grid boundary and random-walk
//! over the 8-connected neighborhood until they freeze next to the aggregate
//! grown from a single seed at the center. [`simulation::run`] is the entry
//! point; the remaining modules render, export and analyze the resulting grid.

pub mod aggregation;
pub mod error;
pub mod export;
pub mod features;
pub mod grid;
pub mod neighbor;
pub mod render;
pub mod rng;
pub mod simulation;
pub mod sweep;
pub mod walker;

pub use error::{DlaError, Result};
pub use grid::{Grid, Position};
pub use neighbor::Topology;
pub use simulation::{run, Simulation, SimulationConfig};
