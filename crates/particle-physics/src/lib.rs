//! # Particle Physics
//!
//! CPU core of the position-based particle engine: particle state and storage
//! layouts, the uniform broad-phase grid, damped Verlet integration and the
//! parallel contact solver. Device backends build on the same types.

pub mod constants;
pub mod contact;
pub mod error;
pub mod grid;
pub mod integrator;
pub mod particle;
pub mod store;
pub mod world;

pub use constants::*;
pub use contact::{resolve_pair, ContactSolver, PairOutcome, SolveReport};
pub use error::{Error, Result};
pub use grid::{CellCapacity, SpatialGrid};
pub use integrator::Integrator;
pub use particle::{hsv_to_rgb, Motion, Particle, Rgb};
pub use store::{ParticleColumns, ParticleStore, ParticleVec};
pub use world::WorldBounds;
