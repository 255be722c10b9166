//! # Particle Simulation Engine
//!
//! Frame stepping over interchangeable backends: a multi-threaded CPU backend
//! and, with the `gpu` feature, a wgpu compute backend running the same
//! integrate → grid → contact pipeline in shaders.

pub mod backend;
pub mod cpu;
pub mod emitter;
pub mod error;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod params;
pub mod simulation;

pub use backend::{SimulationBackend, StepReport, SubstepReport};
pub use cpu::CpuBackend;
pub use emitter::Emitter;
pub use error::{Error, Result};
#[cfg(feature = "gpu")]
pub use gpu::GpuBackend;
pub use params::{GpuParams, SimulationConfig};
pub use simulation::Simulation;
