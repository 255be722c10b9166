//! Execution backends behind the simulation engine

use std::ops::AddAssign;
use std::time::{Duration, Instant};

use particle_physics::{Particle, WorldBounds};

use crate::error::Result;

/// Counters for one substep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstepReport {
    pub contacts: usize,
    pub degenerate: usize,
    /// Particles left out of the grid by a bounded cell policy
    pub dropped: usize,
}

/// Counters for one `step` call, summed over its substeps.
///
/// Device backends do not read counters back and leave them at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    pub substeps: u32,
    pub contacts: usize,
    pub degenerate: usize,
    pub dropped: usize,
    pub elapsed: Duration,
}

impl AddAssign<SubstepReport> for StepReport {
    fn add_assign(&mut self, substep: SubstepReport) {
        self.substeps += 1;
        self.contacts += substep.contacts;
        self.degenerate += substep.degenerate;
        self.dropped += substep.dropped;
    }
}

/// A place where particles live and get stepped.
///
/// Chosen when the engine is built and used through static dispatch.
pub trait SimulationBackend {
    fn name(&self) -> &'static str;

    fn world(&self) -> &WorldBounds;

    fn particle_count(&self) -> usize;

    /// Host view of particle `index`.
    fn particle(&self, index: usize) -> Option<Particle>;

    /// Append an already validated particle.
    fn push(&mut self, particle: Particle) -> Result<usize>;

    /// Integrate (skipped when `dt` is 0), rebuild the grid, solve contacts.
    fn substep(&mut self, dt: f32) -> Result<SubstepReport>;

    /// Run `substeps` substeps of `sub_dt` each.
    fn step(&mut self, sub_dt: f32, substeps: u32) -> Result<StepReport> {
        let start = Instant::now();
        let mut report = StepReport::default();
        for _ in 0..substeps {
            report += self.substep(sub_dt)?;
        }
        report.elapsed = start.elapsed();
        Ok(report)
    }
}
