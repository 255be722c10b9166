//! Simulation engine: particle creation and frame stepping over a backend

use glam::Vec2;
use particle_physics::{Error as PhysicsError, Particle, Rgb, WorldBounds};

use crate::backend::{SimulationBackend, StepReport};
use crate::cpu::CpuBackend;
use crate::error::Result;
#[cfg(feature = "gpu")]
use crate::gpu::GpuBackend;
use crate::params::SimulationConfig;

/// Owns a backend plus the configuration it was built from.
///
/// Each `step` runs `substeps` rounds of integrate → rebuild grid → solve
/// contacts with `frame_dt / substeps` as the substep time.
pub struct Simulation<B: SimulationBackend> {
    backend: B,
    config: SimulationConfig,
    frame: u64,
}

impl Simulation<CpuBackend> {
    /// Engine on the multi-threaded CPU backend.
    pub fn cpu(config: SimulationConfig) -> Result<Self> {
        let backend = CpuBackend::new(&config)?;
        Self::new(backend, config)
    }
}

#[cfg(feature = "gpu")]
impl Simulation<GpuBackend> {
    /// Engine on the wgpu compute backend (blocks while the device opens).
    pub fn gpu(config: SimulationConfig) -> Result<Self> {
        let backend = GpuBackend::new(&config)?;
        Self::new(backend, config)
    }
}

impl<B: SimulationBackend> Simulation<B> {
    pub fn new(backend: B, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        log::info!(
            "✓ Simulation ready on {} backend ({} substeps per frame)",
            backend.name(),
            config.substeps
        );
        Ok(Self {
            backend,
            config,
            frame: 0,
        })
    }

    /// Add a particle moving with `velocity` (world units per substep) under
    /// the configured gravity. Returns its index.
    ///
    /// Errors:
    /// - `InvalidParticle` for non-finite input, a bad radius or color.
    /// - `CapacityExceeded` once `max_particles` particles exist.
    /// - `WorldBoundsViolation` for a position outside the world, only when
    ///   bounds are enforced.
    pub fn create_particle(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        radius: f32,
        color: Rgb,
    ) -> Result<usize> {
        let particle = Particle::new(position, velocity, radius, color)?
            .with_acceleration(self.config.gravity)?;
        self.create(particle)
    }

    /// Add a fully built particle, keeping its own acceleration.
    pub fn create(&mut self, particle: Particle) -> Result<usize> {
        particle.validate()?;
        if self.backend.particle_count() >= self.config.max_particles {
            return Err(PhysicsError::CapacityExceeded {
                capacity: self.config.max_particles,
            }
            .into());
        }
        if self.config.enforce_world_bounds && !self.backend.world().contains(particle.position) {
            return Err(PhysicsError::WorldBoundsViolation {
                x: particle.position.x,
                y: particle.position.y,
            }
            .into());
        }
        self.backend.push(particle)
    }

    /// Advance one frame with the configured substep count.
    pub fn step(&mut self, frame_dt: f32) -> Result<StepReport> {
        self.step_with(frame_dt, self.config.substeps)
    }

    /// Advance one frame of `frame_dt` split into `substeps` substeps.
    ///
    /// A zero frame time skips integration but still separates overlaps.
    ///
    /// Errors:
    /// - `InvalidTimeStep` for a negative or non-finite `frame_dt`.
    /// - `InvalidConfig` for zero substeps.
    pub fn step_with(&mut self, frame_dt: f32, substeps: u32) -> Result<StepReport> {
        if !frame_dt.is_finite() || frame_dt < 0.0 {
            return Err(PhysicsError::InvalidTimeStep(frame_dt).into());
        }
        if substeps == 0 {
            return Err(PhysicsError::InvalidConfig("substeps must be >= 1".into()).into());
        }

        let sub_dt = frame_dt / substeps as f32;
        let report = self.backend.step(sub_dt, substeps)?;
        self.frame += 1;

        log::debug!(
            "Frame {}: {} particles, {} contacts, {} dropped in {:.2?}",
            self.frame,
            self.backend.particle_count(),
            report.contacts,
            report.dropped,
            report.elapsed
        );
        Ok(report)
    }

    pub fn particle_count(&self) -> usize {
        self.backend.particle_count()
    }

    pub fn particle(&self, index: usize) -> Option<Particle> {
        self.backend.particle(index)
    }

    pub fn world_size(&self) -> Vec2 {
        self.backend.world().size()
    }

    pub fn world(&self) -> &WorldBounds {
        self.backend.world()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Frames stepped so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn small() -> SimulationConfig {
        SimulationConfig::default()
            .with_world(50.0, 50.0)
            .with_worker_threads(2)
    }

    #[test]
    fn created_particles_get_configured_gravity() -> Result<()> {
        let mut sim = Simulation::cpu(small().with_gravity(Vec2::new(1.0, 2.0)))?;
        let index = sim.create_particle(Vec2::new(10.0, 10.0), Vec2::ZERO, 0.5, Rgb::WHITE)?;
        assert_eq!(index, 0);
        assert_eq!(
            sim.particle(0).map(|p| p.acceleration),
            Some(Vec2::new(1.0, 2.0))
        );
        Ok(())
    }

    #[test]
    fn capacity_is_enforced() -> Result<()> {
        let mut sim = Simulation::cpu(small().with_max_particles(2))?;
        sim.create_particle(Vec2::new(10.0, 10.0), Vec2::ZERO, 0.5, Rgb::WHITE)?;
        sim.create_particle(Vec2::new(20.0, 10.0), Vec2::ZERO, 0.5, Rgb::WHITE)?;
        let err = sim
            .create_particle(Vec2::new(30.0, 10.0), Vec2::ZERO, 0.5, Rgb::WHITE)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Physics(PhysicsError::CapacityExceeded { capacity: 2 })
        ));
        assert_eq!(sim.particle_count(), 2);
        Ok(())
    }

    #[test]
    fn world_bounds_only_checked_on_request() -> Result<()> {
        let outside = Vec2::new(-5.0, 10.0);

        let mut lenient = Simulation::cpu(small())?;
        assert!(lenient.create_particle(outside, Vec2::ZERO, 0.5, Rgb::WHITE).is_ok());

        let mut strict = Simulation::cpu(small().with_world_bounds_check(true))?;
        let err = strict
            .create_particle(outside, Vec2::ZERO, 0.5, Rgb::WHITE)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Physics(PhysicsError::WorldBoundsViolation { .. })
        ));
        Ok(())
    }

    #[test]
    fn oversized_world_is_rejected() {
        let result = Simulation::cpu(small().with_world(1.0e10, 1.0e10));
        assert!(matches!(
            result,
            Err(Error::Physics(PhysicsError::InvalidDimension { .. }))
        ));
    }

    #[test]
    fn bad_time_steps_rejected() -> Result<()> {
        let mut sim = Simulation::cpu(small())?;
        for dt in [-0.1, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                sim.step(dt),
                Err(Error::Physics(PhysicsError::InvalidTimeStep(_)))
            ));
        }
        assert!(sim.step_with(0.1, 0).is_err());
        assert_eq!(sim.frame(), 0);
        Ok(())
    }

    #[test]
    fn step_runs_configured_substeps() -> Result<()> {
        let mut sim = Simulation::cpu(small().with_substeps(5))?;
        sim.create_particle(Vec2::new(10.0, 10.0), Vec2::ZERO, 0.5, Rgb::WHITE)?;
        let report = sim.step(1.0 / 60.0)?;
        assert_eq!(report.substeps, 5);
        assert_eq!(sim.frame(), 1);
        assert_eq!(sim.world_size(), Vec2::new(50.0, 50.0));
        Ok(())
    }

    #[test]
    fn hand_built_particles_are_validated() -> Result<()> {
        let mut sim = Simulation::cpu(small())?;
        let mut p = Particle::new(Vec2::new(10.0, 10.0), Vec2::ZERO, 0.5, Rgb::WHITE)?;
        p.radius = -1.0;
        assert!(sim.create(p).is_err());
        assert_eq!(sim.particle_count(), 0);
        Ok(())
    }
}
