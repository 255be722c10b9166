//! Particle source used by the demo driver
//!
//! Emits a vertical column of particles every frame near the left wall, row
//! `k` (counted from 1) at `origin + (0, 1.5 k)`, colored along a rainbow that
//! repeats every `HUE_PERIOD` frames.

use glam::Vec2;
use particle_physics::{hsv_to_rgb, Error as PhysicsError, DEFAULT_RADIUS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::backend::SimulationBackend;
use crate::error::Result;
use crate::simulation::Simulation;

pub const DEFAULT_ROWS: u32 = 10;
pub const MAX_ROWS: u32 = 30;
/// Frames for one trip around the hue circle
pub const HUE_PERIOD: u64 = 1000;

pub struct Emitter {
    rows: u32,
    enabled: bool,
    origin: Vec2,
    spacing: f32,
    velocity: Vec2,
    jitter: Option<(f32, f32)>,
    rng: StdRng,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            enabled: true,
            origin: Vec2::new(2.0, 5.0),
            spacing: 1.5,
            velocity: Vec2::new(0.2, 0.0),
            jitter: None,
            rng: StdRng::seed_from_u64(0),
        }
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Errors:
    /// - `InvalidConfig` outside `1..=MAX_ROWS`.
    pub fn with_rows(mut self, rows: u32) -> Result<Self> {
        if !(1..=MAX_ROWS).contains(&rows) {
            let reason = format!("emitter rows must lie in 1..={MAX_ROWS}");
            return Err(PhysicsError::InvalidConfig(reason).into());
        }
        self.rows = rows;
        Ok(self)
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Draw each radius uniformly from `min..=max` with a generator seeded by
    /// `seed`.
    pub fn with_radius_jitter(mut self, min: f32, max: f32, seed: u64) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max {
            return Err(PhysicsError::InvalidConfig(format!(
                "radius jitter {min}..={max} is not a valid range"
            ))
            .into());
        }
        self.jitter = Some((min, max));
        self.rng = StdRng::seed_from_u64(seed);
        Ok(self)
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
        log::info!("Emitter {}", if self.enabled { "on" } else { "off" });
    }

    pub fn increase_rows(&mut self) {
        self.rows = (self.rows + 1).min(MAX_ROWS);
    }

    pub fn decrease_rows(&mut self) {
        self.rows = self.rows.saturating_sub(1).max(1);
    }

    /// Emit one column for `frame`; returns how many particles were created.
    ///
    /// The column is created whole or not at all.
    ///
    /// Errors:
    /// - `CapacityExceeded` when fewer than `rows` slots are left.
    /// - `WorldBoundsViolation` when bounds are enforced and a row lies outside.
    pub fn emit<B: SimulationBackend>(
        &mut self,
        simulation: &mut Simulation<B>,
        frame: u64,
    ) -> Result<usize> {
        if !self.enabled {
            return Ok(0);
        }

        let config = simulation.config();
        let capacity = config.max_particles;
        if capacity.saturating_sub(simulation.particle_count()) < self.rows as usize {
            return Err(PhysicsError::CapacityExceeded { capacity }.into());
        }
        if config.enforce_world_bounds {
            let world = simulation.world();
            if let Some(outside) = self.positions().find(|&p| !world.contains(p)) {
                return Err(PhysicsError::WorldBoundsViolation {
                    x: outside.x,
                    y: outside.y,
                }
                .into());
            }
        }

        let hue = (frame % HUE_PERIOD) as f32 / HUE_PERIOD as f32;
        let color = hsv_to_rgb(hue, 1.0, 1.0);

        let positions: Vec<Vec2> = self.positions().collect();
        for position in positions {
            let radius = match self.jitter {
                Some((min, max)) => self.rng.random_range(min..=max),
                None => DEFAULT_RADIUS,
            };
            simulation.create_particle(position, self.velocity, radius, color)?;
        }
        Ok(self.rows as usize)
    }

    /// Row positions, top row first
    fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        (1..=self.rows)
            .rev()
            .map(|row| self.origin + Vec2::new(0.0, self.spacing * row as f32))
    }
}
