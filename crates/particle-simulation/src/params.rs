//! Simulation configuration and its device-side mirror

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use particle_physics::{
    CellCapacity, Error, Result, WorldBounds, DEFAULT_CELL_CAPACITY, DEFAULT_DAMPING,
    DEFAULT_MAX_PARTICLES, DEFAULT_SUBSTEPS, GRAVITY, MAX_WORKER_THREADS, WALL_MARGIN,
};

/// Everything fixed at engine construction
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub world_width: f32,
    pub world_height: f32,
    /// Substeps per `step` call
    pub substeps: u32,
    /// Gap kept between particle hulls and the walls
    pub margin: f32,
    /// Acceleration given to particles created through the engine
    pub gravity: Vec2,
    pub damping: f32,
    /// Cell policy of the CPU grid
    pub cell_capacity: CellCapacity,
    /// Fixed slots per cell on the device
    pub gpu_cell_capacity: u32,
    /// Worker threads for the CPU pool; 0 picks the available cores
    pub worker_threads: usize,
    pub max_particles: usize,
    /// Reject particles created outside the world instead of clamping them in
    pub enforce_world_bounds: bool,
    /// Copy device state back to the host mirror after every GPU step
    pub gpu_readback: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world_width: 200.0,
            world_height: 200.0,
            substeps: DEFAULT_SUBSTEPS,
            margin: WALL_MARGIN,
            gravity: Vec2::new(0.0, GRAVITY),
            damping: DEFAULT_DAMPING,
            cell_capacity: CellCapacity::Unbounded,
            gpu_cell_capacity: DEFAULT_CELL_CAPACITY as u32,
            worker_threads: 0,
            max_particles: DEFAULT_MAX_PARTICLES,
            enforce_world_bounds: false,
            gpu_readback: true,
        }
    }
}

impl SimulationConfig {
    pub fn with_world(mut self, width: f32, height: f32) -> Self {
        self.world_width = width;
        self.world_height = height;
        self
    }

    pub fn with_substeps(mut self, substeps: u32) -> Self {
        self.substeps = substeps;
        self
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_cell_capacity(mut self, capacity: CellCapacity) -> Self {
        self.cell_capacity = capacity;
        self
    }

    pub fn with_gpu_cell_capacity(mut self, capacity: u32) -> Self {
        self.gpu_cell_capacity = capacity;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn with_max_particles(mut self, max_particles: usize) -> Self {
        self.max_particles = max_particles;
        self
    }

    pub fn with_world_bounds_check(mut self, enforce: bool) -> Self {
        self.enforce_world_bounds = enforce;
        self
    }

    pub fn with_gpu_readback(mut self, readback: bool) -> Self {
        self.gpu_readback = readback;
        self
    }

    /// World rectangle described by this config.
    pub fn world(&self) -> Result<WorldBounds> {
        WorldBounds::new(self.world_width, self.world_height)?.with_margin(self.margin)
    }

    /// Check every field; backends call this before allocating anything.
    ///
    /// Errors:
    /// - `Error::InvalidDimension` for a bad world size.
    /// - `Error::InvalidConfig` for every other inconsistent field.
    pub fn validate(&self) -> Result<()> {
        self.world()?;
        if self.substeps == 0 {
            return Err(Error::InvalidConfig("substeps must be >= 1".into()));
        }
        if !self.gravity.is_finite() {
            return Err(Error::InvalidConfig("gravity must be finite".into()));
        }
        if !self.damping.is_finite() || self.damping < 0.0 {
            return Err(Error::InvalidConfig("damping must be finite and >= 0".into()));
        }
        if self.cell_capacity == CellCapacity::Bounded(0) {
            return Err(Error::InvalidConfig("bounded cells need room for one particle".into()));
        }
        if self.gpu_cell_capacity == 0 {
            return Err(Error::InvalidConfig("gpu_cell_capacity must be >= 1".into()));
        }
        if self.max_particles == 0 || self.max_particles > u32::MAX as usize {
            return Err(Error::InvalidConfig(format!(
                "max_particles must lie in 1..={}",
                u32::MAX
            )));
        }
        Ok(())
    }

    /// Resolved size of the CPU worker pool, capped at `MAX_WORKER_THREADS`.
    pub fn worker_count(&self) -> usize {
        let requested = match self.worker_threads {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        };
        requested.clamp(1, MAX_WORKER_THREADS)
    }
}

/// Uniform block shared by every compute shader (matches `Params` in WGSL)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuParams {
    // x: width, y: height, z: margin, w: damping
    pub world: [f32; 4],

    // x: substep dt, y/z/w: padding
    pub integration: [f32; 4],

    // x: particle_count, y: columns, z: rows, w: cell_capacity
    pub counts: [u32; 4],
}

impl GpuParams {
    pub fn new(world: &WorldBounds, damping: f32, columns: u32, rows: u32, capacity: u32) -> Self {
        Self {
            world: [world.width(), world.height(), world.margin(), damping],
            integration: [0.0; 4],
            counts: [0, columns, rows, capacity],
        }
    }

    /// Same block with the per-step fields replaced.
    pub fn for_step(mut self, sub_dt: f32, particle_count: u32) -> Self {
        self.integration[0] = sub_dt;
        self.counts[0] = particle_count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.substeps, 8);
        assert_eq!(config.gravity, Vec2::new(0.0, 40.0));
    }

    #[test]
    fn invalid_fields_rejected() {
        let base = SimulationConfig::default();
        assert!(matches!(
            base.clone().with_world(0.0, 10.0).validate(),
            Err(Error::InvalidDimension { .. })
        ));
        assert!(base.clone().with_substeps(0).validate().is_err());
        assert!(base.clone().with_damping(-0.5).validate().is_err());
        assert!(base.clone().with_margin(150.0).validate().is_err());
        assert!(base.clone().with_gravity(Vec2::NAN).validate().is_err());
        assert!(base
            .clone()
            .with_cell_capacity(CellCapacity::Bounded(0))
            .validate()
            .is_err());
        assert!(base.clone().with_gpu_cell_capacity(0).validate().is_err());
        assert!(base.with_max_particles(0).validate().is_err());
    }

    #[test]
    fn worker_count_is_capped() {
        let config = SimulationConfig::default().with_worker_threads(64);
        assert_eq!(config.worker_count(), MAX_WORKER_THREADS);
        let auto = SimulationConfig::default().worker_count();
        assert!((1..=MAX_WORKER_THREADS).contains(&auto));
    }

    #[test]
    fn gpu_params_layout() -> Result<()> {
        assert_eq!(std::mem::size_of::<GpuParams>(), 48);
        let world = WorldBounds::new(200.0, 100.0)?;
        let params = GpuParams::new(&world, 40.0, 200, 100, 16).for_step(0.002, 7);
        assert_eq!(params.world, [200.0, 100.0, WALL_MARGIN, 40.0]);
        assert_eq!(params.counts, [7, 200, 100, 16]);
        assert_eq!(params.integration[0], 0.002);
        Ok(())
    }
}
