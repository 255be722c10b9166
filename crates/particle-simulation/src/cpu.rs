//! Multi-threaded CPU backend

use particle_physics::{
    ContactSolver, Integrator, Particle, ParticleStore, ParticleVec, SpatialGrid, WorldBounds,
};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::backend::{SimulationBackend, SubstepReport};
use crate::error::Result;
use crate::params::SimulationConfig;

/// Runs every substep on an owned rayon pool.
///
/// The pool is sized once from the config and never grows. Each parallel
/// region (integration, cell assignment, contact stripes, scatter) finishes
/// before the next one starts.
pub struct CpuBackend<S: ParticleStore = ParticleVec> {
    pool: ThreadPool,
    store: S,
    grid: SpatialGrid,
    solver: ContactSolver,
    integrator: Integrator,
}

impl CpuBackend<ParticleVec> {
    /// Array-of-structs storage.
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        Self::with_store(config, ParticleVec::new())
    }
}

impl<S: ParticleStore> CpuBackend<S> {
    /// Use `store` as particle storage; it may already hold particles.
    pub fn with_store(config: &SimulationConfig, store: S) -> Result<Self> {
        config.validate()?;
        let world = config.world()?;
        let integrator = Integrator::new(world).with_damping(config.damping)?;
        let grid = SpatialGrid::new(world.width(), world.height())?
            .with_capacity_policy(config.cell_capacity);

        let threads = config.worker_count();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pbd-worker-{i}"))
            .build()?;

        log::info!(
            "✓ CPU backend: {threads} worker threads, {}x{} grid cells",
            grid.columns(),
            grid.rows()
        );

        Ok(Self {
            pool,
            store,
            grid,
            solver: ContactSolver::new(),
            integrator,
        })
    }

    /// Read-only bulk access for renderers.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl<S: ParticleStore> SimulationBackend for CpuBackend<S> {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn world(&self) -> &WorldBounds {
        self.integrator.world()
    }

    fn particle_count(&self) -> usize {
        self.store.len()
    }

    fn particle(&self, index: usize) -> Option<Particle> {
        self.store.get(index)
    }

    fn push(&mut self, particle: Particle) -> Result<usize> {
        Ok(self.store.push(particle))
    }

    fn substep(&mut self, dt: f32) -> Result<SubstepReport> {
        let Self {
            pool,
            store,
            grid,
            solver,
            integrator,
        } = self;

        let report = pool.install(|| {
            if dt > 0.0 {
                integrator.integrate(store, dt);
            }
            let dropped = grid.rebuild(store);
            let solved = solver.solve(grid, store);
            SubstepReport {
                contacts: solved.contacts,
                degenerate: solved.degenerate,
                dropped,
            }
        });

        log::trace!(
            "Substep dt={dt}: {} contacts, {} dropped",
            report.contacts,
            report.dropped
        );
        Ok(report)
    }
}
