//! Simulation constants
//!
//! World units are grid cells: one cell is 1×1 and the default particle has a
//! diameter of exactly one cell.

/// Downward acceleration applied to newly created particles (+y points down)
pub const GRAVITY: f32 = 40.0;

/// Default particle radius
pub const DEFAULT_RADIUS: f32 = 0.5;

/// Side length of a grid cell
pub const CELL_SIZE: f32 = 1.0;

/// Distance kept free between the world edge and the particle hull
pub const WALL_MARGIN: f32 = 2.0;

/// Velocity damping coefficient used by the Verlet update
/// `p' = p + d + (a - d * DAMPING) * dt²`
pub const DEFAULT_DAMPING: f32 = 40.0;

/// Substeps per rendered frame
pub const DEFAULT_SUBSTEPS: u32 = 8;

/// Pairs closer than this are treated as coincident and left alone
pub const CONTACT_EPSILON: f32 = 1.0e-4;

/// Per-cell slot count of the fixed-capacity grid layout
pub const DEFAULT_CELL_CAPACITY: usize = 16;

/// Upper bound for the CPU worker pool
pub const MAX_WORKER_THREADS: usize = 16;

/// Particle capacity (matches the device allocation of the GPU path)
pub const DEFAULT_MAX_PARTICLES: usize = 500_000;
