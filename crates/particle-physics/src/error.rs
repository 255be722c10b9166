use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the physics core.
///
/// Only construction and input validation fail hard. Runtime anomalies inside a
/// substep (coincident particles, overfull cells) are policy decisions of the
/// grid and solver and never surface as errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// World width or height is non-positive or not finite.
    #[error("invalid world dimension {width}x{height}: both sides must be finite and > 0")]
    InvalidDimension { width: f32, height: f32 },

    /// Particle rejected at creation (non-finite state, bad radius or color).
    #[error("invalid particle: {0}")]
    InvalidParticle(String),

    /// Particle placed outside the world while the caller asked for strict bounds.
    #[error("particle at ({x}, {y}) lies outside the world bounds")]
    WorldBoundsViolation { x: f32, y: f32 },

    /// The store already holds its maximum number of particles.
    #[error("particle capacity of {capacity} reached")]
    CapacityExceeded { capacity: usize },

    /// Frame delta time is negative or not finite.
    #[error("invalid time step: {0}")]
    InvalidTimeStep(f32),

    /// Inconsistent simulation configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A bounded cell layout dropped particles from this substep's collision set.
    ///
    /// Never returned from an operation; the grid logs it.
    #[error("{dropped} particle(s) over the cell capacity of {capacity} skip collisions this substep")]
    CellCapacityExceeded { dropped: usize, capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_informative() {
        let e = Error::InvalidDimension {
            width: 0.0,
            height: 10.0,
        };
        let msg = e.to_string();
        assert!(msg.contains("invalid world dimension"));
        assert!(msg.contains("0x10"));
    }

    #[test]
    fn overflow_message_names_capacity() {
        let msg = Error::CellCapacityExceeded {
            dropped: 3,
            capacity: 16,
        }
        .to_string();
        assert!(msg.contains("16"));
        assert!(msg.starts_with('3'));
    }
}
