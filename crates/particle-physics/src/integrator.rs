//! Damped position-Verlet integration with wall containment

use crate::constants::DEFAULT_DAMPING;
use crate::error::{Error, Result};
use crate::particle::Motion;
use crate::store::ParticleStore;
use crate::world::WorldBounds;

#[derive(Debug, Clone, Copy)]
pub struct Integrator {
    world: WorldBounds,
    damping: f32,
}

impl Integrator {
    pub fn new(world: WorldBounds) -> Self {
        Self {
            world,
            damping: DEFAULT_DAMPING,
        }
    }

    /// Errors:
    /// - `Error::InvalidConfig` for a negative or non-finite coefficient.
    pub fn with_damping(mut self, damping: f32) -> Result<Self> {
        if !damping.is_finite() || damping < 0.0 {
            return Err(Error::InvalidConfig("damping must be finite and >= 0".into()));
        }
        self.damping = damping;
        Ok(self)
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn world(&self) -> &WorldBounds {
        &self.world
    }

    /// One Verlet update over `dt`:
    /// `p' = p + d + (a - d * damping) * dt²` with `d = p - p_prev`, clamped
    /// into the world, then `p_prev' = p`.
    ///
    /// Only stable for small substep times; large `dt` lets the damping term
    /// overshoot and inject energy.
    #[inline]
    pub fn advance(&self, motion: Motion, dt: f32) -> Motion {
        let displacement = motion.displacement();
        let next = motion.position
            + displacement
            + (motion.acceleration - displacement * self.damping) * (dt * dt);

        Motion {
            position: self.world.clamp(next, motion.radius),
            previous_position: motion.position,
            ..motion
        }
    }

    /// Advance every particle of `store` in parallel.
    pub fn integrate<S: ParticleStore>(&self, store: &mut S, dt: f32) {
        store.par_update_motion(|motion| self.advance(motion, dt));
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::constants::{GRAVITY, WALL_MARGIN};
    use crate::particle::{Particle, Rgb};
    use crate::store::{ParticleColumns, ParticleVec};

    fn world() -> WorldBounds {
        WorldBounds::new(200.0, 200.0).expect("valid world")
    }

    #[test]
    fn resting_particle_falls_with_gravity() {
        let integrator = Integrator::new(world());
        let dt = 1.0 / 480.0;
        let start = Motion {
            position: Vec2::new(100.0, 100.0),
            previous_position: Vec2::new(100.0, 100.0),
            acceleration: Vec2::new(0.0, GRAVITY),
            radius: 0.5,
        };
        let next = integrator.advance(start, dt);
        assert_eq!(next.previous_position, start.position);
        assert!((next.position.y - (100.0 + GRAVITY * dt * dt)).abs() < 1e-5);
        assert_eq!(next.position.x, 100.0);
    }

    #[test]
    fn damping_slows_motion() -> Result<()> {
        let dt = 0.05;
        let start = Motion {
            position: Vec2::new(50.0, 50.0),
            previous_position: Vec2::new(49.0, 50.0),
            acceleration: Vec2::ZERO,
            radius: 0.5,
        };
        let free = Integrator::new(world()).with_damping(0.0)?.advance(start, dt);
        let damped = Integrator::new(world()).with_damping(10.0)?.advance(start, dt);
        assert_eq!(free.position.x, 51.0);
        assert!(damped.position.x < free.position.x);
        assert!(damped.position.x > 50.0);
        Ok(())
    }

    #[test]
    fn wall_clamp_respects_margin_and_radius() {
        let integrator = Integrator::new(world());
        let fast = Motion {
            position: Vec2::new(10.0, 100.0),
            previous_position: Vec2::new(60.0, 100.0),
            acceleration: Vec2::ZERO,
            radius: 0.75,
        };
        let next = integrator.advance(fast, 1.0 / 480.0);
        assert_eq!(next.position.x, WALL_MARGIN + 0.75);
    }

    #[test]
    fn negative_damping_rejected() {
        assert!(Integrator::new(world()).with_damping(-1.0).is_err());
    }

    #[test]
    fn layouts_integrate_identically() -> Result<()> {
        let integrator = Integrator::new(world());
        let mut aos = ParticleVec::new();
        let mut soa = ParticleColumns::new();
        for i in 0..64 {
            let particle = Particle::new(
                Vec2::new(10.0 + i as f32 * 2.0, 20.0 + (i % 7) as f32),
                Vec2::new((i % 3) as f32 * 0.1, -0.05),
                0.5,
                Rgb::WHITE,
            )?;
            aos.push(particle);
            soa.push(particle);
        }

        for _ in 0..10 {
            integrator.integrate(&mut aos, 1.0 / 480.0);
            integrator.integrate(&mut soa, 1.0 / 480.0);
        }

        for i in 0..64 {
            assert_eq!(aos.get(i), soa.get(i));
        }
        Ok(())
    }
}
