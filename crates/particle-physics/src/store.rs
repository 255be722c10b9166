//! Particle storage layouts
//!
//! Algorithms are written once against [`ParticleStore`]; the CPU path
//! defaults to the array-of-structs [`ParticleVec`], the GPU path keeps a
//! structure-of-arrays [`ParticleColumns`] mirror whose columns upload as-is.

use glam::Vec2;
use rayon::prelude::*;

use crate::particle::{Motion, Particle, Rgb};

/// Append-only particle storage addressed by dense indices.
///
/// `position` and `radius` panic on out-of-range indices like slice indexing;
/// `get` is the checked accessor.
pub trait ParticleStore: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a particle and return its index.
    fn push(&mut self, particle: Particle) -> usize;

    /// Gather the full particle at `index`.
    fn get(&self, index: usize) -> Option<Particle>;

    fn position(&self, index: usize) -> Vec2;

    fn radius(&self, index: usize) -> f32;

    /// Replace the kinematic state of every particle, in parallel.
    fn par_update_motion<F>(&mut self, f: F)
    where
        F: Fn(Motion) -> Motion + Send + Sync;

    /// Replace every position, in parallel. `f` receives the index and the
    /// current position.
    fn par_update_positions<F>(&mut self, f: F)
    where
        F: Fn(usize, Vec2) -> Vec2 + Send + Sync;
}

/// Array-of-structs layout
#[derive(Debug, Clone, Default)]
pub struct ParticleVec {
    particles: Vec<Particle>,
}

impl ParticleVec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
        }
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.particles.iter()
    }
}

impl ParticleStore for ParticleVec {
    #[inline]
    fn len(&self) -> usize {
        self.particles.len()
    }

    fn push(&mut self, particle: Particle) -> usize {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    fn get(&self, index: usize) -> Option<Particle> {
        self.particles.get(index).copied()
    }

    #[inline]
    fn position(&self, index: usize) -> Vec2 {
        self.particles[index].position
    }

    #[inline]
    fn radius(&self, index: usize) -> f32 {
        self.particles[index].radius
    }

    fn par_update_motion<F>(&mut self, f: F)
    where
        F: Fn(Motion) -> Motion + Send + Sync,
    {
        self.particles.par_iter_mut().for_each(|particle| {
            let motion = f(particle.motion());
            particle.apply_motion(motion);
        });
    }

    fn par_update_positions<F>(&mut self, f: F)
    where
        F: Fn(usize, Vec2) -> Vec2 + Send + Sync,
    {
        self.particles
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, particle)| particle.position = f(index, particle.position));
    }
}

/// Structure-of-arrays layout, one column per attribute.
///
/// Vector columns are `[f32; 2]` so each one casts to bytes for device upload.
#[derive(Debug, Clone, Default)]
pub struct ParticleColumns {
    positions: Vec<[f32; 2]>,
    previous_positions: Vec<[f32; 2]>,
    accelerations: Vec<[f32; 2]>,
    radii: Vec<f32>,
    colors: Vec<Rgb>,
}

impl ParticleColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            previous_positions: Vec::with_capacity(capacity),
            accelerations: Vec::with_capacity(capacity),
            radii: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
        }
    }

    pub fn positions(&self) -> &[[f32; 2]] {
        &self.positions
    }

    pub fn previous_positions(&self) -> &[[f32; 2]] {
        &self.previous_positions
    }

    pub fn accelerations(&self) -> &[[f32; 2]] {
        &self.accelerations
    }

    pub fn radii(&self) -> &[f32] {
        &self.radii
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Overwrite the integrated columns, e.g. after a device readback.
    ///
    /// Both slices must be no longer than the store; shorter slices update a
    /// prefix.
    pub fn overwrite_kinematics(&mut self, positions: &[[f32; 2]], previous: &[[f32; 2]]) {
        self.positions[..positions.len()].copy_from_slice(positions);
        self.previous_positions[..previous.len()].copy_from_slice(previous);
    }
}

impl ParticleStore for ParticleColumns {
    #[inline]
    fn len(&self) -> usize {
        self.positions.len()
    }

    fn push(&mut self, particle: Particle) -> usize {
        self.positions.push(particle.position.to_array());
        self.previous_positions
            .push(particle.previous_position.to_array());
        self.accelerations.push(particle.acceleration.to_array());
        self.radii.push(particle.radius);
        self.colors.push(particle.color);
        self.positions.len() - 1
    }

    fn get(&self, index: usize) -> Option<Particle> {
        Some(Particle {
            position: Vec2::from_array(*self.positions.get(index)?),
            previous_position: Vec2::from_array(self.previous_positions[index]),
            acceleration: Vec2::from_array(self.accelerations[index]),
            radius: self.radii[index],
            color: self.colors[index],
        })
    }

    #[inline]
    fn position(&self, index: usize) -> Vec2 {
        Vec2::from_array(self.positions[index])
    }

    #[inline]
    fn radius(&self, index: usize) -> f32 {
        self.radii[index]
    }

    fn par_update_motion<F>(&mut self, f: F)
    where
        F: Fn(Motion) -> Motion + Send + Sync,
    {
        (
            &mut self.positions[..],
            &mut self.previous_positions[..],
            &self.accelerations[..],
            &self.radii[..],
        )
            .into_par_iter()
            .for_each(|(position, previous, acceleration, radius)| {
                let motion = f(Motion {
                    position: Vec2::from_array(*position),
                    previous_position: Vec2::from_array(*previous),
                    acceleration: Vec2::from_array(*acceleration),
                    radius: *radius,
                });
                *position = motion.position.to_array();
                *previous = motion.previous_position.to_array();
            });
    }

    fn par_update_positions<F>(&mut self, f: F)
    where
        F: Fn(usize, Vec2) -> Vec2 + Send + Sync,
    {
        self.positions
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, position)| {
                *position = f(index, Vec2::from_array(*position)).to_array();
            });
    }
}
