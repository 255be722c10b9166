//! Particle state and color helpers

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::constants::GRAVITY;
use crate::error::{Error, Result};

/// Render color, each channel in 0–255
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255.0, 255.0, 255.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_array([r, g, b]: [f32; 3]) -> Self {
        Self { r, g, b }
    }

    fn is_valid(&self) -> bool {
        self.to_array()
            .iter()
            .all(|c| c.is_finite() && (0.0..=255.0).contains(c))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Convert hue/saturation/value (all in 0–1) to a 0–255 color
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);

    let (r, g, b) = match (sector as i32).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    Rgb::new(r * 255.0, g * 255.0, b * 255.0)
}

/// Kinematic subset of a particle handed to the integrator.
///
/// Layouts copy this in and out so the update is written once for every
/// storage layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub position: Vec2,
    pub previous_position: Vec2,
    pub acceleration: Vec2,
    pub radius: f32,
}

impl Motion {
    /// Displacement over the last substep
    #[inline]
    pub fn displacement(&self) -> Vec2 {
        self.position - self.previous_position
    }
}

/// A circular particle integrated with position Verlet.
///
/// Velocity is never stored: it is the difference between `position` and
/// `previous_position`, measured per substep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub previous_position: Vec2,
    pub acceleration: Vec2,
    pub radius: f32,
    pub color: Rgb,
}

impl Particle {
    /// Create a particle moving with `velocity` (world units per substep).
    ///
    /// The acceleration defaults to `(0, GRAVITY)`.
    ///
    /// Errors:
    /// - `Error::InvalidParticle` for non-finite position or velocity, a negative
    ///   or non-finite radius, or a color channel outside 0–255.
    pub fn new(position: Vec2, velocity: Vec2, radius: f32, color: Rgb) -> Result<Self> {
        if !position.is_finite() {
            return Err(Error::InvalidParticle("position must be finite".into()));
        }
        if !velocity.is_finite() {
            return Err(Error::InvalidParticle("velocity must be finite".into()));
        }
        if !radius.is_finite() || radius < 0.0 {
            return Err(Error::InvalidParticle("radius must be finite and >= 0".into()));
        }
        if !color.is_valid() {
            return Err(Error::InvalidParticle(
                "color channels must lie in 0..=255".into(),
            ));
        }

        Ok(Self {
            position,
            previous_position: position - velocity,
            acceleration: Vec2::new(0.0, GRAVITY),
            radius,
            color,
        })
    }

    /// Replace the constant acceleration.
    pub fn with_acceleration(mut self, acceleration: Vec2) -> Result<Self> {
        if !acceleration.is_finite() {
            return Err(Error::InvalidParticle("acceleration must be finite".into()));
        }
        self.acceleration = acceleration;
        Ok(self)
    }

    /// Re-check a particle that was assembled field by field.
    pub fn validate(&self) -> Result<()> {
        if !self.position.is_finite() || !self.previous_position.is_finite() {
            return Err(Error::InvalidParticle("position must be finite".into()));
        }
        if !self.acceleration.is_finite() {
            return Err(Error::InvalidParticle("acceleration must be finite".into()));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(Error::InvalidParticle("radius must be finite and >= 0".into()));
        }
        if !self.color.is_valid() {
            return Err(Error::InvalidParticle(
                "color channels must lie in 0..=255".into(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn velocity(&self) -> Vec2 {
        self.position - self.previous_position
    }

    #[inline]
    pub fn motion(&self) -> Motion {
        Motion {
            position: self.position,
            previous_position: self.previous_position,
            acceleration: self.acceleration,
            radius: self.radius,
        }
    }

    /// Write back the integrated part of `motion`.
    #[inline]
    pub fn apply_motion(&mut self, motion: Motion) {
        self.position = motion.position;
        self.previous_position = motion.previous_position;
    }
}
