//! Axis-aligned world rectangle

use glam::Vec2;

use crate::constants::WALL_MARGIN;
use crate::error::{Error, Result};

/// The rectangle `[0, width] × [0, height]` with a wall margin.
///
/// Fixed at engine construction; shared by integration (containment) and the
/// spatial grid (extent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    size: Vec2,
    margin: f32,
}

impl WorldBounds {
    /// Errors:
    /// - `Error::InvalidDimension` if either side is non-positive or not finite.
    pub fn new(width: f32, height: f32) -> Result<Self> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(Self {
            size: Vec2::new(width, height),
            margin: WALL_MARGIN,
        })
    }

    /// Replace the wall margin.
    ///
    /// Errors:
    /// - `Error::InvalidConfig` if the margin is negative or leaves no interior.
    pub fn with_margin(mut self, margin: f32) -> Result<Self> {
        if !margin.is_finite() || margin < 0.0 {
            return Err(Error::InvalidConfig("margin must be finite and >= 0".into()));
        }
        if 2.0 * margin >= self.size.min_element() {
            return Err(Error::InvalidConfig(format!(
                "margin {margin} leaves no interior in a {}x{} world",
                self.size.x, self.size.y
            )));
        }
        self.margin = margin;
        Ok(self)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.size.y
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// Clamp a particle centre so its hull stays `margin` away from every wall.
    ///
    /// When the particle is too large for the interior the upper bound wins,
    /// matching the device shader.
    #[inline]
    pub fn clamp(&self, position: Vec2, radius: f32) -> Vec2 {
        let inset = Vec2::splat(self.margin + radius);
        position.max(inset).min(self.size - inset)
    }

    /// Whether `position` lies inside the rectangle (edges included).
    #[inline]
    pub fn contains(&self, position: Vec2) -> bool {
        position.cmpge(Vec2::ZERO).all() && position.cmple(self.size).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_sizes() {
        assert!(matches!(
            WorldBounds::new(0.0, 10.0),
            Err(Error::InvalidDimension { .. })
        ));
        assert!(WorldBounds::new(10.0, -1.0).is_err());
        assert!(WorldBounds::new(f32::NAN, 10.0).is_err());
    }

    #[test]
    fn clamp_is_radius_aware() -> Result<()> {
        let world = WorldBounds::new(100.0, 50.0)?;
        let clamped = world.clamp(Vec2::new(-10.0, 80.0), 0.5);
        assert_eq!(clamped, Vec2::new(2.5, 47.5));
        assert_eq!(world.clamp(Vec2::new(30.0, 20.0), 0.5), Vec2::new(30.0, 20.0));
        Ok(())
    }

    #[test]
    fn margin_must_leave_interior() -> Result<()> {
        let world = WorldBounds::new(10.0, 10.0)?;
        assert!(world.with_margin(5.0).is_err());
        assert_eq!(world.with_margin(1.0)?.margin(), 1.0);
        Ok(())
    }

    #[test]
    fn contains_includes_edges() -> Result<()> {
        let world = WorldBounds::new(10.0, 10.0)?;
        assert!(world.contains(Vec2::new(10.0, 0.0)));
        assert!(!world.contains(Vec2::new(10.01, 5.0)));
        Ok(())
    }
}
