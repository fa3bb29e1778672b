use crate::core::vec2::Vec2;

/// Disk radius: half of one cell of the fixed 11-unit print grid.
pub const RADIUS: f64 = 1.0 / 11.0 / 2.0;

/// A hard disk with position and velocity.
///
/// `Body` is a plain value; integration and collision resolution build new
/// values and replace entries in the owning sequence by index. Identity is
/// the index within that sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Center of the disk.
    pub point: Vec2,
    /// Velocity in unit-square units per unit simulated time.
    pub velocity: Vec2,
}

impl Body {
    #[inline]
    pub fn new(point: Vec2, velocity: Vec2) -> Self {
        Self { point, velocity }
    }

    /// Velocity magnitude.
    #[inline]
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_is_half_an_eleventh() {
        assert!((RADIUS - 1.0 / 22.0).abs() < 1e-15);
    }

    #[test]
    fn speed_is_velocity_length() {
        let b = Body::new(Vec2::new(0.5, 0.5), Vec2::new(0.3, -0.4));
        assert!((b.speed() - 0.5).abs() < 1e-12);
    }
}
