use rand::Rng;
use std::f64::consts::TAU;
use std::ops::{Add, Mul, Sub};

/// Immutable 2D vector used for both positions and velocities.
///
/// All arithmetic produces new values; bodies are replaced wholesale each
/// step rather than mutated component-wise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    #[inline]
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the direction of `self`.
    ///
    /// Division by a zero length yields non-finite components; in that case a
    /// uniformly random unit vector is returned instead. This is the only
    /// handling of degenerate vectors in the engine, so collision resolution
    /// of a body at rest picks a random contact frame rather than failing.
    pub fn norm<R: Rng>(&self, rng: &mut R) -> Vec2 {
        let length = self.length();
        let result = Vec2::new(self.x / length, self.y / length);

        if result.x.is_finite() && result.y.is_finite() {
            return result;
        }

        Vec2::random_unit(rng)
    }

    /// Random unit vector from a uniform angle in `[0, 2π)`.
    pub fn random_unit<R: Rng>(rng: &mut R) -> Vec2 {
        let phi = rng.random_range(0.0..TAU);
        Vec2::new(phi.cos(), phi.sin())
    }

    /// Random vector with uniform direction and magnitude in `[0, max_magnitude)`.
    pub fn random_with_magnitude<R: Rng>(rng: &mut R, max_magnitude: f64) -> Vec2 {
        Vec2::random_unit(rng) * rng.random_range(0.0..max_magnitude)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    #[inline]
    fn mul(self, value: f64) -> Vec2 {
        Vec2::new(self.x * value, self.y * value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn arithmetic_ops() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(0.5, -1.0);
        assert_eq!(a + b, Vec2::new(1.5, 1.0));
        assert_eq!(a - b, Vec2::new(0.5, 3.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
    }

    #[test]
    fn length_is_euclidean() {
        assert!((Vec2::new(3.0, 4.0).length() - 5.0).abs() < 1e-12);
        assert_eq!(Vec2::ZERO.length(), 0.0);
    }

    #[test]
    fn norm_returns_unit_vector() {
        let mut rng = StdRng::seed_from_u64(1);
        let v = Vec2::new(3.0, -4.0).norm(&mut rng);
        assert!((v.length() - 1.0).abs() < 1e-12);
        assert!((v.x - 0.6).abs() < 1e-12);
        assert!((v.y + 0.8).abs() < 1e-12);
    }

    #[test]
    fn norm_of_zero_vector_falls_back_to_random_unit() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..32 {
            let v = Vec2::ZERO.norm(&mut rng);
            assert!(v.x.is_finite() && v.y.is_finite());
            assert!((v.length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn random_with_magnitude_stays_below_bound() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..64 {
            let v = Vec2::random_with_magnitude(&mut rng, 1.0);
            assert!(v.length() < 1.0);
        }
    }
}
