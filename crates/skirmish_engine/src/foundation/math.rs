//! Math utilities and types
//!
//! Provides the 2D math types used by components and the collision pipeline.

pub use nalgebra::Vector2;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Perpendicular of a vector (rotated 90 degrees counter-clockwise)
pub fn perpendicular(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// True when both components are finite (no NaN, no infinity)
pub fn is_finite_vec(v: &Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

/// Replace non-finite components with zero
///
/// Returns the cleaned vector and whether anything had to be clamped.
pub fn sanitize(v: Vec2) -> (Vec2, bool) {
    let x = if v.x.is_finite() { v.x } else { 0.0 };
    let y = if v.y.is_finite() { v.y } else { 0.0 };
    let clamped = x.to_bits() != v.x.to_bits() || y.to_bits() != v.y.to_bits();
    (Vec2::new(x, y), clamped)
}

/// Serde adapter writing a [`Vec2`] as an `(x, y)` tuple
///
/// Use with `#[serde(with = "crate::foundation::math::vec2_serde")]`.
pub mod vec2_serde {
    use super::Vec2;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize as `(x, y)`
    pub fn serialize<S: Serializer>(v: &Vec2, serializer: S) -> Result<S::Ok, S::Error> {
        (v.x, v.y).serialize(serializer)
    }

    /// Deserialize from `(x, y)`
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec2, D::Error> {
        let (x, y) = <(f32, f32)>::deserialize(deserializer)?;
        Ok(Vec2::new(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perpendicular_is_orthogonal() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.dot(&perpendicular(v)), 0.0);
    }

    #[test]
    fn test_sanitize_clamps_nan_and_infinity() {
        let (clean, clamped) = sanitize(Vec2::new(f32::NAN, f32::INFINITY));
        assert!(clamped);
        assert_eq!(clean, Vec2::zeros());

        let (clean, clamped) = sanitize(Vec2::new(1.5, -2.0));
        assert!(!clamped);
        assert_eq!(clean, Vec2::new(1.5, -2.0));
    }
}
