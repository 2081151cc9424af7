//! Movement components for entities that can move in 2D space
//!
//! A `Velocity` opts an entity into being dynamic: the collision pipeline
//! sweeps it and the response system may push it. `Mass` is optional and only
//! meaningful next to a `Velocity`.

use serde::{Deserialize, Serialize};

use crate::ecs::Component;
use crate::foundation::math::Vec2;

/// Linear velocity in units per second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity {
    /// Velocity vector
    #[serde(with = "crate::foundation::math::vec2_serde")]
    pub value: Vec2,
}

impl Component for Velocity {}

impl Velocity {
    /// Create a velocity from components
    pub fn new(x: f32, y: f32) -> Self {
        Self { value: Vec2::new(x, y) }
    }

    /// Create a velocity from a vector
    pub fn from_vec(value: Vec2) -> Self {
        Self { value }
    }

    /// Add to velocity
    pub fn add(&mut self, delta: Vec2) {
        self.value += delta;
    }

    /// True when the body is not moving this frame
    pub fn is_zero(&self) -> bool {
        self.value.x == 0.0 && self.value.y == 0.0
    }
}

/// Mass of a dynamic body
///
/// Non-positive or non-finite values are treated as infinite mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mass(pub f32);

impl Component for Mass {}

impl Mass {
    /// Inverse mass; zero means immovable
    pub fn inverse(&self) -> f32 {
        if self.0.is_finite() && self.0 > 0.0 {
            1.0 / self.0
        } else {
            0.0
        }
    }
}

impl Default for Mass {
    fn default() -> Self {
        Self(1.0)
    }
}
