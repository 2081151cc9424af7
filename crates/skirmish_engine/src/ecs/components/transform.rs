//! Position component for the ECS system
//!
//! Pure data component: world-space position of an entity's origin. Collision
//! polygons are authored relative to this point.

use serde::{Deserialize, Serialize};

use crate::ecs::Component;
use crate::foundation::math::Vec2;

/// World-space position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// World space position (Y-up)
    #[serde(with = "crate::foundation::math::vec2_serde")]
    pub value: Vec2,
}

impl Component for Position {}

impl Position {
    /// Create a position from coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { value: Vec2::new(x, y) }
    }

    /// Create a position from a vector
    pub fn from_vec(value: Vec2) -> Self {
        Self { value }
    }

    /// Move by `offset`
    pub fn translate(&mut self, offset: Vec2) {
        self.value += offset;
    }
}
