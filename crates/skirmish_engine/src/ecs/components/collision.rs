//! Collision components for ECS
//!
//! An entity takes part in collision detection when it has a `Position` and a
//! `CollisionBody`. Each polygon in the body carries its own layer and mask so
//! a single character can own a physical body, a hurtbox and a hitbox at once.

use serde::{Deserialize, Serialize};

use crate::ecs::Component;
use crate::physics::{CollisionLayer, Polygon};

/// Set of convex polygons, in local space around the entity's position
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CollisionBody {
    /// Polygons making up the body
    pub polygons: Vec<Polygon>,

    /// Disabled bodies are ignored by detection
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl Component for CollisionBody {}

impl CollisionBody {
    /// Create a body from polygons
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons, enabled: true }
    }

    /// Create a body with a single polygon
    pub fn single(polygon: Polygon) -> Self {
        Self::new(vec![polygon])
    }

    /// Add another polygon (builder pattern)
    #[must_use]
    pub fn with_polygon(mut self, polygon: Polygon) -> Self {
        self.polygons.push(polygon);
        self
    }

    /// Union of the layers of every polygon
    pub fn layers(&self) -> CollisionLayer {
        self.polygons
            .iter()
            .fold(CollisionLayer::empty(), |acc, polygon| acc | polygon.layer)
    }
}
