//! Physics module for collision detection and response
//!
//! Convex polygon shapes tagged with collision layers, a grid broad phase,
//! SAT narrow phase with continuous time-of-impact search, contact lifecycle
//! events and an impulse resolver that consumes them.

pub mod collision_layers;
pub mod shapes;
pub mod contact;
pub mod collision_system;
pub mod response_system;

pub use collision_layers::CollisionLayer;
pub use shapes::{sat_test, Aabb, Polygon, PolygonDef, SatResult};
pub use contact::{CollisionEvent, Contact, ContactKey, ContactPhase};
pub use collision_system::{CollisionDetectionSystem, DetectionStats};
pub use response_system::{inverse_mass, resolve_contact, CollisionResponseSystem};

use thiserror::Error;

use crate::config::{ConfigError, PhysicsConfig};
use crate::ecs::systems::MovementSystem;
use crate::ecs::{SystemPhase, World};

/// Priority of collision detection inside [`SystemPhase::Update`]
pub const DETECTION_PRIORITY: i32 = 0;
/// Priority of collision response inside [`SystemPhase::Update`]
pub const RESPONSE_PRIORITY: i32 = 10;
/// Priority of position integration inside [`SystemPhase::Update`]
pub const MOVEMENT_PRIORITY: i32 = 20;

/// Physics errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PhysicsError {
    /// Polygon failed validation
    #[error("Degenerate polygon: {reason}")]
    DegeneratePolygon {
        /// What was wrong with it
        reason: String,
    },

    /// Spatial grid could not be built for the requested bounds
    #[error("Invalid spatial grid: {reason}")]
    InvalidGrid {
        /// What was wrong with it
        reason: String,
    },
}

/// Register detection, response and movement in the `Update` phase
///
/// Detection runs first so contacts are judged on the positions the frame
/// started with, response consumes the published events, and movement
/// integrates the corrected velocities last. The configuration is validated
/// before anything is registered.
pub fn register_default_systems(world: &mut World, config: &PhysicsConfig) -> Result<(), ConfigError> {
    config.validate()?;

    world.add_system(
        Box::new(CollisionDetectionSystem::new(config.clone())),
        SystemPhase::Update,
        DETECTION_PRIORITY,
    );
    world.add_system(
        Box::new(CollisionResponseSystem::new(config.clone())),
        SystemPhase::Update,
        RESPONSE_PRIORITY,
    );
    world.add_system(Box::new(MovementSystem::new()), SystemPhase::Update, MOVEMENT_PRIORITY);
    Ok(())
}
