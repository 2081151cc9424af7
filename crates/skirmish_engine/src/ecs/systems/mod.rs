//! ECS Systems module

pub mod movement_system;

pub use movement_system::{sanitize_velocities, MovementSystem};
