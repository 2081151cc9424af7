//! ECS Components module
//!
//! Engine-level components consumed by the movement and collision systems.

pub mod transform;
pub mod movement;
pub mod collision;

pub use transform::Position;
pub use movement::{Velocity, Mass};
pub use collision::CollisionBody;
