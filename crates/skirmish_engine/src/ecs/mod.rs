//! Entity-Component-System implementation
//!
//! Dense per-type component pools, a phase/priority scheduler and a typed
//! synchronous event bus, all owned by a single [`World`].

pub mod world;
pub mod entity;
pub mod component;
pub mod error;
pub mod storage;
pub mod system;
pub mod scheduler;
pub mod registry;
pub mod components;
pub mod systems;

#[cfg(test)]
mod tests;

pub use world::{World, GameState};
pub use entity::Entity;
pub use component::Component;
pub use error::EcsError;
pub use storage::{ComponentPool, ErasedPool};
pub use system::{System, SystemError, SystemPhase};
pub use scheduler::{SystemManager, SystemInfo, SystemProfile};
pub use registry::{EntityRegistry, ComponentRegistry};
