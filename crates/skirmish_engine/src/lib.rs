//! # Skirmish Engine
//!
//! Gameplay core for a 2D action game: an Entity-Component-System runtime
//! plus the collision and physics pipeline that runs on top of it.
//!
//! ## Features
//!
//! - **ECS Architecture**: Per-type component pools, phase/priority scheduling
//! - **Event Bus**: Typed synchronous publish/subscribe, re-entrant handlers
//! - **Collision Detection**: Grid broad phase, SAT narrow phase, continuous
//!   time-of-impact for fast movers
//! - **Collision Response**: Impulse resolution with positional correction
//! - **Configuration**: TOML/RON engine and physics settings
//!
//! ## Quick Start
//!
//! ```rust
//! use skirmish_engine::prelude::*;
//!
//! let mut world = World::new();
//! register_default_systems(&mut world, &PhysicsConfig::default()).unwrap();
//!
//! let player = world.create_entity();
//! world.add_component(player, Position::new(0.0, 0.0)).unwrap();
//! world.add_component(player, Velocity::new(60.0, 0.0)).unwrap();
//! world
//!     .add_component(
//!         player,
//!         CollisionBody::single(
//!             Polygon::rectangle(1.0, 2.0, CollisionLayer::PLAYER, CollisionLayer::SOLIDS).unwrap(),
//!         ),
//!     )
//!     .unwrap();
//!
//! world.subscribe(|_: &mut World, event: &CollisionEvent| {
//!     assert!(event.contact.penetration >= 0.0);
//! });
//!
//! let mut clock = FrameClock::new();
//! world.run_frame(&clock.tick());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod ecs;
pub mod events;
pub mod spatial;
pub mod physics;

mod engine;

pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Engine, EngineError,
        config::{Config, ConfigError, EngineConfig, PhysicsConfig},
        ecs::{
            components::{CollisionBody, Mass, Position, Velocity},
            Component, Entity, GameState, System, SystemError, SystemPhase, World,
        },
        events::SubscriptionId,
        foundation::{
            math::Vec2,
            time::{FrameClock, FrameTime, Stopwatch},
        },
        physics::{
            register_default_systems, CollisionEvent, CollisionLayer, Contact, ContactPhase, Polygon,
        },
    };
}
