//! Core engine implementation
//!
//! Ties configuration, logging and the frame clock to a [`World`] with the
//! default physics systems registered.

use crate::{
    config::{Config, ConfigError, EngineConfig},
    ecs::World,
    foundation::{logging, time::{FrameClock, FrameTime}},
    physics::register_default_systems,
};
use thiserror::Error;

/// Main engine struct
///
/// Owns the world and drives it one frame at a time, either from the wall
/// clock or with caller-supplied fixed steps.
pub struct Engine {
    /// ECS world containing all entities, components, and systems
    pub world: World,

    /// Frame timing
    clock: FrameClock,

    /// Last frame handed to the world
    last_frame: Option<FrameTime>,

    /// Engine configuration
    config: EngineConfig,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        logging::init_with_level(&config.log_level);
        log::info!("Initializing engine...");

        let mut world = World::new();
        world.systems_mut().set_profiling(config.profiling);
        register_default_systems(&mut world, &config.physics)?;

        Ok(Self {
            world,
            clock: FrameClock::new(),
            last_frame: None,
            config,
        })
    }

    /// Create an engine from a TOML or RON configuration file
    pub fn from_config_file(path: &str) -> Result<Self, EngineError> {
        let config = EngineConfig::load_from_file(path)?;
        Self::new(config)
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one frame timed by the wall clock
    pub fn step(&mut self) -> FrameTime {
        let time = self.clock.tick();
        self.run(time)
    }

    /// Run one frame of exactly `delta` seconds
    pub fn step_fixed(&mut self, delta: f32) -> FrameTime {
        let time = match self.last_frame {
            Some(previous) => previous.advance(delta),
            None => FrameTime::from_delta(delta),
        };
        self.run(time)
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u64 {
        self.last_frame.map_or(0, |time| time.frame + 1)
    }

    fn run(&mut self, time: FrameTime) -> FrameTime {
        self.world.run_frame(&time);
        self.last_frame = Some(time);
        time
    }
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
