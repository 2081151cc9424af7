//! System trait and implementations

use crate::ecs::{EcsError, World};
use crate::foundation::time::FrameTime;
use thiserror::Error;

/// System execution phases with explicit ordering
///
/// One frame runs every phase once, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemPhase {
    /// Input sampling
    Input = 0,
    /// Entity lifecycle management, pre-simulation bookkeeping
    PreUpdate = 1,
    /// Game logic, physics simulation
    Update = 2,
    /// Reactions to this frame's simulation results
    PostUpdate = 3,
    /// Render command generation
    Render = 4,
    /// End-of-frame cleanup
    Terminal = 5,
}

impl SystemPhase {
    /// Every phase in execution order
    pub const ALL: [SystemPhase; 6] = [
        SystemPhase::Input,
        SystemPhase::PreUpdate,
        SystemPhase::Update,
        SystemPhase::PostUpdate,
        SystemPhase::Render,
        SystemPhase::Terminal,
    ];

    /// Position of this phase in [`SystemPhase::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Error reported by a failing system update
#[derive(Error, Debug)]
pub enum SystemError {
    /// Component access failed
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// Any other failure, described by the system
    #[error("{0}")]
    Failed(String),
}

/// System trait for processing entities and components
pub trait System {
    /// Name used in logs and profiling reports
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Called once when the system is added to a world
    fn initialize(&mut self, _world: &mut World) {}

    /// Run the system for one phase pass
    fn update(&mut self, world: &mut World, time: &FrameTime) -> Result<(), SystemError>;

    /// Whether the system is skipped while the game is paused
    fn is_pausable(&self) -> bool {
        true
    }
}
