//! ECS error types

use super::Entity;
use thiserror::Error;

/// Errors raised by entity and component access
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// A component was requested from an entity that does not hold one
    #[error("{entity} has no {component} component")]
    MissingComponent {
        /// Entity that was queried
        entity: Entity,
        /// Type name of the requested component
        component: &'static str,
    },

    /// The entity was never created or has been destroyed
    #[error("{0} is not alive")]
    UnknownEntity(Entity),

    /// No deserializer is registered under this tag
    #[error("No component registered for tag '{0}'")]
    UnknownComponentTag(String),

    /// The payload for a registered tag could not be decoded
    #[error("Failed to decode component '{tag}': {message}")]
    ComponentDecode {
        /// Tag the payload was submitted under
        tag: String,
        /// Decoder message
        message: String,
    },
}
