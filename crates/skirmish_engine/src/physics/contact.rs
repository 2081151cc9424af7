//! Contact data and collision lifecycle events
//!
//! A [`Contact`] is the transient result of one overlapping polygon pair in
//! one frame. The detection system compares this frame's contacts against the
//! previous frame's active set and publishes a [`CollisionEvent`] per pair:
//! `Begin` when the pair starts touching, `Stay` while it keeps touching and
//! `End` once it stops.

use crate::ecs::Entity;
use crate::foundation::math::Vec2;

use super::CollisionLayer;

/// Geometric result of one overlapping polygon pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Entity with the lower id
    pub entity_a: Entity,
    /// Entity with the higher id
    pub entity_b: Entity,
    /// Unit normal pointing from A toward B
    pub normal: Vec2,
    /// Approximate world-space contact point (deepest vertex of A)
    pub point: Vec2,
    /// Overlap depth along `normal`
    pub penetration: f32,
    /// Fraction of the frame step at which the pair first touched, in `[0, 1]`
    pub time_of_impact: f32,
    /// Layer of A's polygon
    pub layer_a: CollisionLayer,
    /// Layer of B's polygon
    pub layer_b: CollisionLayer,
}

impl Contact {
    /// Whether either side is a gameplay trigger (hitbox / hurtbox)
    pub fn is_trigger(&self) -> bool {
        self.layer_a.is_trigger() || self.layer_b.is_trigger()
    }

    /// Whether `entity` is one of the two participants
    pub fn involves(&self, entity: Entity) -> bool {
        self.entity_a == entity || self.entity_b == entity
    }

    /// The participant that is not `entity`
    pub fn other(&self, entity: Entity) -> Option<Entity> {
        if entity == self.entity_a {
            Some(self.entity_b)
        } else if entity == self.entity_b {
            Some(self.entity_a)
        } else {
            None
        }
    }

    /// Contact normal as seen from `entity`, pointing toward the other side
    pub fn normal_from(&self, entity: Entity) -> Option<Vec2> {
        if entity == self.entity_a {
            Some(self.normal)
        } else if entity == self.entity_b {
            Some(-self.normal)
        } else {
            None
        }
    }

    /// Layer of the polygon belonging to `entity`
    pub fn layer_of(&self, entity: Entity) -> Option<CollisionLayer> {
        if entity == self.entity_a {
            Some(self.layer_a)
        } else if entity == self.entity_b {
            Some(self.layer_b)
        } else {
            None
        }
    }

    /// Key identifying this contact's pair in the active set
    pub fn key(&self) -> ContactKey {
        ContactKey {
            entity_a: self.entity_a,
            entity_b: self.entity_b,
            layer_a: self.layer_a.bits(),
            layer_b: self.layer_b.bits(),
        }
    }
}

/// Identity of a contact pair across frames
///
/// The key is the entity pair plus the layers of the two touching polygons.
/// Two entities touching through differently tagged polygons (a body contact
/// and a hitbox contact, say) are tracked as separate pairs, so one entity
/// pair can see several `Begin` events without an `End` in between, one per
/// layer combination. Use [`CollisionDetectionSystem::is_touching`] for an
/// entity-level view.
///
/// [`CollisionDetectionSystem::is_touching`]: super::CollisionDetectionSystem::is_touching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContactKey {
    /// Entity with the lower id
    pub entity_a: Entity,
    /// Entity with the higher id
    pub entity_b: Entity,
    /// Raw bits of A's layer
    pub layer_a: u32,
    /// Raw bits of B's layer
    pub layer_b: u32,
}

/// Lifecycle stage of a contact pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactPhase {
    /// The pair started touching this frame
    Begin,
    /// The pair was touching last frame and still is
    Stay,
    /// The pair was touching last frame and no longer is
    End,
}

/// Event published on the world's bus for every active or ending pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// Lifecycle stage
    pub phase: ContactPhase,
    /// This frame's contact, or the last one seen for `End`
    pub contact: Contact,
}
