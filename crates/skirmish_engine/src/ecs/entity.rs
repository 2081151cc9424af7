//! Entity implementation

use std::fmt;

/// Entity identifier
///
/// Ids are handed out by [`World::create_entity`](super::World::create_entity)
/// in increasing order and are never reused, even after the entity is
/// destroyed. Only component slots are recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    id: u64,
}

impl Entity {
    /// Create a new entity with the given ID
    pub(super) fn new(id: u64) -> Self {
        Self { id }
    }

    /// Rebuild a handle from a raw id (e.g. one read back from a save or a log)
    pub fn from_raw(id: u64) -> Self {
        Self { id }
    }

    /// Get the entity ID
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.id)
    }
}
