//! World-owned lookup tables
//!
//! [`EntityRegistry`] maps stable names ("player", "boss_door") to entities.
//! It is owned by the [`World`], filled at load time and cleared at teardown,
//! so there is no process-wide lookup state.
//!
//! [`ComponentRegistry`] is the data-driven entry point for components: a table
//! from a component tag to a closure that decodes exactly one component type
//! from RON text and attaches it. Build it once at startup and hand it to
//! whatever loads level or character data.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use super::{Component, EcsError, Entity, World};

/// Name → entity lookup owned by a world
#[derive(Debug, Default, Clone)]
pub struct EntityRegistry {
    by_name: HashMap<String, Entity>,
    by_entity: HashMap<Entity, String>,
}

impl EntityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `entity`, returning the entity previously bound to it
    ///
    /// An entity carries at most one name; registering it again renames it.
    pub fn register(&mut self, name: impl Into<String>, entity: Entity) -> Option<Entity> {
        let name = name.into();

        if let Some(old_name) = self.by_entity.remove(&entity) {
            self.by_name.remove(&old_name);
        }

        let previous = self.by_name.insert(name.clone(), entity);
        if let Some(previous) = previous {
            self.by_entity.remove(&previous);
        }
        self.by_entity.insert(entity, name);
        previous
    }

    /// Entity bound to `name`
    pub fn lookup(&self, name: &str) -> Option<Entity> {
        self.by_name.get(name).copied()
    }

    /// Name bound to `entity`
    pub fn name_of(&self, entity: Entity) -> Option<&str> {
        self.by_entity.get(&entity).map(String::as_str)
    }

    /// Forget whatever name `entity` has
    pub fn unregister_entity(&mut self, entity: Entity) -> Option<String> {
        let name = self.by_entity.remove(&entity)?;
        self.by_name.remove(&name);
        Some(name)
    }

    /// Forget the binding for `name`
    pub fn unregister_name(&mut self, name: &str) -> Option<Entity> {
        let entity = self.by_name.remove(name)?;
        self.by_entity.remove(&entity);
        Some(entity)
    }

    /// Number of named entities
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Drop every binding
    pub fn clear(&mut self) {
        self.by_name.clear();
        self.by_entity.clear();
    }
}

type ApplyFn = Box<dyn Fn(&mut World, Entity, &str) -> Result<(), EcsError>>;

/// Tag → "decode and attach" dispatch table
#[derive(Default)]
pub struct ComponentRegistry {
    appliers: HashMap<String, ApplyFn>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register component type `T` under `tag`
    ///
    /// Registering the same tag twice replaces the earlier decoder.
    pub fn register<T>(&mut self, tag: impl Into<String>) -> &mut Self
    where
        T: Component + DeserializeOwned,
    {
        let tag = tag.into();
        let owned_tag = tag.clone();
        self.appliers.insert(
            tag,
            Box::new(move |world: &mut World, entity: Entity, payload: &str| {
                let value: T = ron::from_str(payload).map_err(|e| EcsError::ComponentDecode {
                    tag: owned_tag.clone(),
                    message: e.to_string(),
                })?;
                world.add_component(entity, value)
            }),
        );
        self
    }

    /// Decode `payload` with the decoder registered under `tag` and attach it
    pub fn apply(&self, world: &mut World, entity: Entity, tag: &str, payload: &str) -> Result<(), EcsError> {
        let apply = self
            .appliers
            .get(tag)
            .ok_or_else(|| EcsError::UnknownComponentTag(tag.to_string()))?;
        apply(world, entity, payload)
    }

    /// Whether a decoder exists for `tag`
    pub fn contains(&self, tag: &str) -> bool {
        self.appliers.contains_key(tag)
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.appliers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
