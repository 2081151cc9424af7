//! ECS World implementation
//!
//! The world owns every piece of per-game runtime state: the live entity set,
//! one [`ComponentPool`] per component type, the [`SystemManager`], the
//! [`EventBus`] and the [`EntityRegistry`].

use std::any::TypeId;
use std::collections::{BTreeSet, HashMap};

use super::registry::EntityRegistry;
use super::scheduler::SystemManager;
use super::storage::{ComponentPool, ErasedPool};
use super::system::{System, SystemPhase};
use super::{Component, EcsError, Entity};
use crate::events::{EventBus, SubscriptionId};
use crate::foundation::time::FrameTime;

/// Coarse run state read by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    /// Every system runs
    #[default]
    Running,
    /// Pausable systems are skipped
    Paused,
}

/// ECS World containing all entities and components
pub struct World {
    next_entity_id: u64,
    entities: BTreeSet<Entity>,
    pools: HashMap<TypeId, Box<dyn ErasedPool>>,
    systems: SystemManager,
    events: EventBus,
    registry: EntityRegistry,
    game_state: GameState,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self {
            next_entity_id: 0,
            entities: BTreeSet::new(),
            pools: HashMap::new(),
            systems: SystemManager::new(),
            events: EventBus::new(),
            registry: EntityRegistry::new(),
            game_state: GameState::Running,
        }
    }

    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Create a new entity
    pub fn create_entity(&mut self) -> Entity {
        let entity = Entity::new(self.next_entity_id);
        self.next_entity_id += 1;
        self.entities.insert(entity);
        log::trace!("Created {}", entity);
        entity
    }

    /// Destroy an entity and every component attached to it
    ///
    /// Returns false when the entity was not alive.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.remove(&entity) {
            return false;
        }

        // Snapshot the pools holding data for this entity before mutating any
        let holding: Vec<TypeId> = self
            .pools
            .iter()
            .filter(|(_, pool)| pool.has(entity))
            .map(|(type_id, _)| *type_id)
            .collect();

        for type_id in holding {
            if let Some(pool) = self.pools.get_mut(&type_id) {
                pool.remove(entity);
            }
        }

        self.registry.unregister_entity(entity);
        log::trace!("Destroyed {}", entity);
        true
    }

    /// Destroy every entity matching `predicate`
    ///
    /// The predicate runs over a snapshot of the live set, so it may inspect
    /// the world freely. Returns the number of destroyed entities.
    pub fn destroy_where(&mut self, mut predicate: impl FnMut(&World, Entity) -> bool) -> usize {
        let doomed: Vec<Entity> = self
            .entities()
            .into_iter()
            .filter(|&entity| predicate(self, entity))
            .collect();

        doomed
            .into_iter()
            .filter(|&entity| self.destroy_entity(entity))
            .count()
    }

    /// Whether `entity` is alive
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Snapshot of the live entities in id order
    pub fn entities(&self) -> Vec<Entity> {
        self.entities.iter().copied().collect()
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Typed pool for `T`, if any component of that type was ever added
    pub fn pool<T: Component>(&self) -> Option<&ComponentPool<T>> {
        self.pools
            .get(&TypeId::of::<T>())
            .and_then(|pool| pool.as_any().downcast_ref::<ComponentPool<T>>())
    }

    /// Typed pool for `T`, created on first use
    pub fn pool_mut<T: Component>(&mut self) -> &mut ComponentPool<T> {
        self.pools
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentPool::<T>::new()))
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()
            .expect("component pool stored under a mismatched TypeId")
    }

    /// Add a component to an entity, replacing any existing one of that type
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<(), EcsError> {
        if !self.is_alive(entity) {
            return Err(EcsError::UnknownEntity(entity));
        }
        self.pool_mut::<T>().set(entity, component);
        Ok(())
    }

    /// Get a component from an entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<&T, EcsError> {
        self.try_get_component(entity).ok_or(EcsError::MissingComponent {
            entity,
            component: std::any::type_name::<T>(),
        })
    }

    /// Get a mutable component from an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.try_get_component_mut(entity).ok_or(EcsError::MissingComponent {
            entity,
            component: std::any::type_name::<T>(),
        })
    }

    /// Get a component from an entity if it has one
    pub fn try_get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.pool::<T>()?.try_get(entity)
    }

    /// Get a mutable component from an entity if it has one
    pub fn try_get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.pools
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()?
            .try_get_mut(entity)
    }

    /// Whether `entity` holds a `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.pool::<T>().is_some_and(|pool| pool.has(entity))
    }

    /// Remove a component from an entity; no-op when absent
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.pools
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<ComponentPool<T>>()?
            .remove(entity)
    }

    /// Entities holding a `T`, in slot order
    pub fn query_entities<T: Component>(&self) -> Vec<Entity> {
        self.pool::<T>().map(ComponentPool::entities).unwrap_or_default()
    }

    /// Snapshot of `(entity, component)` pairs for `T`
    pub fn query<T: Component + Clone>(&self) -> Vec<(Entity, T)> {
        self.pool::<T>()
            .map(|pool| pool.iter().map(|(entity, value)| (entity, value.clone())).collect())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Systems
    // ------------------------------------------------------------------

    /// Initialize a system and register it in `phase` with `priority`
    pub fn add_system(&mut self, mut system: Box<dyn System>, phase: SystemPhase, priority: i32) {
        system.initialize(self);
        self.systems.insert(system, phase, priority);
    }

    /// Run every system registered in `phase`
    ///
    /// Systems added while the phase runs are kept and join from the next
    /// phase update on.
    pub fn update_phase(&mut self, phase: SystemPhase, time: &FrameTime) {
        let mut systems = std::mem::take(&mut self.systems);
        systems.update_phase(self, phase, time);

        let added = std::mem::replace(&mut self.systems, systems);
        self.systems.absorb(added);
    }

    /// Run one full frame: every phase, in declared order
    pub fn run_frame(&mut self, time: &FrameTime) {
        for phase in SystemPhase::ALL {
            self.update_phase(phase, time);
        }
    }

    /// Scheduler access (profiling, introspection)
    pub fn systems_mut(&mut self) -> &mut SystemManager {
        &mut self.systems
    }

    /// Current run state
    pub fn game_state(&self) -> GameState {
        self.game_state
    }

    /// Change the run state
    pub fn set_game_state(&mut self, state: GameState) {
        if self.game_state != state {
            log::debug!("Game state {:?} -> {:?}", self.game_state, state);
            self.game_state = state;
        }
    }

    /// Whether pausable systems are currently skipped
    pub fn is_paused(&self) -> bool {
        self.game_state == GameState::Paused
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Subscribe a handler to events of type `E`
    pub fn subscribe<E, F>(&mut self, handler: F) -> SubscriptionId
    where
        E: 'static,
        F: Fn(&mut World, &E) + 'static,
    {
        self.events.subscribe(handler)
    }

    /// Deliver `event` to every current subscriber before returning
    pub fn publish<E: 'static>(&mut self, event: E) {
        for handler in self.events.handlers::<E>() {
            handler(self, &event);
        }
    }

    /// Event bus access
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Mutable event bus access
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    // ------------------------------------------------------------------
    // Registry & teardown
    // ------------------------------------------------------------------

    /// Named entity lookup
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Mutable named entity lookup
    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// Tear down all runtime state
    ///
    /// Entities, components, systems, subscriptions and names are dropped.
    /// The id counter keeps running so handles from before the clear are
    /// never handed out again.
    pub fn clear(&mut self) {
        self.entities.clear();
        for pool in self.pools.values_mut() {
            pool.clear();
        }
        self.systems.clear();
        self.events.clear();
        self.registry.clear();
        self.game_state = GameState::Running;
        log::debug!("World cleared");
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
