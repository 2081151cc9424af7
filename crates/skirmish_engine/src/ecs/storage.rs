//! Dense component storage
//!
//! Each component type lives in its own [`ComponentPool`]: a dense slot array,
//! an entity → slot map and a free-list of vacated slots. A slot stays put for
//! as long as its entity keeps the component, and a removed slot is handed to
//! the next entity that receives a component of the same type.
//!
//! The world keeps its pools behind the small [`ErasedPool`] interface so that
//! entity destruction can sweep every pool without knowing the concrete types.

use std::any::Any;
use std::collections::HashMap;

use super::{Component, EcsError, Entity};

const MIN_GROWTH: usize = 8;

/// Dense, type-specific storage for one component type
pub struct ComponentPool<T: Component> {
    slots: Vec<Option<T>>,
    owners: Vec<Option<Entity>>,
    index: HashMap<Entity, usize>,
    free: Vec<usize>,
}

impl<T: Component> ComponentPool<T> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a pool with room for `capacity` components before growing
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            owners: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Attach `value` to `entity`, overwriting any previous value in place
    ///
    /// A new entity takes a slot from the free-list when one is available and
    /// otherwise appends to the dense array. Returns the slot index used.
    pub fn set(&mut self, entity: Entity, value: T) -> usize {
        if let Some(&slot) = self.index.get(&entity) {
            self.slots[slot] = Some(value);
            return slot;
        }

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(value);
                self.owners[slot] = Some(entity);
                slot
            }
            None => {
                self.ensure_capacity(self.slots.len() + 1);
                self.slots.push(Some(value));
                self.owners.push(Some(entity));
                self.slots.len() - 1
            }
        };

        self.index.insert(entity, slot);
        slot
    }

    /// Borrow the component of `entity`
    ///
    /// Fails with [`EcsError::MissingComponent`] instead of inventing a default.
    pub fn get(&self, entity: Entity) -> Result<&T, EcsError> {
        self.try_get(entity).ok_or_else(|| Self::missing(entity))
    }

    /// Mutably borrow the component of `entity`
    pub fn get_mut(&mut self, entity: Entity) -> Result<&mut T, EcsError> {
        self.try_get_mut(entity).ok_or_else(|| Self::missing(entity))
    }

    /// Borrow the component of `entity` if it has one
    pub fn try_get(&self, entity: Entity) -> Option<&T> {
        let slot = *self.index.get(&entity)?;
        self.slots[slot].as_ref()
    }

    /// Mutably borrow the component of `entity` if it has one
    pub fn try_get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let slot = *self.index.get(&entity)?;
        self.slots[slot].as_mut()
    }

    /// Whether `entity` holds a component in this pool
    pub fn has(&self, entity: Entity) -> bool {
        self.index.contains_key(&entity)
    }

    /// Detach and return the component of `entity`; no-op when absent
    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        let slot = self.index.remove(&entity)?;
        self.owners[slot] = None;
        self.free.push(slot);
        self.slots[slot].take()
    }

    /// Slot currently assigned to `entity`
    pub fn slot_of(&self, entity: Entity) -> Option<usize> {
        self.index.get(&entity).copied()
    }

    /// Number of live components
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when no entity holds this component
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Slots that can be filled before the dense array reallocates
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Entities holding this component, in slot order
    pub fn entities(&self) -> Vec<Entity> {
        self.owners.iter().flatten().copied().collect()
    }

    /// Iterate `(entity, component)` pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.owners
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(owner, slot)| Some((*owner.as_ref()?, slot.as_ref()?)))
    }

    /// Iterate `(entity, component)` pairs mutably in slot order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.owners
            .iter()
            .zip(self.slots.iter_mut())
            .filter_map(|(owner, slot)| Some((*owner.as_ref()?, slot.as_mut()?)))
    }

    /// Drop every component and forget all slots
    pub fn clear(&mut self) {
        self.slots.clear();
        self.owners.clear();
        self.index.clear();
        self.free.clear();
    }

    /// Grow the dense arrays so at least `required` slots fit
    ///
    /// Growth at least doubles the capacity; existing values move with the
    /// storage and keep their slot numbers.
    fn ensure_capacity(&mut self, required: usize) {
        let capacity = self.slots.capacity();
        if required <= capacity {
            return;
        }

        let target = required.max(capacity * 2).max(MIN_GROWTH);
        self.slots.reserve_exact(target - self.slots.len());
        self.owners.reserve_exact(target - self.owners.len());
    }

    fn missing(entity: Entity) -> EcsError {
        EcsError::MissingComponent {
            entity,
            component: std::any::type_name::<T>(),
        }
    }
}

impl<T: Component> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a pool used for whole-entity operations
pub trait ErasedPool {
    /// Whether `entity` holds a component in this pool
    fn has(&self, entity: Entity) -> bool;

    /// Drop the component of `entity`; no-op when absent
    fn remove(&mut self, entity: Entity);

    /// Number of live components
    fn len(&self) -> usize;

    /// True when the pool is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every component
    fn clear(&mut self);

    /// Type name of the stored component, for diagnostics
    fn component_name(&self) -> &'static str;

    /// Downcast to Any for typed access
    fn as_any(&self) -> &dyn Any;

    /// Downcast to Any for mutable typed access
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedPool for ComponentPool<T> {
    fn has(&self, entity: Entity) -> bool {
        ComponentPool::has(self, entity)
    }

    fn remove(&mut self, entity: Entity) {
        ComponentPool::remove(self, entity);
    }

    fn len(&self) -> usize {
        ComponentPool::len(self)
    }

    fn clear(&mut self) {
        ComponentPool::clear(self);
    }

    fn component_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
