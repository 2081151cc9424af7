//! Typed publish/subscribe event bus
//!
//! Dispatch is synchronous and immediate: [`World::publish`] calls every
//! handler subscribed to the event's concrete type, in registration order,
//! before it returns. Nothing is queued or deferred.
//!
//! Handlers receive the world mutably, so a handler may publish further events
//! (including the type it is handling). A nested publish is fully serviced
//! before the outer dispatch moves to its next handler. Nothing guards against
//! a handler that keeps republishing its own event; that recursion is
//! unbounded.
//!
//! Each dispatch works on a snapshot of the subscriber list. Handlers added or
//! removed while an event is being dispatched take effect from the next
//! publish on.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

use crate::ecs::World;

/// Shared handler for events of type `E`
pub type Handler<E> = Rc<dyn Fn(&mut World, &E)>;

/// Token returned by [`EventBus::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct HandlerList<E> {
    handlers: Vec<(SubscriptionId, Handler<E>)>,
}

/// Type-erased view of one handler list
trait ErasedHandlers {
    fn remove(&mut self, id: SubscriptionId) -> bool;
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: 'static> ErasedHandlers for HandlerList<E> {
    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    fn len(&self) -> usize {
        self.handlers.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Registry of event handlers keyed by concrete event type
pub struct EventBus {
    lists: HashMap<TypeId, Box<dyn ErasedHandlers>>,
    owners: HashMap<SubscriptionId, TypeId>,
    next_id: u64,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            lists: HashMap::new(),
            owners: HashMap::new(),
            next_id: 0,
        }
    }

    /// Register a handler for events of type `E`
    ///
    /// Handlers for the same type run in the order they were subscribed.
    pub fn subscribe<E, F>(&mut self, handler: F) -> SubscriptionId
    where
        E: 'static,
        F: Fn(&mut World, &E) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let list = self
            .lists
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(HandlerList::<E> { handlers: Vec::new() }));

        let handler: Handler<E> = Rc::new(handler);
        if let Some(list) = list.as_any_mut().downcast_mut::<HandlerList<E>>() {
            list.handlers.push((id, handler));
        }
        self.owners.insert(id, TypeId::of::<E>());

        log::trace!("Subscribed {:?} to {}", id, std::any::type_name::<E>());
        id
    }

    /// Remove a handler; returns false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(type_id) = self.owners.remove(&id) else {
            return false;
        };
        self.lists
            .get_mut(&type_id)
            .is_some_and(|list| list.remove(id))
    }

    /// Snapshot of the current handlers for `E`, in registration order
    pub fn handlers<E: 'static>(&self) -> Vec<Handler<E>> {
        self.lists
            .get(&TypeId::of::<E>())
            .and_then(|list| list.as_any().downcast_ref::<HandlerList<E>>())
            .map(|list| list.handlers.iter().map(|(_, handler)| Rc::clone(handler)).collect())
            .unwrap_or_default()
    }

    /// Number of handlers subscribed to `E`
    pub fn subscriber_count<E: 'static>(&self) -> usize {
        self.lists.get(&TypeId::of::<E>()).map_or(0, |list| list.len())
    }

    /// Drop every handler
    pub fn clear(&mut self) {
        self.lists.clear();
        self.owners.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
