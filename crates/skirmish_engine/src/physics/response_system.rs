//! Impulse-based collision response
//!
//! Subscribes to [`CollisionEvent`]s and resolves each physical contact as it
//! is published: overlapping bodies are pushed apart along the contact normal
//! and the approaching component of their relative velocity is cancelled.
//! Trigger contacts (hitbox / hurtbox) and `End` events are left alone.

use std::cell::Cell;
use std::rc::Rc;

use crate::config::PhysicsConfig;
use crate::ecs::components::{Mass, Position, Velocity};
use crate::ecs::{Entity, System, SystemError, World};
use crate::events::SubscriptionId;
use crate::foundation::math::Vec2;
use crate::foundation::time::FrameTime;

use super::contact::{CollisionEvent, Contact, ContactPhase};

/// Inverse mass of `entity` for response purposes
///
/// Bodies without a `Velocity` are static (infinite mass). Dynamic bodies
/// without a `Mass` fall back to the configured default.
pub fn inverse_mass(world: &World, entity: Entity, config: &PhysicsConfig) -> f32 {
    if !world.has_component::<Velocity>(entity) {
        return 0.0;
    }
    match world.try_get_component::<Mass>(entity) {
        Some(mass) => mass.inverse(),
        None => Mass(config.default_mass).inverse(),
    }
}

/// Resolve one contact in place
///
/// Returns `true` when the contact took part in response, `false` when it was
/// skipped (trigger layers, two immovable bodies).
pub fn resolve_contact(world: &mut World, contact: &Contact, config: &PhysicsConfig) -> bool {
    if contact.is_trigger() {
        return false;
    }

    let (a, b) = (contact.entity_a, contact.entity_b);
    let inv_a = inverse_mass(world, a, config);
    let inv_b = inverse_mass(world, b, config);
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return false;
    }

    let normal = contact.normal;

    // Positional correction: remove a fraction of the penetration beyond slop
    let slop = if config.penetration_slop.is_finite() { config.penetration_slop.max(0.0) } else { 0.0 };
    let baumgarte = if config.baumgarte.is_finite() { config.baumgarte.clamp(0.0, 1.0) } else { 0.0 };
    let excess = (contact.penetration - slop).max(0.0);
    if excess > 0.0 && baumgarte > 0.0 {
        let correction = excess * baumgarte / inv_sum;
        if let Some(position) = world.try_get_component_mut::<Position>(a) {
            position.value -= normal * (correction * inv_a);
        }
        if let Some(position) = world.try_get_component_mut::<Position>(b) {
            position.value += normal * (correction * inv_b);
        }
    }

    // Velocity impulse: cancel the approaching normal component
    let velocity_a = velocity_of(world, a);
    let velocity_b = velocity_of(world, b);
    let approach = (velocity_b - velocity_a).dot(&normal);
    if approach < 0.0 {
        let impulse = -approach / inv_sum;
        if let Some(velocity) = world.try_get_component_mut::<Velocity>(a) {
            velocity.value -= normal * (impulse * inv_a);
        }
        if let Some(velocity) = world.try_get_component_mut::<Velocity>(b) {
            velocity.value += normal * (impulse * inv_b);
        }
    }

    true
}

fn velocity_of(world: &World, entity: Entity) -> Vec2 {
    world
        .try_get_component::<Velocity>(entity)
        .map(|velocity| velocity.value)
        .unwrap_or_else(Vec2::zeros)
}

/// Collision response system
///
/// Resolution happens inside the event handler registered by
/// [`System::initialize`], so contacts are resolved in publication order.
/// `update` only rolls the per-frame counters.
pub struct CollisionResponseSystem {
    config: PhysicsConfig,
    resolved: Rc<Cell<usize>>,
    resolved_last_frame: usize,
    subscription: Option<SubscriptionId>,
}

impl CollisionResponseSystem {
    /// Create a response system with the given tuning
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            resolved: Rc::new(Cell::new(0)),
            resolved_last_frame: 0,
            subscription: None,
        }
    }

    /// Contacts resolved during the last completed frame
    pub fn resolved_last_frame(&self) -> usize {
        self.resolved_last_frame
    }

    /// Handle of the event subscription, once initialized
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }
}

impl Default for CollisionResponseSystem {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl System for CollisionResponseSystem {
    fn name(&self) -> &'static str {
        "CollisionResponseSystem"
    }

    fn initialize(&mut self, world: &mut World) {
        if self.subscription.is_some() {
            return;
        }

        let config = self.config.clone();
        let resolved = Rc::clone(&self.resolved);
        let id = world.subscribe(move |world: &mut World, event: &CollisionEvent| {
            if event.phase == ContactPhase::End {
                return;
            }
            if resolve_contact(world, &event.contact, &config) {
                resolved.set(resolved.get() + 1);
            }
        });
        self.subscription = Some(id);
    }

    fn update(&mut self, _world: &mut World, _time: &FrameTime) -> Result<(), SystemError> {
        self.resolved_last_frame = self.resolved.replace(0);
        if self.resolved_last_frame > 0 {
            log::trace!("Resolved {} contacts", self.resolved_last_frame);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::{sat_test, CollisionLayer, Polygon};
    use approx::assert_relative_eq;

    fn contact(a: Entity, b: Entity, penetration: f32) -> Contact {
        Contact {
            entity_a: a,
            entity_b: b,
            normal: Vec2::new(1.0, 0.0),
            point: Vec2::zeros(),
            penetration,
            time_of_impact: 0.0,
            layer_a: CollisionLayer::PLAYER,
            layer_b: CollisionLayer::ENEMY,
        }
    }

    fn dynamic(world: &mut World, x: f32, vx: f32) -> Entity {
        let entity = world.create_entity();
        world.add_component(entity, Position::new(x, 0.0)).unwrap();
        world.add_component(entity, Velocity::new(vx, 0.0)).unwrap();
        entity
    }

    #[test]
    fn test_equal_masses_head_on_stop() {
        let mut world = World::new();
        let a = dynamic(&mut world, 0.0, 1.0);
        let b = dynamic(&mut world, 1.0, -1.0);

        assert!(resolve_contact(&mut world, &contact(a, b, 0.0), &PhysicsConfig::default()));

        assert_relative_eq!(world.get_component::<Velocity>(a).unwrap().value.x, 0.0);
        assert_relative_eq!(world.get_component::<Velocity>(b).unwrap().value.x, 0.0);
    }

    #[test]
    fn test_static_body_absorbs_nothing() {
        let mut world = World::new();
        let mover = dynamic(&mut world, 0.0, 5.0);
        let wall = world.create_entity();
        world.add_component(wall, Position::new(1.0, 0.0)).unwrap();

        let config = PhysicsConfig::default();
        assert!(resolve_contact(&mut world, &contact(mover, wall, 1.0), &config));

        assert_relative_eq!(world.get_component::<Velocity>(mover).unwrap().value.x, 0.0);
        // Whole correction goes to the dynamic side
        let expected = -(1.0 - config.penetration_slop) * config.baumgarte;
        assert_relative_eq!(world.get_component::<Position>(mover).unwrap().value.x, expected, epsilon = 1e-6);
        assert_eq!(world.get_component::<Position>(wall).unwrap().value.x, 1.0);
    }

    #[test]
    fn test_heavier_body_moves_less() {
        let mut world = World::new();
        let light = dynamic(&mut world, 0.0, 0.0);
        let heavy = dynamic(&mut world, 1.0, 0.0);
        world.add_component(heavy, Mass(3.0)).unwrap();

        let config = PhysicsConfig {
            penetration_slop: 0.0,
            baumgarte: 1.0,
            ..PhysicsConfig::default()
        };
        resolve_contact(&mut world, &contact(light, heavy, 1.0), &config);

        let light_x = world.get_component::<Position>(light).unwrap().value.x;
        let heavy_x = world.get_component::<Position>(heavy).unwrap().value.x;
        assert_relative_eq!(light_x, -0.75, epsilon = 1e-6);
        assert_relative_eq!(heavy_x, 1.25, epsilon = 1e-6);
    }

    #[test]
    fn test_out_of_range_tuning_never_overshoots() {
        let mut world = World::new();
        let mover = dynamic(&mut world, 0.0, 0.0);
        let wall = world.create_entity();
        world.add_component(wall, Position::new(1.0, 0.0)).unwrap();

        let config = PhysicsConfig {
            baumgarte: 3.0,
            penetration_slop: -1.0,
            ..PhysicsConfig::default()
        };
        resolve_contact(&mut world, &contact(mover, wall, 1.0), &config);

        // Clamped to a full correction of the whole penetration
        assert_relative_eq!(world.get_component::<Position>(mover).unwrap().value.x, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_separating_bodies_keep_velocity() {
        let mut world = World::new();
        let a = dynamic(&mut world, 0.0, -2.0);
        let b = dynamic(&mut world, 1.0, 3.0);

        resolve_contact(&mut world, &contact(a, b, 0.0), &PhysicsConfig::default());

        assert_eq!(world.get_component::<Velocity>(a).unwrap().value.x, -2.0);
        assert_eq!(world.get_component::<Velocity>(b).unwrap().value.x, 3.0);
    }

    #[test]
    fn test_static_pair_and_triggers_are_skipped() {
        let mut world = World::new();
        let a = world.create_entity();
        let b = world.create_entity();
        world.add_component(a, Position::new(0.0, 0.0)).unwrap();
        world.add_component(b, Position::new(0.5, 0.0)).unwrap();
        assert!(!resolve_contact(&mut world, &contact(a, b, 1.0), &PhysicsConfig::default()));

        let c = dynamic(&mut world, 0.0, 1.0);
        let d = dynamic(&mut world, 0.5, -1.0);
        let mut hit = contact(c, d, 1.0);
        hit.layer_a = CollisionLayer::HITBOX;
        hit.layer_b = CollisionLayer::HURTBOX;
        assert!(!resolve_contact(&mut world, &hit, &PhysicsConfig::default()));
        assert_eq!(world.get_component::<Velocity>(c).unwrap().value.x, 1.0);
        assert_eq!(world.get_component::<Position>(d).unwrap().value.x, 0.5);
    }

    #[test]
    fn test_repeated_resolution_converges_within_slop() {
        let mut world = World::new();
        let config = PhysicsConfig::default();
        let square = Polygon::rectangle(10.0, 10.0, CollisionLayer::PLAYER, CollisionLayer::ENEMY).unwrap();
        let foe = Polygon::rectangle(10.0, 10.0, CollisionLayer::ENEMY, CollisionLayer::PLAYER).unwrap();

        let a = dynamic(&mut world, 0.0, 3.0);
        let b = dynamic(&mut world, 6.0, -3.0);

        for _ in 0..30 {
            let pos_a = world.get_component::<Position>(a).unwrap().value;
            let pos_b = world.get_component::<Position>(b).unwrap().value;
            let Some(result) = sat_test(&square, pos_a, &foe, pos_b) else {
                break;
            };
            let contact = Contact {
                entity_a: a,
                entity_b: b,
                normal: result.normal,
                point: result.point,
                penetration: result.depth,
                time_of_impact: 0.0,
                layer_a: square.layer,
                layer_b: foe.layer,
            };
            resolve_contact(&mut world, &contact, &config);
        }

        let pos_a = world.get_component::<Position>(a).unwrap().value;
        let pos_b = world.get_component::<Position>(b).unwrap().value;
        let remaining = sat_test(&square, pos_a, &foe, pos_b).map_or(0.0, |result| result.depth);
        assert!(remaining <= config.penetration_slop + 1e-4, "remaining penetration {remaining}");

        let relative = world.get_component::<Velocity>(b).unwrap().value - world.get_component::<Velocity>(a).unwrap().value;
        assert_relative_eq!(relative.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_handler_ignores_end_events_and_counts_resolutions() {
        let mut world = World::new();
        let a = dynamic(&mut world, 0.0, 1.0);
        let b = dynamic(&mut world, 1.0, -1.0);

        let mut system = CollisionResponseSystem::default();
        system.initialize(&mut world);
        system.initialize(&mut world);
        assert_eq!(world.events().subscriber_count::<CollisionEvent>(), 1);

        world.publish(CollisionEvent {
            phase: ContactPhase::End,
            contact: contact(a, b, 0.0),
        });
        assert_eq!(world.get_component::<Velocity>(a).unwrap().value.x, 1.0);

        world.publish(CollisionEvent {
            phase: ContactPhase::Begin,
            contact: contact(a, b, 0.0),
        });
        assert_relative_eq!(world.get_component::<Velocity>(a).unwrap().value.x, 0.0);

        system.update(&mut world, &FrameTime::from_delta(0.016)).unwrap();
        assert_eq!(system.resolved_last_frame(), 1);
        system.update(&mut world, &FrameTime::from_delta(0.016)).unwrap();
        assert_eq!(system.resolved_last_frame(), 0);
    }
}
