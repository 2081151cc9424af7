//! Full-frame tests of detection, response and movement running together

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;

use crate::config::PhysicsConfig;
use crate::ecs::components::{CollisionBody, Position, Velocity};
use crate::ecs::{Entity, GameState, World};
use crate::foundation::math::Vec2;
use crate::foundation::time::FrameTime;
use crate::physics::{register_default_systems, CollisionEvent, CollisionLayer, ContactPhase, Polygon};

const DT: f32 = 0.016;

fn spawn(world: &mut World, polygon: Polygon, x: f32, velocity: Option<Vec2>) -> Entity {
    let entity = world.create_entity();
    world.add_component(entity, Position::new(x, 0.0)).unwrap();
    world.add_component(entity, CollisionBody::single(polygon)).unwrap();
    if let Some(velocity) = velocity {
        world.add_component(entity, Velocity::from_vec(velocity)).unwrap();
    }
    entity
}

fn solid(width: f32, height: f32) -> Polygon {
    Polygon::rectangle(width, height, CollisionLayer::PLAYER, CollisionLayer::SOLIDS).unwrap()
}

fn record_phases(world: &mut World) -> Rc<RefCell<Vec<ContactPhase>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    world.subscribe(move |_: &mut World, event: &CollisionEvent| sink.borrow_mut().push(event.phase));
    log
}

fn position_x(world: &World, entity: Entity) -> f32 {
    world.get_component::<Position>(entity).unwrap().value.x
}

#[test]
fn test_head_on_bodies_stop_at_contact() {
    let mut world = World::new();
    register_default_systems(&mut world, &PhysicsConfig::default()).unwrap();
    let phases = record_phases(&mut world);

    let a = spawn(&mut world, solid(10.0, 10.0), 0.0, Some(Vec2::new(100.0, 0.0)));
    let b = spawn(&mut world, solid(10.0, 10.0), 11.0, Some(Vec2::new(-100.0, 0.0)));

    let time = FrameTime::from_delta(DT);
    world.run_frame(&time);

    assert_relative_eq!(world.get_component::<Velocity>(a).unwrap().value.x, 0.0, epsilon = 1e-4);
    assert_relative_eq!(world.get_component::<Velocity>(b).unwrap().value.x, 0.0, epsilon = 1e-4);
    assert!(position_x(&world, b) - position_x(&world, a) >= 10.0 - 1e-3);

    // Both at rest: no longer candidates, so the pair ends
    world.run_frame(&time);
    assert_eq!(*phases.borrow(), vec![ContactPhase::Begin, ContactPhase::End]);
}

#[test]
fn test_fast_projectile_stops_at_thin_wall() {
    let mut world = World::new();
    register_default_systems(&mut world, &PhysicsConfig::default()).unwrap();
    let phases = record_phases(&mut world);

    let bullet = spawn(&mut world, solid(4.0, 4.0), 0.0, Some(Vec2::new(1000.0, 0.0)));
    let wall = spawn(&mut world, solid(1.0, 100.0), 10.0, None);

    world.run_frame(&FrameTime::from_delta(DT));

    assert_eq!(*phases.borrow(), vec![ContactPhase::Begin]);
    assert!(position_x(&world, bullet) + 2.0 <= 9.5 + 1e-3);
    assert_relative_eq!(world.get_component::<Velocity>(bullet).unwrap().value.x, 0.0, epsilon = 1e-3);
    assert_eq!(position_x(&world, wall), 10.0);
}

#[test]
fn test_unobstructed_body_moves_freely() {
    let mut world = World::new();
    register_default_systems(&mut world, &PhysicsConfig::default()).unwrap();
    let phases = record_phases(&mut world);

    let runner = spawn(&mut world, solid(2.0, 2.0), 0.0, Some(Vec2::new(10.0, 0.0)));
    spawn(&mut world, solid(2.0, 2.0), 500.0, None);

    let mut time = FrameTime::from_delta(0.1);
    for _ in 0..10 {
        world.run_frame(&time);
        time = time.advance(0.1);
    }

    assert_relative_eq!(position_x(&world, runner), 10.0, epsilon = 1e-3);
    assert!(phases.borrow().is_empty());
}

#[test]
fn test_paused_world_freezes_physics() {
    let mut world = World::new();
    register_default_systems(&mut world, &PhysicsConfig::default()).unwrap();
    let runner = spawn(&mut world, solid(2.0, 2.0), 0.0, Some(Vec2::new(10.0, 0.0)));

    world.set_game_state(GameState::Paused);
    world.run_frame(&FrameTime::from_delta(0.5));
    assert_eq!(position_x(&world, runner), 0.0);

    world.set_game_state(GameState::Running);
    world.run_frame(&FrameTime::from_delta(0.5));
    assert_relative_eq!(position_x(&world, runner), 5.0);
}

#[test]
fn test_hitbox_contacts_are_reported_but_not_resolved() {
    let mut world = World::new();
    register_default_systems(&mut world, &PhysicsConfig::default()).unwrap();

    let hits = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&hits);
    world.subscribe(move |_: &mut World, event: &CollisionEvent| {
        if event.phase == ContactPhase::Begin && event.contact.is_trigger() {
            sink.borrow_mut().push((event.contact.entity_a, event.contact.entity_b));
        }
    });

    let sword = Polygon::rectangle(4.0, 4.0, CollisionLayer::HITBOX, CollisionLayer::HURTBOX).unwrap();
    let hurtbox = Polygon::rectangle(4.0, 4.0, CollisionLayer::HURTBOX, CollisionLayer::empty()).unwrap();
    let attacker = spawn(&mut world, sword, 0.0, Some(Vec2::new(1.0, 0.0)));
    let target = spawn(&mut world, hurtbox, 2.0, Some(Vec2::new(1.0, 0.0)));

    world.run_frame(&FrameTime::from_delta(DT));

    assert_eq!(*hits.borrow(), vec![(attacker, target)]);
    assert_eq!(world.get_component::<Velocity>(attacker).unwrap().value.x, 1.0);
    assert_eq!(world.get_component::<Velocity>(target).unwrap().value.x, 1.0);
}

#[test]
fn test_handler_destroying_participant_mid_frame() {
    let mut world = World::new();
    register_default_systems(&mut world, &PhysicsConfig::default()).unwrap();
    let phases = record_phases(&mut world);

    let projectile_shape =
        Polygon::rectangle(2.0, 2.0, CollisionLayer::PROJECTILE, CollisionLayer::ENEMY).unwrap();
    let enemy_shape = Polygon::rectangle(4.0, 4.0, CollisionLayer::ENEMY, CollisionLayer::SOLIDS).unwrap();
    let projectile = spawn(&mut world, projectile_shape, 0.0, Some(Vec2::new(300.0, 0.0)));
    spawn(&mut world, enemy_shape, 5.0, None);

    world.subscribe(move |world: &mut World, event: &CollisionEvent| {
        if event.phase == ContactPhase::Begin && event.contact.involves(projectile) {
            world.destroy_entity(projectile);
        }
    });

    let time = FrameTime::from_delta(DT);
    world.run_frame(&time);
    assert!(!world.is_alive(projectile));

    world.run_frame(&time);
    assert_eq!(*phases.borrow(), vec![ContactPhase::Begin, ContactPhase::End]);
}

#[test]
fn test_overlapping_head_on_pair_converges() {
    let config = PhysicsConfig::default();
    let mut world = World::new();
    register_default_systems(&mut world, &config).unwrap();
    let phases = record_phases(&mut world);

    let a = spawn(&mut world, solid(10.0, 10.0), 0.0, Some(Vec2::new(5.0, 0.0)));
    let b = spawn(&mut world, solid(10.0, 10.0), 8.0, Some(Vec2::new(-5.0, 0.0)));

    let time = FrameTime::from_delta(DT);
    for _ in 0..20 {
        world.run_frame(&time);
    }

    let penetration = 10.0 - (position_x(&world, b) - position_x(&world, a));
    assert!(penetration <= config.penetration_slop + 1e-3, "penetration {penetration}");
    assert_relative_eq!(world.get_component::<Velocity>(a).unwrap().value.x, 0.0, epsilon = 1e-5);
    assert_relative_eq!(world.get_component::<Velocity>(b).unwrap().value.x, 0.0, epsilon = 1e-5);

    // Still resting against each other: one Begin, then Stay every frame
    let phases = phases.borrow();
    assert_eq!(phases.len(), 20);
    assert_eq!(phases[0], ContactPhase::Begin);
    assert!(phases[1..].iter().all(|&phase| phase == ContactPhase::Stay));
}

#[test]
fn test_resting_body_is_pushed_out_of_floor() {
    let config = PhysicsConfig::default();
    let mut world = World::new();
    register_default_systems(&mut world, &config).unwrap();
    let phases = record_phases(&mut world);

    spawn(&mut world, solid(100.0, 10.0), 0.0, None);
    let resting = spawn(&mut world, solid(10.0, 10.0), 0.0, Some(Vec2::zeros()));
    world.get_component_mut::<Position>(resting).unwrap().value.y = 9.0;

    let time = FrameTime::from_delta(DT);
    for _ in 0..10 {
        world.run_frame(&time);
    }

    let y = world.get_component::<Position>(resting).unwrap().value.y;
    assert!(y > 10.0 - config.penetration_slop - 1e-3 && y <= 10.0, "y {y}");
    assert_eq!(phases.borrow()[0], ContactPhase::Begin);
    assert!(phases.borrow()[1..].iter().all(|&phase| phase == ContactPhase::Stay));
}
