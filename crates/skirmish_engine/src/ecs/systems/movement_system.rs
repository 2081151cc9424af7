//! Movement system integrating velocities into positions

use crate::ecs::components::{Position, Velocity};
use crate::ecs::{Entity, System, SystemError, World};
use crate::foundation::math::{sanitize, Vec2};
use crate::foundation::time::FrameTime;

/// Reset non-finite velocity components to zero, warning once per entity
///
/// Returns how many velocities were clamped.
pub fn sanitize_velocities(world: &mut World) -> usize {
    if world.pool::<Velocity>().is_none() {
        return 0;
    }

    let mut clamped_count = 0;
    for (entity, velocity) in world.pool_mut::<Velocity>().iter_mut() {
        let (clean, clamped) = sanitize(velocity.value);
        if clamped {
            log::warn!("Clamped non-finite velocity of {} to {:?}", entity, clean);
            velocity.value = clean;
            clamped_count += 1;
        }
    }
    clamped_count
}

/// Explicit Euler integration: `position += velocity * dt`
pub struct MovementSystem {
    moved_last_frame: usize,
}

impl MovementSystem {
    /// Create a new movement system
    pub fn new() -> Self {
        Self { moved_last_frame: 0 }
    }

    /// Entities whose position was integrated last update
    pub fn moved_last_frame(&self) -> usize {
        self.moved_last_frame
    }
}

impl Default for MovementSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "MovementSystem"
    }

    fn update(&mut self, world: &mut World, time: &FrameTime) -> Result<(), SystemError> {
        self.moved_last_frame = 0;
        sanitize_velocities(world);

        let Some(velocities) = world.pool::<Velocity>() else {
            return Ok(());
        };
        // Velocities are copied out so the position pool can be borrowed mutably
        let steps: Vec<(Entity, Vec2)> = velocities
            .iter()
            .filter(|(_, velocity)| !velocity.is_zero())
            .map(|(entity, velocity)| (entity, velocity.value * time.delta))
            .collect();

        for (entity, step) in steps {
            if let Some(position) = world.try_get_component_mut::<Position>(entity) {
                position.translate(step);
                self.moved_last_frame += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_integrates_position() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.add_component(entity, Position::new(1.0, 2.0)).unwrap();
        world.add_component(entity, Velocity::new(10.0, -5.0)).unwrap();

        let still = world.create_entity();
        world.add_component(still, Position::new(0.0, 0.0)).unwrap();
        world.add_component(still, Velocity::default()).unwrap();

        let mut system = MovementSystem::new();
        system.update(&mut world, &FrameTime::from_delta(0.5)).unwrap();

        let position = world.get_component::<Position>(entity).unwrap().value;
        assert_relative_eq!(position.x, 6.0);
        assert_relative_eq!(position.y, -0.5);
        assert_eq!(system.moved_last_frame(), 1);
    }

    #[test]
    fn test_velocity_without_position_is_ignored() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.add_component(entity, Velocity::new(1.0, 1.0)).unwrap();

        let mut system = MovementSystem::new();
        system.update(&mut world, &FrameTime::from_delta(1.0)).unwrap();
        assert_eq!(system.moved_last_frame(), 0);
    }

    #[test]
    fn test_nan_velocity_clamped_before_integration() {
        let mut world = World::new();
        let entity = world.create_entity();
        world.add_component(entity, Position::new(0.0, 0.0)).unwrap();
        world.add_component(entity, Velocity::new(f32::NAN, 2.0)).unwrap();

        assert_eq!(sanitize_velocities(&mut world), 1);
        assert_eq!(sanitize_velocities(&mut world), 0);

        world.get_component_mut::<Velocity>(entity).unwrap().value.x = f32::INFINITY;
        let mut system = MovementSystem::new();
        system.update(&mut world, &FrameTime::from_delta(1.0)).unwrap();

        assert_eq!(world.get_component::<Position>(entity).unwrap().value, Vec2::new(0.0, 2.0));
    }
}
