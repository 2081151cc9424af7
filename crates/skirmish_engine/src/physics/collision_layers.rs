//! Collision layer system for filtering collision detection
//!
//! Every polygon is tagged with the layer it lives on and a mask of the layers
//! it wants to touch. The same tags let downstream systems tell physical
//! contacts (world geometry, bodies) from gameplay triggers (hitboxes,
//! hurtboxes).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Collision layer bitmask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CollisionLayer: u32 {
        /// Static level geometry (floors, walls)
        const WORLD = 1 << 0;
        /// One-way or moving platforms
        const PLATFORM = 1 << 1;
        /// Player character body
        const PLAYER = 1 << 2;
        /// Enemy character body
        const ENEMY = 1 << 3;
        /// Projectiles (bullets, thrown objects)
        const PROJECTILE = 1 << 4;
        /// Pickups and collectibles
        const PICKUP = 1 << 5;
        /// Attack volume that deals damage
        const HITBOX = 1 << 6;
        /// Volume that can receive damage
        const HURTBOX = 1 << 7;

        /// Layers that only produce informational contacts
        const TRIGGERS = Self::HITBOX.bits() | Self::HURTBOX.bits();
        /// Layers that take part in physical response
        const SOLIDS = Self::WORLD.bits()
            | Self::PLATFORM.bits()
            | Self::PLAYER.bits()
            | Self::ENEMY.bits()
            | Self::PROJECTILE.bits();
    }
}

impl CollisionLayer {
    /// Whether this tag is a gameplay trigger rather than a physical surface
    pub fn is_trigger(self) -> bool {
        self.intersects(Self::TRIGGERS)
    }

    /// Whether two tagged polygons should be tested against each other
    ///
    /// A pair interacts when either side's layer is in the other side's mask.
    pub fn interacts(layer_a: Self, mask_a: Self, layer_b: Self, mask_b: Self) -> bool {
        layer_a.intersects(mask_b) || layer_b.intersects(mask_a)
    }
}

impl Default for CollisionLayer {
    fn default() -> Self {
        Self::WORLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interacts_in_either_direction() {
        // Hitbox looks for hurtboxes; hurtbox mask is empty
        assert!(CollisionLayer::interacts(
            CollisionLayer::HITBOX,
            CollisionLayer::HURTBOX,
            CollisionLayer::HURTBOX,
            CollisionLayer::empty(),
        ));

        assert!(CollisionLayer::interacts(
            CollisionLayer::HURTBOX,
            CollisionLayer::empty(),
            CollisionLayer::HITBOX,
            CollisionLayer::HURTBOX,
        ));
    }

    #[test]
    fn test_disjoint_masks_do_not_interact() {
        assert!(!CollisionLayer::interacts(
            CollisionLayer::PLAYER,
            CollisionLayer::WORLD,
            CollisionLayer::PICKUP,
            CollisionLayer::ENEMY,
        ));
    }

    #[test]
    fn test_trigger_classification() {
        assert!(CollisionLayer::HITBOX.is_trigger());
        assert!(CollisionLayer::HURTBOX.is_trigger());
        assert!(!CollisionLayer::WORLD.is_trigger());
        assert!(!(CollisionLayer::PLAYER | CollisionLayer::ENEMY).is_trigger());
    }

    #[test]
    fn test_ron_uses_flag_names() {
        let layer: CollisionLayer = ron::from_str("\"HITBOX | HURTBOX\"").unwrap();
        assert_eq!(layer, CollisionLayer::TRIGGERS);

        let text = ron::to_string(&CollisionLayer::PLAYER).unwrap();
        assert_eq!(text, "\"PLAYER\"");
        assert_eq!(ron::from_str::<CollisionLayer>(&text).unwrap(), CollisionLayer::PLAYER);
    }
}
