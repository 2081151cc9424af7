//! Core collision detection system
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13:
//! "The collision detection system is typically split into two phases:
//! broad-phase and narrow-phase."
//!
//! Per frame the pipeline:
//! 1. collects every entity with a `CollisionBody` and a `Position`
//!    (a missing `Velocity` marks the body static for the frame),
//! 2. builds swept AABBs and buckets them in a freshly built [`SpatialGrid`],
//! 3. keeps only candidate pairs whose boxes intersect and where at least one
//!    side is dynamic (owns a `Velocity`, even a zero one),
//! 4. runs SAT per polygon pair, directly when the relative velocity is zero
//!    and through a bisected time-of-impact search otherwise,
//! 5. diffs the resulting pairs against last frame's active set and emits
//!    `Begin` / `Stay` / `End` events.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::PhysicsConfig;
use crate::ecs::components::{CollisionBody, Position, Velocity};
use crate::ecs::systems::sanitize_velocities;
use crate::ecs::{Entity, System, SystemError, World};
use crate::foundation::math::{is_finite_vec, sanitize, Vec2};
use crate::foundation::time::FrameTime;
use crate::spatial::SpatialGrid;

use super::contact::{CollisionEvent, Contact, ContactKey, ContactPhase};
use super::shapes::{sat_test, Aabb, Polygon, SatResult};

/// Grids never get more cells than this along one axis; the cell size grows
/// instead when bodies are spread far apart
const MAX_CELLS_PER_AXIS: f32 = 1024.0;

/// Counters from the most recent detection pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionStats {
    /// Bodies that took part
    pub bodies: usize,
    /// Pairs that survived the broad phase
    pub candidate_pairs: usize,
    /// Polygon pairs that passed layer filtering and were tested
    pub polygon_tests: usize,
    /// Distinct contacts found
    pub contacts: usize,
}

/// One body as seen by this frame's pass
struct BodySnapshot {
    entity: Entity,
    position: Vec2,
    velocity: Vec2,
    dynamic: bool,
    polygons: Vec<Polygon>,
    bounds: Aabb,
}

impl BodySnapshot {
    fn position_at(&self, t: f32) -> Vec2 {
        self.position + self.velocity * t
    }
}

/// Broad + narrow phase collision detection with contact lifecycle events
pub struct CollisionDetectionSystem {
    config: PhysicsConfig,
    grid: Option<SpatialGrid>,
    active: BTreeMap<ContactKey, Contact>,
    stats: DetectionStats,
}

impl CollisionDetectionSystem {
    /// Create a detection system with the given tuning
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            grid: None,
            active: BTreeMap::new(),
            stats: DetectionStats::default(),
        }
    }

    /// Tuning in use
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Contacts touching as of the last pass, in pair order
    pub fn active_contacts(&self) -> impl Iterator<Item = &Contact> {
        self.active.values()
    }

    /// Whether any polygon pair of `a` and `b` is currently touching
    pub fn is_touching(&self, a: Entity, b: Entity) -> bool {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        self.active
            .keys()
            .any(|key| key.entity_a == a && key.entity_b == b)
    }

    /// Counters from the last pass
    pub fn stats(&self) -> DetectionStats {
        self.stats
    }

    /// Grid built by the last pass, for debug drawing
    pub fn grid(&self) -> Option<&SpatialGrid> {
        self.grid.as_ref()
    }

    /// Forget every active pair without emitting `End` events
    pub fn reset(&mut self) {
        self.active.clear();
        self.grid = None;
        self.stats = DetectionStats::default();
    }

    /// Run one detection pass over `world` for a step of `dt` seconds
    ///
    /// Returns the lifecycle events in pair order: `Begin`/`Stay` for every
    /// pair touching now, then `End` for pairs that stopped.
    pub fn detect(&mut self, world: &World, dt: f32) -> Vec<CollisionEvent> {
        self.stats = DetectionStats::default();

        // Phase 1: collect participating bodies
        let bodies = self.collect_bodies(world, dt);
        self.stats.bodies = bodies.len();

        // Phase 2: broad phase
        let pairs = self.broad_phase(&bodies);
        self.stats.candidate_pairs = pairs.len();

        // Phase 3: narrow phase
        let contacts = self.narrow_phase(&bodies, &pairs, dt);
        self.stats.contacts = contacts.len();

        log::trace!(
            "Collision pass: {} bodies, {} candidates, {} polygon tests, {} contacts",
            self.stats.bodies,
            self.stats.candidate_pairs,
            self.stats.polygon_tests,
            self.stats.contacts
        );

        // Phase 4: lifecycle
        self.advance_lifecycle(contacts)
    }

    fn collect_bodies(&self, world: &World, dt: f32) -> Vec<BodySnapshot> {
        let Some(pool) = world.pool::<CollisionBody>() else {
            return Vec::new();
        };

        let mut bodies = Vec::with_capacity(pool.len());
        for (entity, body) in pool.iter() {
            if !body.enabled {
                continue;
            }
            let Some(position) = world.try_get_component::<Position>(entity) else {
                continue;
            };

            let position = position.value;
            if !is_finite_vec(&position) {
                log::warn!("Skipping {} this frame: non-finite position {:?}", entity, position);
                continue;
            }

            let dynamic = world.has_component::<Velocity>(entity);
            let velocity = match world.try_get_component::<Velocity>(entity) {
                Some(velocity) => {
                    let (clean, clamped) = sanitize(velocity.value);
                    if clamped {
                        log::warn!("Treating non-finite velocity of {} as zero", entity);
                    }
                    clean
                }
                None => Vec2::zeros(),
            };

            let Some(mut bounds) = body
                .polygons
                .iter()
                .map(|polygon| polygon.world_bounds(position))
                .reduce(|acc, next| acc.union(&next))
            else {
                continue;
            };

            if velocity != Vec2::zeros() {
                let end = bounds.translated(velocity * dt);
                bounds = bounds.union(&end).expanded(self.config.aabb_margin);
            }

            bodies.push(BodySnapshot {
                entity,
                position,
                velocity,
                dynamic,
                polygons: body.polygons.clone(),
                bounds,
            });
        }

        bodies.sort_by_key(|body| body.entity);
        bodies
    }

    /// Candidate pairs as `(i, j)` indices into `bodies`, `i < j`
    fn broad_phase(&mut self, bodies: &[BodySnapshot]) -> Vec<(usize, usize)> {
        let Some(region) = bodies
            .iter()
            .map(|body| body.bounds)
            .reduce(|acc, next| acc.union(&next))
        else {
            self.grid = None;
            return Vec::new();
        };

        let extents = region.extents();
        let cell_size = self
            .config
            .cell_size
            .max(extents.x.max(extents.y) / MAX_CELLS_PER_AXIS);

        let mut grid = match SpatialGrid::new(region, cell_size) {
            Ok(grid) => grid,
            Err(err) => {
                log::error!("Broad phase skipped this frame: {}", err);
                self.grid = None;
                return Vec::new();
            }
        };

        grid.clear();
        for body in bodies {
            grid.insert_entity(body.entity, &body.bounds);
        }

        let index: HashMap<Entity, usize> = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| (body.entity, i))
            .collect();

        let mut pairs = BTreeSet::new();
        for (i, body) in bodies.iter().enumerate() {
            // Pure static pairs are never tested, so only dynamic bodies query
            if !body.dynamic {
                continue;
            }
            for other in grid.get_potential_collisions(body.entity, &body.bounds) {
                let Some(&j) = index.get(&other) else {
                    continue;
                };
                let pair = if i < j { (i, j) } else { (j, i) };
                if bodies[pair.0].bounds.intersects(&bodies[pair.1].bounds) {
                    pairs.insert(pair);
                }
            }
        }

        self.grid = Some(grid);
        pairs.into_iter().collect()
    }

    fn narrow_phase(
        &mut self,
        bodies: &[BodySnapshot],
        pairs: &[(usize, usize)],
        dt: f32,
    ) -> BTreeMap<ContactKey, Contact> {
        let mut contacts: BTreeMap<ContactKey, Contact> = BTreeMap::new();

        for &(i, j) in pairs {
            let a = &bodies[i];
            let b = &bodies[j];

            for polygon_a in &a.polygons {
                for polygon_b in &b.polygons {
                    if !polygon_a.interacts_with(polygon_b) {
                        continue;
                    }
                    self.stats.polygon_tests += 1;

                    let hit = if a.velocity == b.velocity {
                        sat_test(polygon_a, a.position, polygon_b, b.position).map(|result| (0.0, result))
                    } else {
                        self.time_of_impact(polygon_a, a, polygon_b, b, dt)
                    };
                    let Some((time_of_impact, result)) = hit else {
                        continue;
                    };

                    if !(is_finite_vec(&result.normal) && result.depth.is_finite()) {
                        log::warn!(
                            "Dropping non-finite contact between {} and {}",
                            a.entity,
                            b.entity
                        );
                        continue;
                    }

                    let contact = Contact {
                        entity_a: a.entity,
                        entity_b: b.entity,
                        normal: result.normal,
                        point: result.point,
                        penetration: result.depth,
                        time_of_impact,
                        layer_a: polygon_a.layer,
                        layer_b: polygon_b.layer,
                    };

                    contacts
                        .entry(contact.key())
                        .and_modify(|existing| {
                            if is_better_contact(&contact, existing) {
                                *existing = contact;
                            }
                        })
                        .or_insert(contact);
                }
            }
        }

        contacts
    }

    /// Earliest overlap of two moving polygons within `[0, dt]`
    ///
    /// The step is sampled finely enough that thin geometry cannot be skipped,
    /// then the first overlapping sample is bisected against the last clear
    /// one. The reported time is the last overlapping midpoint, as a fraction
    /// of `dt`.
    fn time_of_impact(
        &self,
        polygon_a: &Polygon,
        a: &BodySnapshot,
        polygon_b: &Polygon,
        b: &BodySnapshot,
        dt: f32,
    ) -> Option<(f32, SatResult)> {
        let overlap_at = |t: f32| sat_test(polygon_a, a.position_at(t), polygon_b, b.position_at(t));

        if let Some(result) = overlap_at(0.0) {
            return Some((0.0, result));
        }
        if dt <= 0.0 || !dt.is_finite() {
            return None;
        }

        // Bracket the first overlap: steps no longer than half the thinnest feature
        let travel = (b.velocity - a.velocity).norm() * dt;
        let feature = polygon_a.min_extent().min(polygon_b.min_extent()).max(f32::EPSILON);
        let steps = ((travel / (feature * 0.5)).ceil() as u32).clamp(1, self.config.max_substeps.max(1));

        let mut lo = 0.0_f32;
        let mut bracket = None;
        for k in 1..=steps {
            let t = dt * k as f32 / steps as f32;
            if let Some(result) = overlap_at(t) {
                bracket = Some((t, result));
                break;
            }
            lo = t;
        }
        let (mut hi, mut best) = bracket?;

        // Bisect toward the earliest overlapping time
        for _ in 0..self.config.toi_max_iterations {
            if hi - lo <= self.config.toi_tolerance {
                break;
            }
            let mid = 0.5 * (lo + hi);
            match overlap_at(mid) {
                Some(result) => {
                    hi = mid;
                    best = result;
                }
                None => lo = mid,
            }
        }

        Some(((hi / dt).clamp(0.0, 1.0), best))
    }

    fn advance_lifecycle(&mut self, current: BTreeMap<ContactKey, Contact>) -> Vec<CollisionEvent> {
        let mut events = Vec::with_capacity(current.len());

        for (key, contact) in &current {
            let phase = if self.active.contains_key(key) {
                ContactPhase::Stay
            } else {
                ContactPhase::Begin
            };
            events.push(CollisionEvent { phase, contact: *contact });
        }

        for (key, last) in &self.active {
            if !current.contains_key(key) {
                events.push(CollisionEvent {
                    phase: ContactPhase::End,
                    contact: *last,
                });
            }
        }

        self.active = current;
        events
    }
}

impl Default for CollisionDetectionSystem {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl System for CollisionDetectionSystem {
    fn name(&self) -> &'static str {
        "CollisionDetectionSystem"
    }

    fn update(&mut self, world: &mut World, time: &FrameTime) -> Result<(), SystemError> {
        sanitize_velocities(world);

        let events = self.detect(world, time.delta);
        for event in events {
            world.publish(event);
        }
        Ok(())
    }
}

/// Among polygon pairs with the same key, prefer the earliest impact, then the
/// deepest overlap
fn is_better_contact(candidate: &Contact, existing: &Contact) -> bool {
    if candidate.time_of_impact != existing.time_of_impact {
        return candidate.time_of_impact < existing.time_of_impact;
    }
    candidate.penetration > existing.penetration
}
