//! Collision geometry: axis-aligned boxes, convex polygons and the
//! separating-axis test
//!
//! Polygons are stored in local space around their owner's position. All
//! queries take the owner's world position explicitly so the same polygon can
//! be tested at interpolated positions during continuous detection.

use serde::{Deserialize, Serialize};

use super::{CollisionLayer, PhysicsError};
use crate::foundation::math::{is_finite_vec, perpendicular, Vec2};

const AREA_EPSILON: f32 = 1.0e-6;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl Aabb {
    /// Create a box from its corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create a box centered on `center` with half extents
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest box containing every point; `None` for an empty slice
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut aabb = Self::new(*first, *first);
        for point in rest {
            aabb.min = aabb.min.inf(point);
            aabb.max = aabb.max.sup(point);
        }
        Some(aabb)
    }

    /// Smallest box containing both boxes
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Box grown by `margin` on every side
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Aabb {
        let pad = Vec2::new(margin, margin);
        Aabb {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Box moved by `offset`
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Whether the boxes overlap or touch
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Whether `point` lies inside or on the boundary
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Width and height
    pub fn extents(&self) -> Vec2 {
        self.max - self.min
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Whether both corners are finite
    pub fn is_finite(&self) -> bool {
        is_finite_vec(&self.min) && is_finite_vec(&self.max)
    }
}

/// Convex polygon tagged with a collision layer and mask
///
/// Vertices are kept in counter-clockwise order; edge normals are cached and
/// point outward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PolygonDef", into = "PolygonDef")]
pub struct Polygon {
    vertices: Vec<Vec2>,
    normals: Vec<Vec2>,
    center: Vec2,
    bounds: Aabb,
    /// Layer this polygon lives on
    pub layer: CollisionLayer,
    /// Layers this polygon wants to touch
    pub collides_with: CollisionLayer,
}

impl Polygon {
    /// Build a polygon from local-space vertices
    ///
    /// Fails on fewer than three vertices, non-finite coordinates, zero area
    /// or a concave outline. Clockwise input is accepted and re-wound.
    pub fn new(
        vertices: Vec<Vec2>,
        layer: CollisionLayer,
        collides_with: CollisionLayer,
    ) -> Result<Self, PhysicsError> {
        if vertices.len() < 3 {
            return Err(PhysicsError::DegeneratePolygon {
                reason: format!("needs at least 3 vertices, got {}", vertices.len()),
            });
        }
        if !vertices.iter().all(is_finite_vec) {
            return Err(PhysicsError::DegeneratePolygon {
                reason: "vertex coordinates must be finite".to_string(),
            });
        }

        let mut vertices = vertices;
        let area = signed_area(&vertices);
        if area.abs() <= AREA_EPSILON {
            return Err(PhysicsError::DegeneratePolygon {
                reason: "polygon has zero area".to_string(),
            });
        }
        if area < 0.0 {
            vertices.reverse();
        }
        if !is_convex_ccw(&vertices) {
            return Err(PhysicsError::DegeneratePolygon {
                reason: "polygon must be convex".to_string(),
            });
        }

        let count = vertices.len();
        let mut normals = Vec::with_capacity(count);
        for i in 0..count {
            let edge = vertices[(i + 1) % count] - vertices[i];
            if edge.norm_squared() <= f32::EPSILON {
                // Repeated vertex; the edge contributes no axis
                continue;
            }
            // Counter-clockwise winding puts the outside on the right of each edge
            normals.push(-perpendicular(edge).normalize());
        }

        let center = vertices.iter().fold(Vec2::zeros(), |acc, v| acc + v) / count as f32;
        let bounds = Aabb::from_points(&vertices).ok_or_else(|| PhysicsError::DegeneratePolygon {
            reason: "polygon has no vertices".to_string(),
        })?;

        Ok(Self {
            vertices,
            normals,
            center,
            bounds,
            layer,
            collides_with,
        })
    }

    /// Axis-aligned rectangle centered on the owner's position
    pub fn rectangle(
        width: f32,
        height: f32,
        layer: CollisionLayer,
        collides_with: CollisionLayer,
    ) -> Result<Self, PhysicsError> {
        Self::rectangle_at(Vec2::zeros(), width, height, layer, collides_with)
    }

    /// Axis-aligned rectangle centered on `offset` in local space
    pub fn rectangle_at(
        offset: Vec2,
        width: f32,
        height: f32,
        layer: CollisionLayer,
        collides_with: CollisionLayer,
    ) -> Result<Self, PhysicsError> {
        let hx = width * 0.5;
        let hy = height * 0.5;
        Self::new(
            vec![
                offset + Vec2::new(-hx, -hy),
                offset + Vec2::new(hx, -hy),
                offset + Vec2::new(hx, hy),
                offset + Vec2::new(-hx, hy),
            ],
            layer,
            collides_with,
        )
    }

    /// Local-space vertices, counter-clockwise
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Outward unit edge normals
    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    /// Local-space vertex average
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Local-space bounding box
    pub fn local_bounds(&self) -> Aabb {
        self.bounds
    }

    /// World-space bounding box for an owner at `position`
    pub fn world_bounds(&self, position: Vec2) -> Aabb {
        self.bounds.translated(position)
    }

    /// Smallest side of the bounding box
    pub fn min_extent(&self) -> f32 {
        let extents = self.bounds.extents();
        extents.x.min(extents.y)
    }

    /// Whether this polygon and `other` pass layer filtering
    pub fn interacts_with(&self, other: &Polygon) -> bool {
        CollisionLayer::interacts(self.layer, self.collides_with, other.layer, other.collides_with)
    }

    /// Project onto `axis` for an owner at `position`, returning `(min, max)`
    pub fn project(&self, position: Vec2, axis: &Vec2) -> (f32, f32) {
        let offset = position.dot(axis);
        self.vertices.iter().fold((f32::MAX, f32::MIN), |(lo, hi), v| {
            let p = v.dot(axis) + offset;
            (lo.min(p), hi.max(p))
        })
    }
}

/// Serialized form of a [`Polygon`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonDef {
    /// Local-space vertices as `(x, y)` pairs
    pub vertices: Vec<(f32, f32)>,
    /// Layer tag
    pub layer: CollisionLayer,
    /// Collision mask
    pub collides_with: CollisionLayer,
}

impl TryFrom<PolygonDef> for Polygon {
    type Error = PhysicsError;

    fn try_from(def: PolygonDef) -> Result<Self, Self::Error> {
        let vertices = def.vertices.into_iter().map(|(x, y)| Vec2::new(x, y)).collect();
        Polygon::new(vertices, def.layer, def.collides_with)
    }
}

impl From<Polygon> for PolygonDef {
    fn from(polygon: Polygon) -> Self {
        Self {
            vertices: polygon.vertices.iter().map(|v| (v.x, v.y)).collect(),
            layer: polygon.layer,
            collides_with: polygon.collides_with,
        }
    }
}

/// Result of a successful separating-axis test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatResult {
    /// Minimum-overlap axis, pointing from A's center toward B's center
    pub normal: Vec2,
    /// Overlap along `normal`
    pub depth: f32,
    /// Vertex of A reaching deepest along `normal`
    pub point: Vec2,
}

/// Separating-axis test between two convex polygons at the given positions
///
/// Candidate axes are the outward edge normals of both polygons. Any axis on
/// which the projections do not overlap proves separation; touching counts as
/// separated.
pub fn sat_test(a: &Polygon, pos_a: Vec2, b: &Polygon, pos_b: Vec2) -> Option<SatResult> {
    let mut best_axis = Vec2::zeros();
    let mut best_depth = f32::MAX;

    for axis in a.normals.iter().chain(b.normals.iter()) {
        let (min_a, max_a) = a.project(pos_a, axis);
        let (min_b, max_b) = b.project(pos_b, axis);

        let overlap = max_a.min(max_b) - min_a.max(min_b);
        if overlap <= 0.0 {
            return None;
        }
        if overlap < best_depth {
            best_depth = overlap;
            best_axis = *axis;
        }
    }

    let center_a = a.center + pos_a;
    let center_b = b.center + pos_b;
    if best_axis.dot(&(center_b - center_a)) < 0.0 {
        best_axis = -best_axis;
    }

    let point = a
        .vertices
        .iter()
        .map(|v| v + pos_a)
        .fold((Vec2::zeros(), f32::MIN), |(best, best_dot), v| {
            let d = v.dot(&best_axis);
            if d > best_dot { (v, d) } else { (best, best_dot) }
        })
        .0;

    Some(SatResult {
        normal: best_axis,
        depth: best_depth,
        point,
    })
}

fn signed_area(vertices: &[Vec2]) -> f32 {
    let count = vertices.len();
    let twice: f32 = (0..count)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % count];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice * 0.5
}

fn is_convex_ccw(vertices: &[Vec2]) -> bool {
    let count = vertices.len();
    (0..count).all(|i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % count];
        let c = vertices[(i + 2) % count];
        let ab = b - a;
        let bc = c - b;
        ab.x * bc.y - ab.y * bc.x >= -AREA_EPSILON
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(size: f32) -> Polygon {
        Polygon::rectangle(size, size, CollisionLayer::WORLD, CollisionLayer::all()).unwrap()
    }

    #[test]
    fn test_overlapping_squares_depth_and_normal() {
        let a = square(10.0);
        let b = square(10.0);

        let hit = sat_test(&a, Vec2::new(0.0, 0.0), &b, Vec2::new(5.0, 0.0)).unwrap();
        assert_relative_eq!(hit.depth, 5.0, epsilon = 1e-5);
        assert_relative_eq!(hit.normal.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(hit.normal.y, 0.0, epsilon = 1e-6);

        // Swapping the bodies flips the normal so it still points A -> B
        let hit = sat_test(&b, Vec2::new(5.0, 0.0), &a, Vec2::new(0.0, 0.0)).unwrap();
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_contact_point_is_deepest_vertex_of_a() {
        let a = square(10.0);
        let b = square(10.0);

        let hit = sat_test(&a, Vec2::zeros(), &b, Vec2::new(8.0, 0.0)).unwrap();
        assert_relative_eq!(hit.point.x, 5.0, epsilon = 1e-6);
        assert_relative_eq!(hit.depth, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_separated_and_touching_squares() {
        let a = square(10.0);
        let b = square(10.0);

        assert!(sat_test(&a, Vec2::zeros(), &b, Vec2::new(11.0, 0.0)).is_none());
        assert!(sat_test(&a, Vec2::zeros(), &b, Vec2::new(10.0, 0.0)).is_none());
    }

    #[test]
    fn test_triangle_vs_square_separated_on_diagonal() {
        let triangle = Polygon::new(
            vec![Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(0.0, 4.0)],
            CollisionLayer::WORLD,
            CollisionLayer::all(),
        )
        .unwrap();
        let box_ = square(2.0);

        // AABBs overlap but the hypotenuse separates them
        assert!(sat_test(&triangle, Vec2::zeros(), &box_, Vec2::new(3.2, 3.2)).is_none());
        assert!(sat_test(&triangle, Vec2::zeros(), &box_, Vec2::new(1.5, 1.5)).is_some());
    }

    #[test]
    fn test_clockwise_input_is_rewound() {
        let polygon = Polygon::new(
            vec![Vec2::new(0.0, 0.0), Vec2::new(0.0, 2.0), Vec2::new(2.0, 2.0), Vec2::new(2.0, 0.0)],
            CollisionLayer::WORLD,
            CollisionLayer::all(),
        )
        .unwrap();

        // Every normal points away from the center
        for (i, normal) in polygon.normals().iter().enumerate() {
            let midpoint = (polygon.vertices()[i] + polygon.vertices()[(i + 1) % 4]) * 0.5;
            assert!(normal.dot(&(midpoint - polygon.center())) > 0.0);
        }
    }

    #[test]
    fn test_degenerate_polygons_rejected() {
        let layer = CollisionLayer::WORLD;
        assert!(Polygon::new(vec![Vec2::zeros(), Vec2::new(1.0, 0.0)], layer, layer).is_err());
        assert!(Polygon::new(
            vec![Vec2::zeros(), Vec2::new(1.0, 0.0), Vec2::new(2.0, 0.0)],
            layer,
            layer
        )
        .is_err());
        assert!(Polygon::new(
            vec![Vec2::zeros(), Vec2::new(f32::NAN, 0.0), Vec2::new(0.0, 1.0)],
            layer,
            layer
        )
        .is_err());

        // Arrow head: concave
        let concave = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 4.0),
        ];
        assert!(matches!(
            Polygon::new(concave, layer, layer),
            Err(PhysicsError::DegeneratePolygon { .. })
        ));
        assert!(Polygon::rectangle(0.0, 1.0, layer, layer).is_err());
    }

    #[test]
    fn test_polygon_ron_roundtrip_validates() {
        let text = "(vertices: [(0.0, 0.0), (2.0, 0.0), (0.0, 2.0)], layer: \"HITBOX\", collides_with: \"HURTBOX\")";
        let polygon: Polygon = ron::from_str(text).unwrap();
        assert_eq!(polygon.layer, CollisionLayer::HITBOX);
        assert_eq!(polygon.vertices().len(), 3);

        let flat = "(vertices: [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)], layer: \"WORLD\", collides_with: \"WORLD\")";
        assert!(ron::from_str::<Polygon>(flat).is_err());
    }

    #[test]
    fn test_aabb_operations() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
        let b = Aabb::new(Vec2::new(2.0, 1.0), Vec2::new(3.0, 5.0));
        let c = Aabb::new(Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0));

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let u = a.union(&c);
        assert_eq!(u.min, Vec2::new(0.0, 0.0));
        assert_eq!(u.max, Vec2::new(6.0, 6.0));
        assert!(u.contains_point(Vec2::new(3.0, 3.0)));

        let grown = a.expanded(1.0);
        assert_eq!(grown.extents(), Vec2::new(4.0, 4.0));
        assert_eq!(a.translated(Vec2::new(1.0, 1.0)).center(), Vec2::new(2.0, 2.0));
    }
}
