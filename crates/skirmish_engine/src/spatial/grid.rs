//! Uniform-grid broad-phase index
//!
//! The grid covers a bounding region with square cells. It holds no state
//! between frames: the collision pipeline clears it and re-inserts every body
//! each frame, so there is no incremental maintenance and no stale entry.
//! Boxes reaching outside the region are clamped onto the border cells.

use std::collections::HashSet;

use crate::ecs::Entity;
use crate::foundation::math::Vec2;
use crate::physics::{Aabb, PhysicsError};

/// Upper bound on the number of cells a single grid may allocate
const MAX_CELLS: usize = 1 << 22;

/// Uniform grid of entity buckets
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    origin: Vec2,
    cell_size: f32,
    columns: usize,
    rows: usize,
    cells: Vec<Vec<Entity>>,
}

impl SpatialGrid {
    /// Create a grid covering `bounds` with square cells of `cell_size`
    ///
    /// Each axis gets `ceil(extent / cell_size) + 1` cells.
    pub fn new(bounds: Aabb, cell_size: f32) -> Result<Self, PhysicsError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(PhysicsError::InvalidGrid {
                reason: format!("cell size must be positive, got {cell_size}"),
            });
        }
        if !bounds.is_finite() || bounds.max.x < bounds.min.x || bounds.max.y < bounds.min.y {
            return Err(PhysicsError::InvalidGrid {
                reason: format!("invalid bounds {:?} .. {:?}", bounds.min, bounds.max),
            });
        }

        let extents = bounds.extents();
        let columns = (extents.x / cell_size).ceil() as usize + 1;
        let rows = (extents.y / cell_size).ceil() as usize + 1;

        let total = columns.checked_mul(rows).filter(|&total| total <= MAX_CELLS).ok_or_else(|| {
            PhysicsError::InvalidGrid {
                reason: format!("{columns}x{rows} cells exceeds the grid limit"),
            }
        })?;

        Ok(Self {
            origin: bounds.min,
            cell_size,
            columns,
            rows,
            cells: vec![Vec::new(); total],
        })
    }

    /// Remove every entity, keeping the allocated buckets
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    /// Add `entity` to every cell its box overlaps
    pub fn insert_entity(&mut self, entity: Entity, bounds: &Aabb) {
        let (x0, y0, x1, y1) = self.cell_range(bounds);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let index = self.index(x, y);
                self.cells[index].push(entity);
            }
        }
    }

    /// Entities sharing a cell with `bounds` or one of the 8 neighbouring cells
    ///
    /// The result is de-duplicated, excludes `entity` itself and is sorted by
    /// entity id.
    pub fn get_potential_collisions(&self, entity: Entity, bounds: &Aabb) -> Vec<Entity> {
        let (x0, y0, x1, y1) = self.cell_range(bounds);
        let x0 = x0.saturating_sub(1);
        let y0 = y0.saturating_sub(1);
        let x1 = (x1 + 1).min(self.columns - 1);
        let y1 = (y1 + 1).min(self.rows - 1);

        let mut seen = HashSet::new();
        for y in y0..=y1 {
            for x in x0..=x1 {
                for &other in &self.cells[self.index(x, y)] {
                    if other != entity {
                        seen.insert(other);
                    }
                }
            }
        }

        let mut result: Vec<Entity> = seen.into_iter().collect();
        result.sort_unstable();
        result
    }

    /// Entities stored in the cell at `(x, y)`
    pub fn cell(&self, x: usize, y: usize) -> &[Entity] {
        if x >= self.columns || y >= self.rows {
            return &[];
        }
        &self.cells[self.index(x, y)]
    }

    /// Cell coordinates containing `point`, clamped to the grid
    pub fn cell_of(&self, point: Vec2) -> (usize, usize) {
        let local = (point - self.origin) / self.cell_size;
        (
            clamp_axis(local.x, self.columns),
            clamp_axis(local.y, self.rows),
        )
    }

    /// Grid size as `(columns, rows)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    /// Side length of one cell
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn cell_range(&self, bounds: &Aabb) -> (usize, usize, usize, usize) {
        let (x0, y0) = self.cell_of(bounds.min);
        let (x1, y1) = self.cell_of(bounds.max);
        (x0, y0, x1, y1)
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.columns + x
    }
}

fn clamp_axis(value: f32, count: usize) -> usize {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        (value.floor() as usize).min(count - 1)
    }
}
