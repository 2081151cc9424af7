//! Spatial partitioning data structures
//!
//! Provides the uniform grid used by the broad phase to find nearby
//! collision candidates in 2D space.

mod grid;

pub use grid::SpatialGrid;
