//! Spatial indexing utilities.
//!
//! Uniform grid used as the broad phase of collision resolution.

mod grid;

pub use grid::{Bounds, GridItem, SpatialGrid};
