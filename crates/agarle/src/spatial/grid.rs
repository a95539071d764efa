//! Spatial hash grid.
//!
//! Items are keyed by a caller-chosen index (the slot of the body in the
//! per-tick snapshot). Queries return keys in ascending order so callers get
//! a deterministic visiting order for free.

use fixedbitset::FixedBitSet;
use glam::Vec2;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Create bounds from center and half-extent.
    #[inline]
    pub fn from_center(center: Vec2, size: f32) -> Self {
        Self {
            min_x: center.x - size,
            min_y: center.y - size,
            max_x: center.x + size,
            max_y: center.y + size,
        }
    }

    /// Closed-interval intersection, so touching boxes count.
    #[inline]
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(other.min_x > self.max_x
            || other.max_x < self.min_x
            || other.min_y > self.max_y
            || other.max_y < self.min_y)
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// An item stored in the grid.
#[derive(Debug, Clone)]
pub struct GridItem {
    pub key: usize,
    pub position: Vec2,
    pub size: f32,
    pub bound: Bounds,
}

impl GridItem {
    #[inline]
    pub fn new(key: usize, position: Vec2, size: f32) -> Self {
        Self {
            key,
            position,
            size,
            bound: Bounds::from_center(position, size),
        }
    }
}

/// Uniform grid over the arena with lazy rebuild.
pub struct SpatialGrid {
    items: Vec<GridItem>,
    bounds: Bounds,
    dirty: bool,
    /// Item slots per grid square.
    grid: Vec<Vec<usize>>,
    grid_size: usize,
    cell_width: f32,
    cell_height: f32,
    /// Reusable dedup set over item slots.
    seen: FixedBitSet,
}

impl SpatialGrid {
    pub fn new(bounds: Bounds, grid_size: usize) -> Self {
        let grid_size = grid_size.max(1);
        Self {
            items: Vec::with_capacity(1024),
            bounds,
            dirty: false,
            grid: vec![Vec::new(); grid_size * grid_size],
            grid_size,
            cell_width: (bounds.width() / grid_size as f32).max(f32::EPSILON),
            cell_height: (bounds.height() / grid_size as f32).max(f32::EPSILON),
            seen: FixedBitSet::with_capacity(1024),
        }
    }

    /// Grid for a square arena of side `size`, 32x32 squares.
    pub fn for_arena(size: f32) -> Self {
        Self::new(Bounds::new(0.0, 0.0, size, size), 32)
    }

    #[inline]
    fn column(&self, x: f32) -> usize {
        let g = ((x - self.bounds.min_x) / self.cell_width).floor();
        (g.max(0.0) as usize).min(self.grid_size - 1)
    }

    #[inline]
    fn row(&self, y: f32) -> usize {
        let g = ((y - self.bounds.min_y) / self.cell_height).floor();
        (g.max(0.0) as usize).min(self.grid_size - 1)
    }

    pub fn insert(&mut self, item: GridItem) {
        self.items.push(item);
        self.dirty = true;
    }

    fn rebuild_grid(&mut self) {
        if !self.dirty {
            return;
        }
        for square in &mut self.grid {
            square.clear();
        }
        for slot in 0..self.items.len() {
            let bound = self.items[slot].bound;
            let (min_gx, max_gx) = (self.column(bound.min_x), self.column(bound.max_x));
            let (min_gy, max_gy) = (self.row(bound.min_y), self.row(bound.max_y));
            for gy in min_gy..=max_gy {
                let row_start = gy * self.grid_size;
                for gx in min_gx..=max_gx {
                    self.grid[row_start + gx].push(slot);
                }
            }
        }
        if self.seen.len() < self.items.len() {
            self.seen.grow(self.items.len());
        }
        self.dirty = false;
    }

    /// Keys of all items whose bounds intersect `bound`, ascending.
    pub fn find_in_bounds(&mut self, bound: &Bounds) -> Vec<usize> {
        self.rebuild_grid();

        let (min_gx, max_gx) = (self.column(bound.min_x), self.column(bound.max_x));
        let (min_gy, max_gy) = (self.row(bound.min_y), self.row(bound.max_y));

        let mut result = Vec::with_capacity(32);
        self.seen.clear();
        for gy in min_gy..=max_gy {
            for gx in min_gx..=max_gx {
                for &slot in &self.grid[gy * self.grid_size + gx] {
                    if self.seen.put(slot) {
                        continue;
                    }
                    let item = &self.items[slot];
                    if item.bound.intersects(bound) {
                        result.push(item.key);
                    }
                }
            }
        }
        result.sort_unstable();
        result
    }

    /// Keys of all items whose bounds intersect the box around a circle.
    #[inline]
    pub fn find_in_radius(&mut self, center: Vec2, radius: f32) -> Vec<usize> {
        self.find_in_bounds(&Bounds::from_center(center, radius))
    }

    pub fn clear(&mut self) {
        self.items.clear();
        for square in &mut self.grid {
            square.clear();
        }
        self.seen.clear();
        self.dirty = false;
    }
}

impl std::fmt::Debug for SpatialGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialGrid")
            .field("items", &self.items.len())
            .field("bounds", &self.bounds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_intersects() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(5.0, 5.0, 15.0, 15.0);
        let c = Bounds::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(!c.intersects(&a));
    }

    #[test]
    fn test_grid_insert_find() {
        let mut grid = SpatialGrid::for_arena(200.0);

        grid.insert(GridItem::new(0, Vec2::new(100.0, 100.0), 10.0));
        grid.insert(GridItem::new(1, Vec2::new(150.0, 150.0), 10.0));
        grid.insert(GridItem::new(2, Vec2::new(50.0, 50.0), 10.0));

        assert_eq!(grid.find_in_radius(Vec2::new(100.0, 100.0), 20.0), vec![0]);
        assert_eq!(grid.find_in_radius(Vec2::new(150.0, 150.0), 20.0), vec![1]);
        assert_eq!(grid.find_in_radius(Vec2::new(100.0, 100.0), 100.0), vec![0, 1, 2]);
    }

    #[test]
    fn large_items_and_edges_are_found() {
        let mut grid = SpatialGrid::for_arena(1000.0);
        grid.insert(GridItem::new(7, Vec2::new(500.0, 500.0), 400.0));
        grid.insert(GridItem::new(3, Vec2::new(1000.0, 1000.0), 1.0));
        assert_eq!(grid.find_in_radius(Vec2::new(150.0, 150.0), 5.0), vec![7]);
        assert_eq!(grid.find_in_radius(Vec2::new(999.0, 999.0), 5.0), vec![3]);
        assert_eq!(grid.find_in_radius(Vec2::new(895.0, 895.0), 10.0), vec![7]);
    }

    #[test]
    fn results_are_sorted_and_unique() {
        let mut grid = SpatialGrid::for_arena(100.0);
        for key in (0..20).rev() {
            grid.insert(GridItem::new(key, Vec2::new(50.0, 50.0), 30.0));
        }
        let found = grid.find_in_radius(Vec2::new(50.0, 50.0), 30.0);
        assert_eq!(found, (0..20).collect::<Vec<_>>());
        grid.clear();
        assert!(grid.find_in_radius(Vec2::new(50.0, 50.0), 30.0).is_empty());
    }
}
