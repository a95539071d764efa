//! Collision geometry and mass arithmetic.
//!
//! - Circle overlap tests between bodies
//! - Mass/size conversion (mass = size² / 100)
//! - Fragment schedule for virus pops

use glam::Vec2;

pub const MASS_CONVERSION: f32 = 100.0;

/// Result of checking collision between two circles.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResult {
    /// Combined radius of both bodies
    pub r: f32,
    /// Offset from the first body to the second
    pub delta: Vec2,
    /// Actual distance
    pub d: f32,
    /// Squared distance
    pub squared: f32,
}

impl CollisionResult {
    /// Check if the circles overlap.
    #[inline]
    pub fn is_colliding(&self) -> bool {
        self.d < self.r
    }

    /// Penetration depth, zero when apart.
    #[inline]
    pub fn overlap(&self) -> f32 {
        (self.r - self.d).max(0.0)
    }
}

#[inline]
pub fn check_cell_collision(
    cell_pos: Vec2,
    cell_size: f32,
    check_pos: Vec2,
    check_size: f32,
) -> CollisionResult {
    let delta = check_pos - cell_pos;
    let squared = delta.length_squared();
    CollisionResult {
        r: cell_size + check_size,
        delta,
        d: squared.sqrt(),
        squared,
    }
}

#[inline]
pub fn size_to_mass(size: f32) -> f32 {
    (size * size) / MASS_CONVERSION
}

/// Radius for a mass. Monotonic, zero for non-positive mass.
#[inline]
pub fn mass_to_size(mass: f32) -> f32 {
    (MASS_CONVERSION * mass.max(0.0)).sqrt()
}

/// Masses of the fragments a popped cell sheds.
///
/// `cells_left` is how many more cells the owner may have; `split_min` is the
/// smallest fragment worth creating. The popped cell keeps whatever is not
/// handed out, so the fragments always sum to less than `cell_mass`.
pub fn virus_split_masses(cell_mass: f32, cells_left: usize, split_min: f32) -> Vec<f32> {
    let mut splits = Vec::new();
    if cells_left == 0 || cell_mass <= 0.0 {
        return splits;
    }

    // Not enough mass to fill every slot: split into a power of two.
    if cell_mass / (cells_left as f32) < split_min {
        let mut split_count: usize = 2;
        let mut split_mass = cell_mass / split_count as f32;
        while split_mass > split_min && 2 * split_count < cells_left {
            split_count *= 2;
            split_mass = cell_mass / split_count as f32;
        }
        // The popped cell keeps one share.
        let split_mass = cell_mass / (split_count + 1) as f32;
        let split_count = split_count.min(cells_left);
        splits.resize(split_count, split_mass);
        return splits;
    }

    // Hand out halves of the remainder until the slots run out.
    let mut mass_left = cell_mass / 2.0;
    let mut split_mass = cell_mass / 2.0;
    let mut remaining = cells_left;
    while remaining > 0 {
        remaining -= 1;
        if remaining > 0 && mass_left / (remaining as f32) < split_min {
            // Share what is left evenly over the last slots.
            let fill = mass_left / remaining as f32;
            splits.extend(std::iter::repeat_n(fill, remaining));
            break;
        }
        while split_mass >= mass_left && remaining > 0 {
            split_mass /= 2.0;
        }
        splits.push(split_mass);
        mass_left -= split_mass;
    }
    splits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_mass_conversion() {
        let mass = 100.0;
        let size = mass_to_size(mass);
        let back = size_to_mass(size);
        assert!((back - mass).abs() < 0.001);
        assert_eq!(mass_to_size(-1.0), 0.0);
    }

    #[test]
    fn test_collision_check() {
        let result = check_cell_collision(Vec2::new(0.0, 0.0), 50.0, Vec2::new(30.0, 0.0), 20.0);
        assert!(result.is_colliding()); // 50 + 20 = 70, distance = 30
        assert_eq!(result.d, 30.0);
        assert_eq!(result.overlap(), 40.0);
    }

    #[test]
    fn test_no_collision() {
        let result = check_cell_collision(Vec2::new(0.0, 0.0), 10.0, Vec2::new(100.0, 0.0), 10.0);
        assert!(!result.is_colliding()); // 10 + 10 = 20, distance = 100
        assert_eq!(result.overlap(), 0.0);
    }

    #[test]
    fn split_masses_never_exceed_cell() {
        for &(mass, left) in &[(150.0, 15), (400.0, 4), (1000.0, 15), (60.0, 1), (5000.0, 11)] {
            let splits = virus_split_masses(mass, left, 36.0);
            assert!(splits.len() <= left, "{mass} {left}: {splits:?}");
            let total: f32 = splits.iter().sum();
            assert!(total < mass, "{mass} {left}: {splits:?}");
            assert!(splits.iter().all(|&m| m > 0.0));
        }
    }

    #[test]
    fn small_cell_splits_into_power_of_two() {
        // 150 / 15 = 10 < 36: doubles 2 -> 4 -> 8, each fragment 150 / 9.
        let splits = virus_split_masses(150.0, 15, 36.0);
        assert_eq!(splits.len(), 8);
        assert!(splits.iter().all(|&m| (m - 150.0 / 9.0).abs() < 1e-4));
    }

    #[test]
    fn thin_remainder_is_shared_evenly() {
        // 1000 / 15 >= 36, but the 500 left over 14 slots is below 36 each.
        let splits = virus_split_masses(1000.0, 15, 36.0);
        assert_eq!(splits.len(), 14);
        assert!(splits.iter().all(|&m| (m - 500.0 / 14.0).abs() < 1e-4));
    }

    #[test]
    fn no_slots_no_split() {
        assert!(virus_split_masses(1000.0, 0, 36.0).is_empty());
    }
}
