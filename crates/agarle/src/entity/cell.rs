//! Player cell and the common body contract.

use glam::Vec2;

use crate::collision::mass_to_size;
use crate::world::WorldBorder;

/// Unique entity id, allocated per episode and shared by every entity category.
pub type EntityId = u32;

/// Anything with a position and a mass.
pub trait Body {
    fn id(&self) -> EntityId;

    fn position(&self) -> Vec2;

    fn mass(&self) -> f32;

    /// Collision radius, always derived from mass.
    #[inline]
    fn radius(&self) -> f32 {
        mass_to_size(self.mass())
    }
}

/// One movable sub-unit of a player.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    mass: f32,
    /// Tick when the cell was created.
    pub tick_of_birth: u64,
    /// First tick at which this cell may merge with a sibling.
    pub merge_tick: u64,
}

impl Cell {
    pub fn new(id: EntityId, position: Vec2, mass: f32, tick: u64) -> Self {
        let mut cell = Self {
            id,
            position,
            velocity: Vec2::ZERO,
            mass: 0.0,
            tick_of_birth: tick,
            merge_tick: 0,
        };
        cell.set_mass(mass);
        cell
    }

    /// Set the mass, saturating at zero. Non-finite input counts as zero.
    #[inline]
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = if mass.is_finite() && mass > 0.0 { mass } else { 0.0 };
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.mass > 0.0
    }

    #[inline]
    pub fn can_merge(&self, current_tick: u64) -> bool {
        current_tick >= self.merge_tick
    }

    /// Top speed for this cell. Bigger cells are slower.
    /// Formula from MultiOgar: speed * size^-0.439
    #[inline]
    pub fn max_speed(&self, speed: f32) -> f32 {
        let size = self.radius().max(1.0);
        speed * size.powf(-0.439)
    }

    /// Steer toward `direction` (length <= 1). With `drag` applied after the
    /// move the velocity settles at `drag * max_speed * direction`.
    #[inline]
    pub fn thrust(&mut self, direction: Vec2, max_speed: f32, drag: f32) {
        self.velocity += direction * max_speed * (1.0 - drag);
    }

    /// Integrate one tick of motion and apply friction.
    #[inline]
    pub fn advance(&mut self, dt: f32, drag: f32) {
        self.position += self.velocity * dt;
        self.velocity *= drag;
    }

    /// Clamp the cell so its whole circle is inside the border.
    /// Velocity into a wall is cancelled.
    #[inline]
    pub fn check_border(&mut self, border: &WorldBorder) {
        let radius = self.radius();
        let clamped = border.clamp_circle(self.position, radius);
        if clamped.x != self.position.x {
            self.velocity.x = 0.0;
        }
        if clamped.y != self.position.y {
            self.velocity.y = 0.0;
        }
        self.position = clamped;
    }
}

impl Body for Cell {
    fn id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn mass(&self) -> f32 {
        self.mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construct() {
        let cell = Cell::new(1, Vec2::new(100.0, 125.0), 25.0, 0);
        assert_eq!(cell.position, Vec2::new(100.0, 125.0));
        assert_eq!(cell.mass(), 25.0);
        assert!(cell.is_alive());
    }

    #[test]
    fn mass_saturates_at_zero() {
        let mut cell = Cell::new(1, Vec2::ZERO, 10.0, 0);
        cell.set_mass(-5.0);
        assert_eq!(cell.mass(), 0.0);
        assert!(!cell.is_alive());
        cell.set_mass(f32::NAN);
        assert_eq!(cell.mass(), 0.0);
    }

    #[test]
    fn radius_is_monotonic_in_mass() {
        let mut last = 0.0;
        for m in [0.0, 0.5, 1.0, 10.0, 100.0, 10_000.0] {
            let cell = Cell::new(1, Vec2::ZERO, m, 0);
            assert!(cell.radius() >= last);
            last = cell.radius();
        }
    }

    #[test]
    fn velocity_decays() {
        let mut cell = Cell::new(1, Vec2::ZERO, 10.0, 0);
        cell.velocity = Vec2::new(10.0, 0.0);
        cell.advance(1.0, 0.5);
        assert_eq!(cell.position, Vec2::new(10.0, 0.0));
        assert_eq!(cell.velocity, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn border_clamps_full_radius() {
        let border = WorldBorder::new(1000.0, 1000.0);
        let mut cell = Cell::new(1, Vec2::new(-50.0, 500.0), 100.0, 0);
        cell.velocity = Vec2::new(-3.0, 1.0);
        cell.check_border(&border);
        assert_eq!(cell.position.x, cell.radius());
        assert_eq!(cell.velocity.x, 0.0);
        assert_eq!(cell.velocity.y, 1.0);
    }
}
