//! Virus.

use glam::Vec2;

use super::cell::{Body, EntityId};

/// A static hazard that pops cells heavier than the pop threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Virus {
    pub id: EntityId,
    pub position: Vec2,
    mass: f32,
}

impl Virus {
    pub fn new(id: EntityId, position: Vec2, mass: f32) -> Self {
        Self {
            id,
            position,
            mass: mass.max(0.0),
        }
    }

    /// Absorb fed food.
    #[inline]
    pub fn on_eat(&mut self, mass: f32) {
        self.mass += mass.max(0.0);
    }

    /// Divide in half. Returns the mass of the new virus.
    #[inline]
    pub fn halve(&mut self) -> f32 {
        let half = self.mass / 2.0;
        self.mass -= half;
        half
    }
}

impl Body for Virus {
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
