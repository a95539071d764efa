//! Pellet.

use glam::Vec2;

use super::cell::{Body, EntityId};

/// A static mass source scattered over the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct Pellet {
    pub id: EntityId,
    pub position: Vec2,
    pub mass: f32,
}

impl Pellet {
    pub fn new(id: EntityId, position: Vec2, mass: f32) -> Self {
        Self { id, position, mass }
    }
}

impl Body for Pellet {
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
