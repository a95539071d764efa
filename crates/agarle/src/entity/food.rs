//! Ejected food.

use glam::Vec2;

use super::cell::{Body, EntityId};
use crate::world::WorldBorder;

/// Mass ejected by a player (FEED action). Drifts until friction stops it.
#[derive(Debug, Clone, PartialEq)]
pub struct Food {
    pub id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
    pub tick_of_birth: u64,
}

impl Food {
    pub fn new(id: EntityId, position: Vec2, velocity: Vec2, mass: f32, tick: u64) -> Self {
        Self {
            id,
            position,
            velocity,
            mass,
            tick_of_birth: tick,
        }
    }

    /// Fresh food cannot be eaten until its grace window has passed.
    #[inline]
    pub fn is_edible(&self, current_tick: u64, grace_ticks: u64) -> bool {
        current_tick.saturating_sub(self.tick_of_birth) >= grace_ticks
    }

    /// Drift one tick, slow down and stay inside the border.
    pub fn drift(&mut self, dt: f32, drag: f32, border: &WorldBorder) {
        if self.velocity == Vec2::ZERO {
            return;
        }
        self.position += self.velocity * dt;
        self.velocity *= drag;
        if self.velocity.length_squared() < 1e-4 {
            self.velocity = Vec2::ZERO;
        }
        let clamped = border.clamp_circle(self.position, self.radius());
        if clamped != self.position {
            self.position = clamped;
            self.velocity = Vec2::ZERO;
        }
    }
}

impl Body for Food {
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
