//! World state management.
//!
//! [`GameState`] is the aggregate root owned by the engine. Outside the
//! engine it is only reachable through shared references, usually wrapped in
//! a [`GameView`].

use std::collections::{BTreeMap, HashSet};

use glam::Vec2;
use rand::Rng;

use crate::config::Config;
use crate::entity::{Body, Cell, Color, Food, Pellet, Pid, Player, Virus};
use crate::error::{EnvError, Result};

/// World border bounds. The arena spans `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBorder {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub width: f32,
    pub height: f32,
}

impl WorldBorder {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: width,
            max_y: height,
            width,
            height,
        }
    }

    /// Random position that keeps a circle of `radius` inside the border.
    pub fn random_position(&self, rng: &mut impl Rng, radius: f32) -> Vec2 {
        let x = Self::random_axis(rng, self.min_x, self.max_x, radius);
        let y = Self::random_axis(rng, self.min_y, self.max_y, radius);
        Vec2::new(x, y)
    }

    fn random_axis(rng: &mut impl Rng, min: f32, max: f32, radius: f32) -> f32 {
        let (lo, hi) = (min + radius, max - radius);
        if lo < hi {
            rng.random_range(lo..hi)
        } else {
            (min + max) / 2.0
        }
    }

    /// Clamp a circle center so the circle stays inside. Circles wider than
    /// the arena are centered.
    #[inline]
    pub fn clamp_circle(&self, position: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            Self::clamp_axis(position.x, self.min_x, self.max_x, radius),
            Self::clamp_axis(position.y, self.min_y, self.max_y, radius),
        )
    }

    #[inline]
    fn clamp_axis(value: f32, min: f32, max: f32, radius: f32) -> f32 {
        let (lo, hi) = (min + radius, max - radius);
        if lo <= hi {
            value.clamp(lo, hi)
        } else {
            (min + max) / 2.0
        }
    }

    #[inline]
    pub fn contains_circle(&self, position: Vec2, radius: f32) -> bool {
        const EPS: f32 = 1e-3;
        position.x - radius >= self.min_x - EPS
            && position.x + radius <= self.max_x + EPS
            && position.y - radius >= self.min_y - EPS
            && position.y + radius <= self.max_y + EPS
    }
}

/// Every entity in the arena.
#[derive(Debug, Clone)]
pub struct GameState {
    pub(crate) players: BTreeMap<Pid, Player>,
    pub(crate) pellets: Vec<Pellet>,
    pub(crate) viruses: Vec<Virus>,
    pub(crate) foods: Vec<Food>,
    pub(crate) border: WorldBorder,
}

impl GameState {
    pub fn new(border: WorldBorder) -> Self {
        Self {
            players: BTreeMap::new(),
            pellets: Vec::with_capacity(1024),
            viruses: Vec::with_capacity(64),
            foods: Vec::with_capacity(256),
            border,
        }
    }

    #[inline]
    pub fn border(&self) -> &WorldBorder {
        &self.border
    }

    /// Players in ascending pid order.
    #[inline]
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    #[inline]
    pub fn player(&self, pid: Pid) -> Option<&Player> {
        self.players.get(&pid)
    }

    #[inline]
    pub fn pellets(&self) -> &[Pellet] {
        &self.pellets
    }

    #[inline]
    pub fn viruses(&self) -> &[Virus] {
        &self.viruses
    }

    #[inline]
    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    /// Cells of every live player, in pid order.
    pub fn cells(&self) -> impl Iterator<Item = (Pid, &Cell)> {
        self.players
            .values()
            .flat_map(|p| p.cells.iter().map(move |c| (p.pid(), c)))
    }

    /// Drop all world entities and every player's cells.
    pub(crate) fn clear(&mut self) {
        self.pellets.clear();
        self.viruses.clear();
        self.foods.clear();
        for player in self.players.values_mut() {
            player.kill();
            player.action = Default::default();
        }
    }

    /// Sum of the mass of every live entity.
    pub fn total_mass(&self) -> f32 {
        let pellets: f32 = self.pellets.iter().map(Body::mass).sum();
        let viruses: f32 = self.viruses.iter().map(Body::mass).sum();
        let foods: f32 = self.foods.iter().map(Body::mass).sum();
        let cells: f32 = self.players.values().map(Player::total_mass).sum();
        pellets + viruses + foods + cells
    }

    #[inline]
    pub fn cell_counts(&self) -> CellCounts {
        let cells = self.players.values().map(|p| p.cells.len()).sum();
        CellCounts {
            cells,
            pellets: self.pellets.len(),
            viruses: self.viruses.len(),
            foods: self.foods.len(),
            alive_players: self.players.values().filter(|p| !p.is_dead()).count(),
        }
    }

    /// Live players by total mass, heaviest first.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .players
            .values()
            .filter(|p| !p.is_dead())
            .map(|p| LeaderboardEntry {
                pid: p.pid(),
                name: p.name().to_string(),
                score: p.total_mass(),
            })
            .collect();
        entries.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.pid.cmp(&b.pid)));
        entries
    }

    /// Verify the structural invariants: unique entity ids, positive mass on
    /// every live cell, every body inside the border.
    pub fn check_invariants(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let mut claim = |id: u32, what: &str| {
            if ids.insert(id) {
                Ok(())
            } else {
                Err(EnvError::InvariantViolation(format!("entity {id} ({what}) is held twice")))
            }
        };
        for pellet in &self.pellets {
            claim(pellet.id, "pellet")?;
        }
        for virus in &self.viruses {
            claim(virus.id, "virus")?;
        }
        for food in &self.foods {
            claim(food.id, "food")?;
        }
        for player in self.players.values() {
            for cell in &player.cells {
                claim(cell.id, "cell")?;
                if !(cell.mass() > 0.0) {
                    return Err(EnvError::InvariantViolation(format!(
                        "cell {} of player {} has mass {}",
                        cell.id,
                        player.pid(),
                        cell.mass()
                    )));
                }
                let fits = 2.0 * cell.radius() <= self.border.width.min(self.border.height);
                if fits && !self.border.contains_circle(cell.position, cell.radius()) {
                    return Err(EnvError::InvariantViolation(format!(
                        "cell {} at {} escapes the arena",
                        cell.id, cell.position
                    )));
                }
            }
        }
        Ok(())
    }
}

/// A leaderboard entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub pid: Pid,
    pub name: String,
    /// Total mass.
    pub score: f32,
}

/// Entity count statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellCounts {
    pub cells: usize,
    pub pellets: usize,
    pub viruses: usize,
    pub foods: usize,
    pub alive_players: usize,
}

/// Read-only view of committed state handed to bots, renderers and encoders.
#[derive(Debug, Clone, Copy)]
pub struct GameView<'a> {
    state: &'a GameState,
    config: &'a Config,
    tick: u64,
}

impl<'a> GameView<'a> {
    pub fn new(state: &'a GameState, config: &'a Config, tick: u64) -> Self {
        Self { state, config, tick }
    }

    #[inline]
    pub fn state(&self) -> &'a GameState {
        self.state
    }

    /// Rules in force (eat ratio, pop threshold, ...).
    #[inline]
    pub fn config(&self) -> &'a Config {
        self.config
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn border(&self) -> &'a WorldBorder {
        &self.state.border
    }

    #[inline]
    pub fn player(&self, pid: Pid) -> Option<&'a Player> {
        self.state.players.get(&pid)
    }

    #[inline]
    pub fn players(&self) -> impl Iterator<Item = &'a Player> {
        self.state.players.values()
    }

    #[inline]
    pub fn pellets(&self) -> &'a [Pellet] {
        &self.state.pellets
    }

    #[inline]
    pub fn viruses(&self) -> &'a [Virus] {
        &self.state.viruses
    }

    #[inline]
    pub fn foods(&self) -> &'a [Food] {
        &self.state.foods
    }
}

/// Generate a random color.
#[inline]
pub fn random_color(rng: &mut impl Rng) -> Color {
    Color::new(
        rng.random_range(50..=255),
        rng.random_range(50..=255),
        rng.random_range(50..=255),
    )
}
