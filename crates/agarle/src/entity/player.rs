//! Player: an owner of cells.

use glam::Vec2;

use super::cell::{Body, Cell};
use crate::action::Action;

/// Player id, unique for the lifetime of the process.
pub type Pid = u32;

/// RGB color used for cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A player and the cells it owns. A player with no cells is dead.
#[derive(Debug, Clone)]
pub struct Player {
    pid: Pid,
    name: String,
    color: Color,
    pub(crate) cells: Vec<Cell>,
    /// Pending action, applied every tick until replaced.
    pub(crate) action: Action,
    /// Respawn automatically after death (bots).
    pub(crate) respawn: bool,
    pub(crate) last_split_tick: Option<u64>,
    pub(crate) last_feed_tick: Option<u64>,
}

impl Player {
    pub fn new(pid: Pid, name: impl Into<String>, color: Color) -> Self {
        Self {
            pid,
            name: name.into(),
            color,
            cells: Vec::new(),
            action: Action::default(),
            respawn: false,
            last_split_tick: None,
            last_feed_tick: None,
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn action(&self) -> Action {
        self.action
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn add_cell(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Drop every cell and forget cooldowns.
    pub fn kill(&mut self) {
        self.cells.clear();
        self.last_split_tick = None;
        self.last_feed_tick = None;
    }

    pub fn total_mass(&self) -> f32 {
        self.cells.iter().map(Body::mass).sum()
    }

    /// Mass-weighted centroid of the live cells. `None` when dead.
    pub fn position(&self) -> Option<Vec2> {
        self.weighted(|c| c.position)
    }

    /// Mass-weighted mean velocity of the live cells. `None` when dead.
    pub fn velocity(&self) -> Option<Vec2> {
        self.weighted(|c| c.velocity)
    }

    /// The heaviest cell, lowest id on ties.
    pub fn largest_cell(&self) -> Option<&Cell> {
        self.cells.iter().fold(None, |best: Option<&Cell>, cell| match best {
            Some(b) if b.mass() >= cell.mass() => Some(b),
            _ => Some(cell),
        })
    }

    fn weighted(&self, f: impl Fn(&Cell) -> Vec2) -> Option<Vec2> {
        let total = self.total_mass();
        if self.cells.is_empty() || total <= 0.0 {
            return None;
        }
        let sum = self
            .cells
            .iter()
            .fold(Vec2::ZERO, |acc, c| acc + f(c) * c.mass());
        Some(sum / total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_dead() {
        let player = Player::new(120, "TestPlayer", Color::new(255, 255, 0));
        assert_eq!(player.pid(), 120);
        assert_eq!(player.name(), "TestPlayer");
        assert_eq!(player.color(), Color::new(255, 255, 0));
        assert!(player.is_dead());
        assert!(player.position().is_none());
        assert!(player.velocity().is_none());
    }

    #[test]
    fn add_cell_then_kill() {
        let mut player = Player::new(0, "TestPlayer", Color::default());
        player.add_cell(Cell::new(1, Vec2::new(100.0, 125.0), 25.0, 0));
        assert!(!player.is_dead());
        assert_eq!(player.cells()[0].mass(), 25.0);
        player.kill();
        assert!(player.is_dead());
    }

    #[test]
    fn single_cell_location() {
        let mut player = Player::new(0, "TestPlayer", Color::default());
        player.add_cell(Cell::new(1, Vec2::new(100.0, 100.0), 25.0, 0));
        assert_eq!(player.position(), Some(Vec2::new(100.0, 100.0)));
    }

    #[test]
    fn centroid_is_mass_weighted() {
        let mut player = Player::new(0, "TestPlayer", Color::default());
        player.add_cell(Cell::new(1, Vec2::new(100.0, 100.0), 25.0, 0));
        player.add_cell(Cell::new(2, Vec2::new(102.0, 102.0), 25.0, 0));
        assert_eq!(player.position(), Some(Vec2::new(101.0, 101.0)));

        player.add_cell(Cell::new(3, Vec2::new(0.0, 0.0), 50.0, 0));
        let p = player.position().unwrap();
        assert!((p.x - 50.5).abs() < 1e-4);
        assert_eq!(player.largest_cell().map(|c| c.id), Some(3));
    }
}
