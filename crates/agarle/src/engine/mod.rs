//! Simulation engine.
//!
//! The engine exclusively owns the [`GameState`]. One call to
//! [`Engine::tick`] runs a whole tick; nothing outside the engine can observe
//! a partially applied one.

mod actions;
mod movement;
mod resolve;

use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::collision::mass_to_size;
use crate::config::Config;
use crate::entity::{Cell, EntityId, Food, Pellet, Pid, Player, Virus};
use crate::error::{EnvError, Result};
use crate::spatial::SpatialGrid;
use crate::world::{GameState, GameView, WorldBorder, random_color};

/// Player ids are unique for the lifetime of the process.
static NEXT_PID: AtomicU32 = AtomicU32::new(1);

fn next_pid() -> Pid {
    NEXT_PID.fetch_add(1, Ordering::Relaxed)
}

/// Per-episode entity id counter, shared by every entity category.
#[derive(Debug, Clone)]
pub(crate) struct IdAllocator {
    next_node_id: EntityId,
}

impl IdAllocator {
    fn new() -> Self {
        Self { next_node_id: 1 }
    }

    pub(crate) fn next_id(&mut self) -> EntityId {
        let id = self.next_node_id;
        self.next_node_id = self.next_node_id.wrapping_add(1);
        if self.next_node_id == 0 {
            self.next_node_id = 1; // Skip 0
        }
        id
    }
}

/// Counters accumulated since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    pub pellets_eaten: u64,
    pub foods_eaten: u64,
    pub cells_eaten: u64,
    pub merges: u64,
    pub virus_pops: u64,
    pub viruses_fed: u64,
    pub splits: u64,
    pub feeds: u64,
    pub deaths: u64,
    pub respawns: u64,
    /// Mass added by pellet and virus regeneration.
    pub mass_regenerated: f32,
    /// Mass added by respawning players.
    pub mass_respawned: f32,
    /// Mass removed by the max-mass ceiling.
    pub mass_clamped: f32,
}

impl TickStats {
    /// Net mass injected into the world.
    pub fn mass_injected(&self) -> f32 {
        self.mass_regenerated + self.mass_respawned - self.mass_clamped
    }

    /// Counters accumulated after `earlier` was taken.
    pub fn since(&self, earlier: &TickStats) -> TickStats {
        TickStats {
            pellets_eaten: self.pellets_eaten - earlier.pellets_eaten,
            foods_eaten: self.foods_eaten - earlier.foods_eaten,
            cells_eaten: self.cells_eaten - earlier.cells_eaten,
            merges: self.merges - earlier.merges,
            virus_pops: self.virus_pops - earlier.virus_pops,
            viruses_fed: self.viruses_fed - earlier.viruses_fed,
            splits: self.splits - earlier.splits,
            feeds: self.feeds - earlier.feeds,
            deaths: self.deaths - earlier.deaths,
            respawns: self.respawns - earlier.respawns,
            mass_regenerated: self.mass_regenerated - earlier.mass_regenerated,
            mass_respawned: self.mass_respawned - earlier.mass_respawned,
            mass_clamped: self.mass_clamped - earlier.mass_clamped,
        }
    }
}

pub struct Engine {
    config: Config,
    state: GameState,
    tick_count: u64,
    ids: IdAllocator,
    rng: StdRng,
    stats: TickStats,
    grid: SpatialGrid,
}

impl Engine {
    /// Build an engine with an empty arena. Fails on invalid configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let size = config.arena.size;
        Ok(Self {
            state: GameState::new(WorldBorder::new(size, size)),
            tick_count: 0,
            ids: IdAllocator::new(),
            rng: StdRng::seed_from_u64(config.env.seed),
            stats: TickStats::default(),
            grid: SpatialGrid::for_arena(size),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    #[inline]
    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Read-only view of the last committed tick.
    #[inline]
    pub fn view(&self) -> GameView<'_> {
        GameView::new(&self.state, &self.config, self.tick_count)
    }

    /// Register a new player. It stays dead until the next reset or spawn.
    pub fn add_player(&mut self, name: impl Into<String>, respawn: bool) -> Pid {
        let pid = next_pid();
        let mut player = Player::new(pid, name, random_color(&mut self.rng));
        player.respawn = respawn;
        self.state.players.insert(pid, player);
        pid
    }

    /// Reinitialize the arena: fresh pellets and viruses, every player
    /// respawned with one cell. Players themselves persist.
    pub fn reset(&mut self) {
        self.state.clear();
        self.tick_count = 0;
        self.ids = IdAllocator::new();
        self.rng = StdRng::seed_from_u64(self.config.env.seed);
        self.stats = TickStats::default();

        for _ in 0..self.config.pellet.count {
            self.spawn_pellet();
        }
        for _ in 0..self.config.virus.count {
            self.spawn_virus();
        }
        let pids: Vec<Pid> = self.state.players.keys().copied().collect();
        for pid in pids {
            self.spawn_at_random(pid);
        }
        // Spawning is not a mass injection once the episode starts.
        self.stats = TickStats::default();

        info!(
            "Reset arena {} (seed {}): {} pellets, {} viruses, {} players",
            self.config.arena.size,
            self.config.env.seed,
            self.state.pellets.len(),
            self.state.viruses.len(),
            self.state.players.len()
        );
    }

    /// Give a dead player a fresh starting cell at a random position.
    pub fn spawn_player(&mut self, pid: Pid) -> Result<EntityId> {
        match self.state.players.get(&pid) {
            None => Err(EnvError::UnknownPlayer(pid)),
            Some(player) if !player.is_dead() => {
                Err(EnvError::invalid_action(format!("player {pid} is alive")))
            }
            Some(_) => self.spawn_at_random(pid).ok_or(EnvError::UnknownPlayer(pid)),
        }
    }

    fn spawn_at_random(&mut self, pid: Pid) -> Option<EntityId> {
        let mass = self.config.player.start_mass;
        let position = self.state.border.random_position(&mut self.rng, mass_to_size(mass));
        let id = self.ids.next_id();
        let player = self.state.players.get_mut(&pid)?;
        player.kill();
        player.add_cell(Cell::new(id, position, mass, self.tick_count));
        Some(id)
    }

    /// Store the pending action for a player. It stays in force every tick
    /// until replaced.
    pub fn set_action(&mut self, pid: Pid, action: Action) -> Result<()> {
        let player = self
            .state
            .players
            .get_mut(&pid)
            .ok_or(EnvError::UnknownPlayer(pid))?;
        player.action = action;
        Ok(())
    }

    /// Advance the simulation by one tick. Returns what happened during it.
    pub fn tick(&mut self) -> TickStats {
        let before = self.stats;
        self.tick_count += 1;

        if self.config.env.bot_respawn {
            self.process_respawns();
        }
        self.apply_actions();
        self.move_bodies();
        self.resolve_collisions();
        self.regenerate();

        if cfg!(debug_assertions) {
            if let Err(err) = self.state.check_invariants() {
                panic!("tick {}: {err}", self.tick_count);
            }
        }

        let interval = self.config.env.log_interval_ticks;
        if interval > 0 && self.tick_count % interval == 0 {
            let counts = self.state.cell_counts();
            debug!(
                "Tick #{}: {} cells, {} pellets, {} viruses, {} foods, {} players alive, total mass {:.1}",
                self.tick_count,
                counts.cells,
                counts.pellets,
                counts.viruses,
                counts.foods,
                counts.alive_players,
                self.state.total_mass()
            );
        }
        self.stats.since(&before)
    }

    fn process_respawns(&mut self) {
        let respawn_list: Vec<Pid> = self
            .state
            .players
            .values()
            .filter(|p| p.respawn && p.is_dead())
            .map(Player::pid)
            .collect();
        for pid in respawn_list {
            match self.spawn_player(pid) {
                Ok(cell_id) => {
                    self.stats.respawns += 1;
                    self.stats.mass_respawned += self.config.player.start_mass;
                    debug!("Player {} respawned with cell {}", pid, cell_id);
                }
                Err(err) => warn!("Respawn of player {} failed: {}", pid, err),
            }
        }
    }

    /// Top pellets and viruses back up to their configured counts.
    fn regenerate(&mut self) {
        if self.config.pellet.regen {
            while self.state.pellets.len() < self.config.pellet.count {
                self.spawn_pellet();
                self.stats.mass_regenerated += self.config.pellet.mass;
            }
        }
        if self.config.virus.regen {
            while self.state.viruses.len() < self.config.virus.count {
                self.spawn_virus();
                self.stats.mass_regenerated += self.config.virus.mass;
            }
        }
    }

    fn spawn_pellet(&mut self) {
        let mass = self.config.pellet.mass;
        let position = self.state.border.random_position(&mut self.rng, mass_to_size(mass));
        let id = self.ids.next_id();
        self.state.pellets.push(Pellet::new(id, position, mass));
    }

    fn spawn_virus(&mut self) {
        let mass = self.config.virus.mass;
        let position = self.state.border.random_position(&mut self.rng, mass_to_size(mass));
        let id = self.ids.next_id();
        self.state.viruses.push(Virus::new(id, position, mass));
    }

    // Scenario helpers. These bypass spawning rules but keep every
    // invariant: ids come from the allocator and positions are clamped.

    /// Remove every pellet, virus and food, and kill every player.
    pub fn clear_world(&mut self) {
        self.state.clear();
    }

    pub fn add_pellet(&mut self, position: Vec2, mass: f32) -> EntityId {
        let id = self.ids.next_id();
        let position = self.state.border.clamp_circle(position, mass_to_size(mass));
        self.state.pellets.push(Pellet::new(id, position, mass));
        id
    }

    pub fn add_virus(&mut self, position: Vec2, mass: f32) -> EntityId {
        let id = self.ids.next_id();
        let position = self.state.border.clamp_circle(position, mass_to_size(mass));
        self.state.viruses.push(Virus::new(id, position, mass));
        id
    }

    pub fn add_food(&mut self, position: Vec2, velocity: Vec2, mass: f32) -> EntityId {
        let id = self.ids.next_id();
        let position = self.state.border.clamp_circle(position, mass_to_size(mass));
        self.state
            .foods
            .push(Food::new(id, position, velocity, mass, self.tick_count));
        id
    }

    /// Add a cell with the given mass to a player, alive or dead.
    pub fn spawn_cell(&mut self, pid: Pid, position: Vec2, mass: f32) -> Result<EntityId> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(EnvError::invalid_action(format!("cell mass must be positive, got {mass}")));
        }
        if !self.state.players.contains_key(&pid) {
            return Err(EnvError::UnknownPlayer(pid));
        }
        let id = self.ids.next_id();
        let position = self.state.border.clamp_circle(position, mass_to_size(mass));
        let cell = Cell::new(id, position, mass, self.tick_count);
        if let Some(player) = self.state.players.get_mut(&pid) {
            player.add_cell(cell);
        }
        Ok(id)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("tick_count", &self.tick_count)
            .field("players", &self.state.players.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::entity::Body;

    /// Empty arena, no regeneration, nothing random left in the world.
    fn quiet_config() -> Config {
        let mut config = Config::with_counts(1, 1000.0, false, 0, 0, 0);
        config.virus.regen = false;
        config.env.bot_respawn = false;
        config
    }

    fn engine_with_player(config: Config) -> (Engine, Pid) {
        let mut engine = Engine::new(config).unwrap();
        let pid = engine.add_player("agent", false);
        engine.reset();
        engine.clear_world();
        (engine, pid)
    }

    #[test]
    fn rejects_bad_config() {
        let mut config = quiet_config();
        config.arena.size = 0.0;
        assert!(matches!(Engine::new(config), Err(EnvError::Configuration(_))));
    }

    #[test]
    fn ids_skip_zero() {
        let mut ids = IdAllocator { next_node_id: u32::MAX };
        assert_eq!(ids.next_id(), u32::MAX);
        assert_eq!(ids.next_id(), 1);
    }

    #[test]
    fn reset_populates_arena() {
        let config = Config::with_counts(4, 1000.0, true, 50, 5, 0);
        let mut engine = Engine::new(config).unwrap();
        let pid = engine.add_player("agent", false);
        engine.reset();
        assert_eq!(engine.state().pellets().len(), 50);
        assert_eq!(engine.state().viruses().len(), 5);
        assert!(!engine.state().player(pid).unwrap().is_dead());
        assert_eq!(engine.tick_count(), 0);
        engine.state().check_invariants().unwrap();
    }

    #[test]
    fn pellet_under_cell_is_eaten() {
        let (mut engine, pid) = engine_with_player(quiet_config());
        engine.spawn_cell(pid, Vec2::new(500.0, 500.0), 10.0).unwrap();
        engine.add_pellet(Vec2::new(500.0, 500.0), 1.0);

        let stats = engine.tick();
        let player = engine.state().player(pid).unwrap();
        assert_eq!(player.cells()[0].mass(), 11.0);
        assert!(engine.state().pellets().is_empty());
        assert_eq!(stats.pellets_eaten, 1);
        assert_eq!(engine.tick().pellets_eaten, 0);
        assert_eq!(engine.stats().pellets_eaten, 1);
    }

    #[test]
    fn eaten_pellet_regenerates_immediately() {
        let mut config = quiet_config();
        config.pellet.count = 1;
        config.pellet.regen = true;
        let (mut engine, pid) = engine_with_player(config);
        engine.spawn_cell(pid, Vec2::new(500.0, 500.0), 10.0).unwrap();
        engine.add_pellet(Vec2::new(500.0, 500.0), 1.0);

        engine.tick();
        assert_eq!(engine.state().pellets().len(), 1);
        assert_eq!(engine.stats().mass_regenerated, 1.0);
    }

    #[test]
    fn merge_waits_for_cooldown() {
        let mut config = quiet_config();
        config.physics.rigid_push = false;
        config.player.merge_cooldown_ticks = 20;
        let (mut engine, pid) = engine_with_player(config);
        engine.spawn_cell(pid, Vec2::new(500.0, 500.0), 400.0).unwrap();

        engine.set_action(pid, Action::new(1.0, 0.0, ActionKind::Split).unwrap()).unwrap();
        engine.tick();
        engine.set_action(pid, Action::idle()).unwrap();
        assert_eq!(engine.state().player(pid).unwrap().cells().len(), 2);

        // Halves of radius ~141 drift about 120 apart: still overlapping.
        for _ in 1..20 {
            engine.tick();
            assert_eq!(engine.state().player(pid).unwrap().cells().len(), 2);
        }
        engine.tick();
        let player = engine.state().player(pid).unwrap();
        assert_eq!(player.cells().len(), 1);
        assert!((player.total_mass() - 400.0).abs() < 1e-3);
        assert_eq!(engine.stats().merges, 1);
    }

    #[test]
    fn bigger_cell_eats_smaller_enemy() {
        let (mut engine, pid) = engine_with_player(quiet_config());
        let prey = engine.add_player("prey", false);
        engine.spawn_cell(pid, Vec2::new(500.0, 500.0), 100.0).unwrap();
        engine.spawn_cell(prey, Vec2::new(520.0, 500.0), 50.0).unwrap();

        engine.tick();
        assert!(engine.state().player(prey).unwrap().is_dead());
        assert_eq!(engine.state().player(pid).unwrap().total_mass(), 150.0);
        assert_eq!(engine.stats().deaths, 1);
    }

    #[test]
    fn similar_cells_ignore_each_other() {
        let (mut engine, pid) = engine_with_player(quiet_config());
        let other = engine.add_player("other", false);
        engine.spawn_cell(pid, Vec2::new(500.0, 500.0), 100.0).unwrap();
        engine.spawn_cell(other, Vec2::new(520.0, 500.0), 90.0).unwrap();

        engine.tick();
        assert_eq!(engine.state().player(pid).unwrap().total_mass(), 100.0);
        assert_eq!(engine.state().player(other).unwrap().total_mass(), 90.0);
    }

    #[test]
    fn virus_pops_heavy_cell() {
        let (mut engine, pid) = engine_with_player(quiet_config());
        engine.spawn_cell(pid, Vec2::new(500.0, 500.0), 400.0).unwrap();
        engine.add_virus(Vec2::new(510.0, 500.0), 100.0);

        engine.tick();
        let player = engine.state().player(pid).unwrap();
        assert!(player.cells().len() > 1);
        assert!(player.cells().len() <= engine.config().virus.max_cells);
        assert!((player.total_mass() - 500.0).abs() < 1e-2);
        assert!(engine.state().viruses().is_empty());
        assert_eq!(engine.stats().virus_pops, 1);
    }

    #[test]
    fn light_cell_passes_virus() {
        let (mut engine, pid) = engine_with_player(quiet_config());
        engine.spawn_cell(pid, Vec2::new(500.0, 500.0), 50.0).unwrap();
        engine.add_virus(Vec2::new(510.0, 500.0), 100.0);

        engine.tick();
        assert_eq!(engine.state().player(pid).unwrap().cells().len(), 1);
        assert_eq!(engine.state().viruses().len(), 1);
    }

    #[test]
    fn feed_conserves_mass() {
        let (mut engine, pid) = engine_with_player(quiet_config());
        engine.spawn_cell(pid, Vec2::new(500.0, 500.0), 100.0).unwrap();
        let before = engine.state().total_mass();

        engine.set_action(pid, Action::new(1.0, 0.0, ActionKind::Feed).unwrap()).unwrap();
        engine.tick();
        assert_eq!(engine.state().foods().len(), 1);
        assert_eq!(engine.state().player(pid).unwrap().total_mass(), 87.0);
        assert!((engine.state().total_mass() - before).abs() < 1e-3);
    }

    #[test]
    fn unknown_player_is_reported() {
        let (mut engine, _) = engine_with_player(quiet_config());
        assert_eq!(engine.set_action(0, Action::idle()), Err(EnvError::UnknownPlayer(0)));
        assert!(engine.spawn_cell(0, Vec2::ZERO, 10.0).is_err());
    }

    #[test]
    fn spawn_player_only_revives_the_dead() {
        let (mut engine, pid) = engine_with_player(quiet_config());
        assert_eq!(engine.spawn_player(0), Err(EnvError::UnknownPlayer(0)));

        let id = engine.spawn_player(pid).unwrap();
        let player = engine.state().player(pid).unwrap();
        assert_eq!(player.cells().len(), 1);
        assert_eq!(player.cells()[0].id, id);
        assert_eq!(player.total_mass(), engine.config().player.start_mass);

        assert!(matches!(engine.spawn_player(pid), Err(EnvError::InvalidAction { .. })));
        assert_eq!(engine.state().player(pid).unwrap().cells().len(), 1);
    }

    #[test]
    fn respawn_brings_bots_back() {
        let mut config = quiet_config();
        config.env.bot_respawn = true;
        let mut engine = Engine::new(config).unwrap();
        let bot = engine.add_player("bot", true);
        let agent = engine.add_player("agent", false);
        engine.reset();
        engine.clear_world();

        engine.tick();
        assert!(!engine.state().player(bot).unwrap().is_dead());
        assert!(engine.state().player(agent).unwrap().is_dead());
        assert_eq!(engine.stats().respawns, 1);
        assert_eq!(engine.stats().mass_respawned, engine.config().player.start_mass);
    }
}
