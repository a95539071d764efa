//! Environment configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EnvError, Result};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub env: EnvConfig,
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub pellet: PelletConfig,
    #[serde(default)]
    pub virus: VirusConfig,
    #[serde(default)]
    pub food: FoodConfig,
    #[serde(default)]
    pub observation: ObservationConfig,
}

impl Config {
    /// Load configuration from `path`, writing the defaults there if the file is missing.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&contents)?;
            Ok(config)
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    /// Parse configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with the six classic environment constructor arguments applied.
    pub fn with_counts(
        frames_per_step: u32,
        arena_size: f32,
        pellet_regen: bool,
        num_pellets: usize,
        num_viruses: usize,
        num_bots: usize,
    ) -> Self {
        let mut config = Self::default();
        config.env.frames_per_step = frames_per_step;
        config.arena.size = arena_size;
        config.pellet.regen = pellet_regen;
        config.pellet.count = num_pellets;
        config.virus.count = num_viruses;
        config.env.num_bots = num_bots;
        config
    }

    /// Reject nonsensical parameters before any tick runs.
    pub fn validate(&self) -> Result<()> {
        if !self.arena.size.is_finite() || self.arena.size <= 0.0 {
            return Err(EnvError::config(format!("arena size must be positive, got {}", self.arena.size)));
        }
        if self.env.frames_per_step == 0 {
            return Err(EnvError::config("frames_per_step must be at least 1"));
        }
        if !(self.physics.tick_seconds > 0.0) || !self.physics.tick_seconds.is_finite() {
            return Err(EnvError::config("tick_seconds must be positive"));
        }
        if !(0.0..1.0).contains(&self.physics.drag) {
            return Err(EnvError::config(format!("drag must be in [0, 1), got {}", self.physics.drag)));
        }
        if !(0.0..1.0).contains(&self.food.drag) {
            return Err(EnvError::config(format!("food drag must be in [0, 1), got {}", self.food.drag)));
        }

        let p = &self.player;
        for (name, value) in [
            ("player.start_mass", p.start_mass),
            ("player.min_mass", p.min_mass),
            ("player.max_mass", p.max_mass),
            ("player.min_split_mass", p.min_split_mass),
            ("player.min_eject_mass", p.min_eject_mass),
            ("pellet.mass", self.pellet.mass),
            ("virus.mass", self.virus.mass),
            ("virus.max_mass", self.virus.max_mass),
            ("virus.split_div", self.virus.split_div),
            ("food.mass", self.food.mass),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EnvError::config(format!("{name} must be positive, got {value}")));
            }
        }
        if !p.speed.is_finite() || p.speed < 0.0 {
            return Err(EnvError::config("player.speed must be non-negative"));
        }
        if p.start_mass > p.max_mass {
            return Err(EnvError::config("player.start_mass exceeds player.max_mass"));
        }
        if p.min_mass > p.start_mass {
            return Err(EnvError::config("player.min_mass exceeds player.start_mass"));
        }
        if p.max_cells == 0 {
            return Err(EnvError::config("player.max_cells must be at least 1"));
        }
        if !p.eat_ratio.is_finite() || p.eat_ratio < 1.0 {
            return Err(EnvError::config(format!("player.eat_ratio must be >= 1, got {}", p.eat_ratio)));
        }
        if self.virus.mass > self.virus.max_mass {
            return Err(EnvError::config("virus.mass exceeds virus.max_mass"));
        }
        if self.observation.grid_size == 0 {
            return Err(EnvError::config("observation.grid_size must be at least 1"));
        }
        Ok(())
    }
}

/// Episode-level settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EnvConfig {
    /// Engine ticks per external `step`.
    #[serde(default = "default_frames_per_step")]
    pub frames_per_step: u32,
    /// Seed for every random draw of an episode.
    #[serde(default)]
    pub seed: u64,
    /// Number of scripted opponents.
    #[serde(default = "default_num_bots")]
    pub num_bots: usize,
    /// Whether dead bots come back on the next tick.
    #[serde(default = "default_true")]
    pub bot_respawn: bool,
    /// Ticks between debug tick summaries.
    #[serde(default = "default_log_interval")]
    pub log_interval_ticks: u64,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            frames_per_step: default_frames_per_step(),
            seed: 0,
            num_bots: default_num_bots(),
            bot_respawn: true,
            log_interval_ticks: default_log_interval(),
        }
    }
}

fn default_frames_per_step() -> u32 {
    4
}
fn default_num_bots() -> usize {
    25
}
fn default_log_interval() -> u64 {
    400
}
fn default_true() -> bool {
    true
}

/// Arena bounds. The arena spans `[0, size]` on both axes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArenaConfig {
    #[serde(default = "default_arena_size")]
    pub size: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            size: default_arena_size(),
        }
    }
}

fn default_arena_size() -> f32 {
    1000.0
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PhysicsConfig {
    /// Simulated seconds per tick.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f32,
    /// Fraction of cell velocity retained after each tick.
    #[serde(default = "default_drag")]
    pub drag: f32,
    /// Push apart same-owner cells that cannot merge yet.
    #[serde(default = "default_true")]
    pub rigid_push: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            drag: default_drag(),
            rigid_push: true,
        }
    }
}

fn default_tick_seconds() -> f32 {
    0.04
}
fn default_drag() -> f32 {
    0.9
}

/// Player cell configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_start_mass")]
    pub start_mass: f32,
    /// Smallest mass a split fragment may have.
    #[serde(default = "default_player_min_mass")]
    pub min_mass: f32,
    #[serde(default = "default_player_max_mass")]
    pub max_mass: f32,
    /// Cells must be strictly heavier than this to split.
    #[serde(default = "default_player_min_split_mass")]
    pub min_split_mass: f32,
    #[serde(default = "default_player_min_eject_mass")]
    pub min_eject_mass: f32,
    #[serde(default = "default_player_max_cells")]
    pub max_cells: usize,
    /// Speed scale; actual speed falls off with cell size.
    #[serde(default = "default_player_speed")]
    pub speed: f32,
    /// Velocity given to a freshly split cell.
    #[serde(default = "default_player_split_impulse")]
    pub split_impulse: f32,
    #[serde(default = "default_player_split_cooldown")]
    pub split_cooldown_ticks: u64,
    #[serde(default = "default_player_merge_cooldown")]
    pub merge_cooldown_ticks: u64,
    /// A cell eats a foreign cell when its mass exceeds the other's by this factor.
    #[serde(default = "default_player_eat_ratio")]
    pub eat_ratio: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_mass: default_player_start_mass(),
            min_mass: default_player_min_mass(),
            max_mass: default_player_max_mass(),
            min_split_mass: default_player_min_split_mass(),
            min_eject_mass: default_player_min_eject_mass(),
            max_cells: default_player_max_cells(),
            speed: default_player_speed(),
            split_impulse: default_player_split_impulse(),
            split_cooldown_ticks: default_player_split_cooldown(),
            merge_cooldown_ticks: default_player_merge_cooldown(),
            eat_ratio: default_player_eat_ratio(),
        }
    }
}

fn default_player_start_mass() -> f32 {
    10.0
}
fn default_player_min_mass() -> f32 {
    9.0
}
fn default_player_max_mass() -> f32 {
    22500.0
}
fn default_player_min_split_mass() -> f32 {
    36.0
}
fn default_player_min_eject_mass() -> f32 {
    36.0
}
fn default_player_max_cells() -> usize {
    16
}
fn default_player_speed() -> f32 {
    600.0
}
fn default_player_split_impulse() -> f32 {
    300.0
}
fn default_player_split_cooldown() -> u64 {
    10
}
fn default_player_merge_cooldown() -> u64 {
    250
}
fn default_player_eat_ratio() -> f32 {
    // 1.15 on cell size, squared for mass.
    1.3225
}

/// Pellet configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PelletConfig {
    #[serde(default = "default_pellet_count")]
    pub count: usize,
    #[serde(default = "default_pellet_mass")]
    pub mass: f32,
    #[serde(default = "default_true")]
    pub regen: bool,
}

impl Default for PelletConfig {
    fn default() -> Self {
        Self {
            count: default_pellet_count(),
            mass: default_pellet_mass(),
            regen: true,
        }
    }
}

fn default_pellet_count() -> usize {
    1000
}
fn default_pellet_mass() -> f32 {
    1.0
}

/// Virus configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VirusConfig {
    #[serde(default = "default_virus_count")]
    pub count: usize,
    #[serde(default = "default_virus_mass")]
    pub mass: f32,
    /// Cells heavier than this pop on contact; lighter cells pass by.
    #[serde(default = "default_virus_pop_mass")]
    pub pop_mass: f32,
    /// A fed virus divides once it reaches this mass.
    #[serde(default = "default_virus_max_mass")]
    pub max_mass: f32,
    /// Maximum total cells a player can have after a virus pop.
    #[serde(default = "default_virus_max_cells")]
    pub max_cells: usize,
    /// Minimum mass per fragment when a virus pops a cell.
    #[serde(default = "default_virus_split_div")]
    pub split_div: f32,
    #[serde(default = "default_true")]
    pub regen: bool,
    /// Allow viruses to absorb ejected food.
    #[serde(default = "default_true")]
    pub feedable: bool,
}

impl Default for VirusConfig {
    fn default() -> Self {
        Self {
            count: default_virus_count(),
            mass: default_virus_mass(),
            pop_mass: default_virus_pop_mass(),
            max_mass: default_virus_max_mass(),
            max_cells: default_virus_max_cells(),
            split_div: default_virus_split_div(),
            regen: true,
            feedable: true,
        }
    }
}

fn default_virus_count() -> usize {
    25
}
fn default_virus_mass() -> f32 {
    100.0
}
fn default_virus_pop_mass() -> f32 {
    100.0
}
fn default_virus_max_mass() -> f32 {
    200.0
}
fn default_virus_max_cells() -> usize {
    12
}
fn default_virus_split_div() -> f32 {
    36.0
}

/// Ejected food configuration (FEED action).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FoodConfig {
    /// Mass moved from the cell into each emitted food.
    #[serde(default = "default_food_mass")]
    pub mass: f32,
    #[serde(default = "default_food_impulse")]
    pub impulse: f32,
    #[serde(default = "default_drag")]
    pub drag: f32,
    /// Ticks after emission during which food cannot be eaten.
    #[serde(default = "default_food_grace")]
    pub grace_ticks: u64,
    #[serde(default = "default_food_cooldown")]
    pub cooldown_ticks: u64,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            mass: default_food_mass(),
            impulse: default_food_impulse(),
            drag: default_drag(),
            grace_ticks: default_food_grace(),
            cooldown_ticks: default_food_cooldown(),
        }
    }
}

fn default_food_mass() -> f32 {
    13.0
}
fn default_food_impulse() -> f32 {
    400.0
}
fn default_food_grace() -> u64 {
    2
}
fn default_food_cooldown() -> u64 {
    2
}

/// Which observation encoder an environment uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationKind {
    #[default]
    Full,
    Grid,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservationConfig {
    #[serde(default)]
    pub kind: ObservationKind,
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    #[serde(default = "default_true")]
    pub observe_cells: bool,
    #[serde(default = "default_true")]
    pub observe_others: bool,
    #[serde(default = "default_true")]
    pub observe_viruses: bool,
    #[serde(default = "default_true")]
    pub observe_food: bool,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            kind: ObservationKind::Full,
            grid_size: default_grid_size(),
            observe_cells: true,
            observe_others: true,
            observe_viruses: true,
            observe_food: true,
        }
    }
}

fn default_grid_size() -> usize {
    128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn default_survives_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed = Config::from_toml_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed = Config::from_toml_str(
            "[env]\nframes_per_step = 2\n\n[observation]\nkind = \"grid\"\ngrid_size = 32\n",
        )
        .unwrap();
        assert_eq!(parsed.env.frames_per_step, 2);
        assert_eq!(parsed.observation.kind, ObservationKind::Grid);
        assert_eq!(parsed.observation.grid_size, 32);
        assert_eq!(parsed.pellet, PelletConfig::default());
    }

    #[test]
    fn zero_arena_rejected() {
        let config = Config::with_counts(4, 0.0, true, 10, 0, 0);
        assert!(matches!(config.validate(), Err(EnvError::Configuration(_))));
    }

    #[test]
    fn zero_frames_rejected() {
        let config = Config::with_counts(0, 1000.0, true, 10, 0, 0);
        assert!(matches!(config.validate(), Err(EnvError::Configuration(_))));
    }

    #[test]
    fn eat_ratio_below_one_rejected() {
        let mut config = Config::default();
        config.player.eat_ratio = 0.5;
        assert!(config.validate().is_err());
    }
}
