//! Environment control loop: reset, action, step, observe.

use tracing::{info, warn};

use crate::action::{Action, ActionKind};
use crate::ai::{BotManager, BotPolicy, GreedyBot, bot_name};
use crate::config::Config;
use crate::engine::Engine;
use crate::entity::Pid;
use crate::error::{EnvError, Result};
use crate::observation::{Encoder, GridEncoder, GridToggles, Observation, encoder_for};
use crate::render::Renderer;
use crate::world::GameView;

/// One controlled player in an arena full of scripted bots.
pub struct Environment {
    engine: Engine,
    pid: Pid,
    encoder: Box<dyn Encoder>,
    bots: BotManager,
    renderer: Option<Box<dyn Renderer>>,
    steps: u64,
}

impl Environment {
    /// Build and reset an environment. Configuration errors surface here,
    /// before any tick runs.
    pub fn new(config: Config) -> Result<Self> {
        let mut engine = Engine::new(config)?;
        let pid = engine.add_player("agent", false);

        let seed = engine.config().env.seed;
        let mut bots = BotManager::new();
        for index in 0..engine.config().env.num_bots {
            let bot = engine.add_player(bot_name(index), true);
            let bot_seed = seed.wrapping_add(index as u64 + 1);
            bots.add_bot(bot, Box::new(GreedyBot::new(bot_seed)));
        }

        let encoder = encoder_for(&engine.config().observation);
        info!(
            "Environment ready: agent {}, {} bots, {} frames per step",
            pid,
            bots.len(),
            engine.config().env.frames_per_step
        );

        let mut env = Self {
            engine,
            pid,
            encoder,
            bots,
            renderer: None,
            steps: 0,
        };
        env.reset();
        Ok(env)
    }

    /// Fresh arena with the configured counts; the agent is alive again.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.bots.reset();
        self.steps = 0;
    }

    /// Validate and store the agent's pending action. On error the previous
    /// action stays in force.
    pub fn take_action(&mut self, dx: f32, dy: f32, kind: ActionKind) -> Result<()> {
        let action = Action::new(dx, dy, kind)?;
        self.engine.set_action(self.pid, action)
    }

    /// Run `frames_per_step` ticks. Returns the change of the agent's total
    /// mass over the step.
    pub fn step(&mut self) -> f32 {
        let before = self.agent_mass();
        for _ in 0..self.engine.config().env.frames_per_step {
            for (pid, action) in self.bots.decide_all(&self.engine.view()) {
                if let Err(err) = self.engine.set_action(pid, action) {
                    warn!("Dropping bot action: {}", err);
                }
            }
            self.engine.tick();
        }
        self.steps += 1;
        self.agent_mass() - before
    }

    /// Encode the last committed tick. Never mutates the engine.
    pub fn get_state(&self) -> Observation {
        self.encoder.encode(self.pid, self.engine.state())
    }

    /// True once the agent has no cells left.
    pub fn done(&self) -> bool {
        self.engine
            .state()
            .player(self.pid)
            .is_none_or(|p| p.is_dead())
    }

    /// Hand the committed state to the renderer, if one is attached.
    pub fn render(&mut self) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.render(&self.engine.view(), self.pid);
        }
    }

    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = Some(renderer);
    }

    /// Switch to the grid encoder with the given toggles.
    pub fn configure_observation(
        &mut self,
        grid_size: usize,
        cells: bool,
        others: bool,
        viruses: bool,
        food: bool,
    ) -> Result<()> {
        if grid_size == 0 {
            return Err(EnvError::config("grid_size must be at least 1"));
        }
        let toggles = GridToggles {
            cells,
            others,
            viruses,
            food,
        };
        self.encoder = Box::new(GridEncoder::new(grid_size, toggles));
        Ok(())
    }

    /// Replace the policy driving a bot.
    pub fn set_bot_policy(&mut self, pid: Pid, policy: Box<dyn BotPolicy>) -> Result<()> {
        if !self.bots.contains(pid) {
            return Err(EnvError::UnknownPlayer(pid));
        }
        self.bots.add_bot(pid, policy);
        Ok(())
    }

    /// The controlled player.
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn bot_pids(&self) -> Vec<Pid> {
        self.bots.pids().collect()
    }

    #[inline]
    pub fn view(&self) -> GameView<'_> {
        self.engine.view()
    }

    #[inline]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Direct engine access for scenario setup.
    #[inline]
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// External steps since the last reset.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn agent_mass(&self) -> f32 {
        self.engine
            .state()
            .player(self.pid)
            .map_or(0.0, |p| p.total_mass())
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("pid", &self.pid)
            .field("steps", &self.steps)
            .field("engine", &self.engine)
            .field("bots", &self.bots)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_fails_fast() {
        let config = Config::with_counts(4, -1.0, true, 10, 0, 0);
        assert!(matches!(Environment::new(config), Err(EnvError::Configuration(_))));
    }

    #[test]
    fn step_runs_frames_per_step_ticks() {
        let env_config = Config::with_counts(3, 1000.0, true, 20, 2, 2);
        let mut env = Environment::new(env_config).unwrap();
        assert!(!env.done());
        env.step();
        env.step();
        assert_eq!(env.engine().tick_count(), 6);
        assert_eq!(env.steps(), 2);
        assert_eq!(env.bot_pids().len(), 2);

        env.reset();
        assert_eq!(env.engine().tick_count(), 0);
    }

    #[test]
    fn grid_toggles_need_a_grid() {
        let mut env = Environment::new(Config::with_counts(1, 1000.0, true, 5, 0, 0)).unwrap();
        assert!(env.configure_observation(0, true, true, true, true).is_err());
        env.configure_observation(16, true, false, true, true).unwrap();
        let obs = env.get_state();
        assert_eq!(obs.grid().unwrap().shape(), &[5, 16, 16]);
    }
}
