//! Scripted opponents.
//!
//! Policies only ever see a [`GameView`]; the environment turns their
//! decisions into pending actions before each tick.

mod bot_manager;
mod bot_player;

pub use bot_manager::BotManager;
pub use bot_player::{GreedyBot, bot_name};

use crate::action::Action;
use crate::entity::Pid;
use crate::world::GameView;

/// A decision strategy for one player.
pub trait BotPolicy: Send {
    /// Pick the action for `pid` given the last committed tick.
    fn decide(&mut self, view: &GameView<'_>, pid: Pid) -> Action;

    /// Forget per-episode memory.
    fn reset(&mut self) {}
}

/// Never moves.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleBot;

impl BotPolicy for IdleBot {
    fn decide(&mut self, _view: &GameView<'_>, _pid: Pid) -> Action {
        Action::idle()
    }
}
