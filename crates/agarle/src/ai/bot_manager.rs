use std::collections::BTreeMap;

use super::BotPolicy;
use crate::action::Action;
use crate::entity::Pid;
use crate::world::GameView;

/// Bot manager: one policy per bot-controlled player.
#[derive(Default)]
pub struct BotManager {
    bots: BTreeMap<Pid, Box<dyn BotPolicy>>,
}

impl BotManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a policy to a player, replacing any previous one.
    pub fn add_bot(&mut self, pid: Pid, policy: Box<dyn BotPolicy>) {
        self.bots.insert(pid, policy);
    }

    #[inline]
    pub fn contains(&self, pid: Pid) -> bool {
        self.bots.contains_key(&pid)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }

    /// Bot pids in ascending order.
    pub fn pids(&self) -> impl Iterator<Item = Pid> + '_ {
        self.bots.keys().copied()
    }

    /// Ask every bot with a live player for its next action, in pid order.
    pub fn decide_all(&mut self, view: &GameView<'_>) -> Vec<(Pid, Action)> {
        let mut actions = Vec::with_capacity(self.bots.len());
        for (&pid, bot) in &mut self.bots {
            if view.player(pid).is_some_and(|p| !p.is_dead()) {
                actions.push((pid, bot.decide(view, pid)));
            }
        }
        actions
    }

    pub fn reset(&mut self) {
        for bot in self.bots.values_mut() {
            bot.reset();
        }
    }
}

impl std::fmt::Debug for BotManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotManager")
            .field("bots", &self.bots.keys().collect::<Vec<_>>())
            .finish()
    }
}
