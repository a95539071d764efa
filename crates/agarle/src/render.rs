//! Presentation adapters. Renderers read committed state and never mutate it.

use tracing::info;

use crate::entity::Pid;
use crate::world::GameView;

pub trait Renderer: Send {
    fn render(&mut self, view: &GameView<'_>, controlled: Pid);
}

/// Logs the top of the leaderboard every `every` frames.
#[derive(Debug, Clone)]
pub struct LogRenderer {
    every: u64,
    top: usize,
    frames: u64,
}

impl LogRenderer {
    pub fn new(every: u64, top: usize) -> Self {
        Self {
            every: every.max(1),
            top,
            frames: 0,
        }
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for LogRenderer {
    fn default() -> Self {
        Self::new(25, 10)
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, view: &GameView<'_>, controlled: Pid) {
        self.frames += 1;
        if self.frames % self.every != 0 {
            return;
        }
        let state = view.state();
        let counts = state.cell_counts();
        info!(
            "Tick #{}: {} players alive, {} cells, {} pellets, {} viruses",
            view.tick(),
            counts.alive_players,
            counts.cells,
            counts.pellets,
            counts.viruses
        );
        for (rank, entry) in state.leaderboard().iter().take(self.top).enumerate() {
            let marker = if entry.pid == controlled { "*" } else { " " };
            info!("{}{:>3}. {:<12} {:>10.1}", marker, rank + 1, entry.name, entry.score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::Engine;

    #[test]
    fn logs_on_interval_only() {
        let mut engine = Engine::new(Config::with_counts(1, 1000.0, true, 5, 0, 0)).unwrap();
        let pid = engine.add_player("agent", false);
        engine.reset();

        let mut renderer = LogRenderer::new(0, 3);
        for _ in 0..4 {
            renderer.render(&engine.view(), pid);
        }
        assert_eq!(renderer.frames(), 4);
        assert_eq!(renderer.every, 1);
    }
}
