//! Movement integration.

use super::Engine;

impl Engine {
    /// Move every cell and drifting food, then clamp them to the arena.
    pub(super) fn move_bodies(&mut self) {
        let dt = self.config.physics.tick_seconds;
        let drag = self.config.physics.drag;
        let border = self.state.border;

        for player in self.state.players.values_mut() {
            for cell in &mut player.cells {
                cell.advance(dt, drag);
                cell.check_border(&border);
            }
        }

        let food_drag = self.config.food.drag;
        for food in &mut self.state.foods {
            food.drift(dt, food_drag, &border);
        }
    }
}
