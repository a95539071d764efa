use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::BotPolicy;
use crate::action::{Action, ActionKind};
use crate::entity::{Body, EntityId, Pid};
use crate::world::GameView;

/// Bot names to use.
const BOT_NAMES: &[&str] = &[
    "Bot", "Hunter", "Hungry", "Nomnom", "Blob", "Cell", "Eater", "Seeker",
    "Roamer", "Wanderer", "Ghost", "Shadow", "Swift", "Tiny", "Big", "Mega",
];

/// Display name for the `index`-th bot.
pub fn bot_name(index: usize) -> String {
    format!("{}{}", BOT_NAMES[index % BOT_NAMES.len()], index % 100)
}

/// Influence-field bot: drawn to pellets, food and smaller cells, pushed away
/// from bigger cells and from viruses it would pop on. Splits to catch prey
/// inside split range.
#[derive(Debug, Clone)]
pub struct GreedyBot {
    seed: u64,
    rng: StdRng,
    /// Current target position.
    target: Vec2,
    /// Ticks until next decision.
    decision_cooldown: u32,
    split_cooldown: u32,
    /// Ticks to pursue a split target.
    target_pursuit: u32,
    split_target: Option<EntityId>,
}

impl GreedyBot {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            target: Vec2::ZERO,
            decision_cooldown: 0,
            split_cooldown: 0,
            target_pursuit: 0,
            split_target: None,
        }
    }

    fn steer(&self, from: Vec2, kind: ActionKind) -> Action {
        Action::toward((self.target - from).normalize_or_zero(), kind)
    }
}

impl BotPolicy for GreedyBot {
    fn decide(&mut self, view: &GameView<'_>, pid: Pid) -> Action {
        let Some(me) = view.player(pid) else {
            return Action::idle();
        };
        let Some(largest) = me.largest_cell() else {
            return Action::idle();
        };
        let config = view.config();
        let eat_ratio = config.player.eat_ratio;

        self.split_cooldown = self.split_cooldown.saturating_sub(1);
        self.decision_cooldown = self.decision_cooldown.saturating_sub(1);

        let my_pos = largest.position;
        let my_mass = largest.mass();
        let my_size = largest.radius();

        // Pursue split target
        if let Some(target_id) = self.split_target {
            let target = view
                .players()
                .filter(|p| p.pid() != pid)
                .flat_map(|p| p.cells())
                .find(|c| c.id == target_id);
            if let Some(cell) = target {
                if self.target_pursuit > 0 {
                    self.target_pursuit -= 1;
                    self.target = cell.position;
                    return self.steer(my_pos, ActionKind::Move);
                }
            }
            self.split_target = None;
            self.target_pursuit = 0;
        }

        if self.decision_cooldown > 0 {
            return self.steer(my_pos, ActionKind::Move);
        }
        self.decision_cooldown = 2;

        let search_radius: f32 = 2000.0;
        let in_view = |p: Vec2| (p - my_pos).length_squared() <= search_radius * search_radius;
        let mut result = Vec2::ZERO;
        let mut add = |position: Vec2, size: f32, mut influence: f32| {
            let displacement = position - my_pos;
            let mut dist = displacement.length();
            if influence < 0.0 {
                dist -= my_size + size;
            }
            influence /= dist.max(1.0);
            result += displacement.normalize_or_zero() * influence;
        };

        for pellet in view.pellets().iter().filter(|p| in_view(p.position)) {
            add(pellet.position, pellet.radius(), 1.0);
        }
        let grace = config.food.grace_ticks;
        for food in view.foods().iter().filter(|f| in_view(f.position)) {
            if food.is_edible(view.tick(), grace) && my_mass > food.mass * eat_ratio {
                add(food.position, food.radius(), 2.0);
            }
        }
        for virus in view.viruses().iter().filter(|v| in_view(v.position)) {
            // Avoid popping on a virus; small cells can hide behind one.
            if my_mass > config.virus.pop_mass {
                add(virus.position, virus.radius(), -100.0);
            }
        }

        let others: Vec<_> = view
            .players()
            .filter(|p| p.pid() != pid)
            .flat_map(|p| p.cells())
            .filter(|c| in_view(c.position))
            .collect();
        let num_view_nodes = (others.len() + view.pellets().len()).max(1) as f32;
        let split_distance = config.player.split_impulse * config.physics.tick_seconds / (1.0 - config.physics.drag);
        let can_split = (me.cells().len() as f32 * 1.5) < 9.0
            && self.split_cooldown == 0
            && me.cells().len() < config.player.max_cells;

        let mut prey: Option<(EntityId, f32, Vec2)> = None;
        for cell in others {
            let (check_mass, check_size) = (cell.mass(), cell.radius());
            let influence = if my_mass > check_mass * eat_ratio {
                check_size / num_view_nodes.ln().max(1.0)
            } else if check_mass > my_mass * eat_ratio {
                -(check_size / my_size).ln()
            } else {
                -check_size / my_size
            };
            add(cell.position, check_size, influence);

            // A half-mass cell must still be able to eat the prey.
            if can_split && my_mass / 2.0 > check_mass * eat_ratio && my_mass * 0.1 < check_mass {
                let dist = (cell.position - my_pos).length() - my_size;
                let reach = (1.3 * split_distance).max(my_size / std::f32::consts::SQRT_2 * 4.5);
                if reach >= dist && prey.is_none_or(|(_, m, _)| check_mass > m) {
                    prey = Some((cell.id, check_mass, cell.position));
                }
            }
        }

        let border = view.border();
        if let Some((id, mass, position)) = prey {
            debug!("Bot {} targeting prey {} (mass {}) for split", pid, id, mass);
            self.target = position;
            self.split_target = Some(id);
            self.target_pursuit = 20;
            self.split_cooldown = 15;
            return self.steer(my_pos, ActionKind::Split);
        }

        if let Some(dir) = result.try_normalize() {
            self.target = my_pos + dir * 2000.0;
        } else {
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            self.target = my_pos + Vec2::from_angle(angle) * 400.0;
        }
        self.target.x = self.target.x.clamp(border.min_x, border.max_x);
        self.target.y = self.target.y.clamp(border.min_y, border.max_y);
        self.steer(my_pos, ActionKind::Move)
    }

    fn reset(&mut self) {
        *self = Self::new(self.seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::Engine;

    fn empty_engine() -> Engine {
        let mut config = Config::with_counts(1, 1000.0, false, 0, 0, 0);
        config.virus.regen = false;
        config.env.bot_respawn = false;
        Engine::new(config).unwrap()
    }

    #[test]
    fn heads_for_pellets() {
        let mut engine = empty_engine();
        let pid = engine.add_player("bot", false);
        engine.reset();
        engine.clear_world();
        engine.spawn_cell(pid, Vec2::new(500.0, 500.0), 10.0).unwrap();
        engine.add_pellet(Vec2::new(800.0, 500.0), 1.0);

        let mut bot = GreedyBot::new(1);
        let action = bot.decide(&engine.view(), pid);
        assert_eq!(action.kind(), ActionKind::Move);
        assert!(action.direction().x > 0.99);
    }

    #[test]
    fn runs_from_bigger_cells() {
        let mut engine = empty_engine();
        let pid = engine.add_player("bot", false);
        let big = engine.add_player("big", false);
        engine.reset();
        engine.clear_world();
        engine.spawn_cell(pid, Vec2::new(500.0, 500.0), 10.0).unwrap();
        engine.spawn_cell(big, Vec2::new(300.0, 500.0), 400.0).unwrap();

        let mut bot = GreedyBot::new(1);
        let action = bot.decide(&engine.view(), pid);
        assert!(action.direction().x > 0.0);
    }

    #[test]
    fn splits_on_prey_in_range() {
        let mut engine = empty_engine();
        let pid = engine.add_player("bot", false);
        let prey = engine.add_player("prey", false);
        engine.reset();
        engine.clear_world();
        engine.spawn_cell(pid, Vec2::new(400.0, 500.0), 400.0).unwrap();
        engine.spawn_cell(prey, Vec2::new(700.0, 500.0), 100.0).unwrap();

        let mut bot = GreedyBot::new(1);
        let action = bot.decide(&engine.view(), pid);
        assert_eq!(action.kind(), ActionKind::Split);
        assert!(action.direction().x > 0.99);
    }

    #[test]
    fn wandering_is_reproducible() {
        let mut engine = empty_engine();
        let pid = engine.add_player("bot", false);
        engine.reset();
        engine.clear_world();
        engine.spawn_cell(pid, Vec2::new(500.0, 500.0), 10.0).unwrap();

        let mut a = GreedyBot::new(9);
        let mut b = GreedyBot::new(9);
        for _ in 0..10 {
            assert_eq!(a.decide(&engine.view(), pid), b.decide(&engine.view(), pid));
        }
        a.reset();
        let mut c = GreedyBot::new(9);
        assert_eq!(a.decide(&engine.view(), pid), c.decide(&engine.view(), pid));
    }

    #[test]
    fn names_cycle() {
        assert_eq!(bot_name(0), "Bot0");
        assert_eq!(bot_name(17), "Hunter17");
    }
}
