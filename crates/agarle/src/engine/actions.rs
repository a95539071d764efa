//! Pending actions: steering, voluntary splits and feeding.

use glam::Vec2;
use tracing::debug;

use super::{Engine, IdAllocator};
use crate::action::ActionKind;
use crate::collision::mass_to_size;
use crate::config::Config;
use crate::entity::{Body, Cell, Food, Player};
use crate::world::WorldBorder;

impl Engine {
    /// Apply every live player's sticky action.
    pub(super) fn apply_actions(&mut self) {
        let tick = self.tick_count;
        let config = &self.config;
        let border = self.state.border;
        let drag = config.physics.drag;

        for player in self.state.players.values_mut() {
            if player.is_dead() {
                continue;
            }
            let action = player.action;
            let throttle = action.throttle();
            for cell in &mut player.cells {
                let max_speed = cell.max_speed(config.player.speed);
                cell.thrust(throttle, max_speed, drag);
            }

            match action.kind() {
                ActionKind::Move => {}
                ActionKind::Split => {
                    if cooled_down(player.last_split_tick, tick, config.player.split_cooldown_ticks) {
                        let count = split_cells(player, throttle, &mut self.ids, config, tick);
                        if count > 0 {
                            player.last_split_tick = Some(tick);
                            self.stats.splits += count as u64;
                            debug!("Player {} split {} cells", player.pid(), count);
                        }
                    }
                }
                ActionKind::Feed => {
                    if cooled_down(player.last_feed_tick, tick, config.food.cooldown_ticks) {
                        let count = eject_food(
                            player,
                            throttle,
                            &mut self.ids,
                            config,
                            tick,
                            &border,
                            &mut self.state.foods,
                        );
                        if count > 0 {
                            player.last_feed_tick = Some(tick);
                            self.stats.feeds += count as u64;
                        }
                    }
                }
            }
        }
    }
}

#[inline]
fn cooled_down(last: Option<u64>, tick: u64, cooldown: u64) -> bool {
    last.is_none_or(|t| tick.saturating_sub(t) >= cooldown)
}

/// Direction for a split or feed: the steering direction, else the way the
/// cell is already moving, else +x.
#[inline]
fn launch_direction(throttle: Vec2, cell: &Cell) -> Vec2 {
    throttle
        .try_normalize()
        .or_else(|| cell.velocity.try_normalize())
        .unwrap_or(Vec2::X)
}

/// Split every eligible cell in half. Returns how many cells were added.
pub(super) fn split_cells(
    player: &mut Player,
    throttle: Vec2,
    ids: &mut IdAllocator,
    config: &Config,
    tick: u64,
) -> usize {
    let p = &config.player;
    let merge_tick = tick + p.merge_cooldown_ticks;
    let originals = player.cells.len();
    let mut added = 0;

    for idx in 0..originals {
        if player.cells.len() >= p.max_cells {
            break;
        }
        let cell = &mut player.cells[idx];
        let mass = cell.mass();
        if mass <= p.min_split_mass {
            continue;
        }
        let half = mass / 2.0;
        if half < p.min_mass {
            continue;
        }

        let dir = launch_direction(throttle, cell);
        cell.set_mass(half);
        cell.merge_tick = merge_tick;

        let mut child = Cell::new(ids.next_id(), cell.position, half, tick);
        child.velocity = cell.velocity + dir * p.split_impulse;
        child.merge_tick = merge_tick;
        player.cells.push(child);
        added += 1;
    }
    added
}

/// Eject one food from every cell heavy enough. Returns the food count.
fn eject_food(
    player: &mut Player,
    throttle: Vec2,
    ids: &mut IdAllocator,
    config: &Config,
    tick: u64,
    border: &WorldBorder,
    foods: &mut Vec<Food>,
) -> usize {
    let food_mass = config.food.mass;
    let food_radius = mass_to_size(food_mass);
    let mut ejected = 0;

    for cell in &mut player.cells {
        let mass = cell.mass();
        if mass < config.player.min_eject_mass || mass - food_mass < config.player.min_mass {
            continue;
        }
        let dir = launch_direction(throttle, cell);
        let rim = cell.position + dir * cell.radius();
        cell.set_mass(mass - food_mass);

        let position = border.clamp_circle(rim, food_radius);
        let velocity = dir * config.food.impulse + cell.velocity;
        foods.push(Food::new(ids.next_id(), position, velocity, food_mass, tick));
        ejected += 1;
    }
    ejected
}
