//! Collision and consumption resolution.
//!
//! Every body is snapshotted with its pre-tick mass before anything is
//! decided. Consumers are visited in ascending entity id and each body can be
//! claimed by at most one eater. Eaters that are eaten themselves forward
//! their gains to whoever ate them, so the mass removed in a tick always
//! equals the mass gained.

use std::collections::HashMap;
use std::f32::consts::TAU;

use fixedbitset::FixedBitSet;
use glam::Vec2;
use tracing::debug;

use super::Engine;
use crate::collision::{check_cell_collision, mass_to_size, virus_split_masses};
use crate::entity::{Body, Cell, EntityId, Pid, Virus};
use crate::spatial::GridItem;

#[derive(Debug, Clone, Copy, PartialEq)]
enum BodyKind {
    Pellet,
    Virus,
    Food { edible: bool },
    Cell { owner: Pid, merge_ready: bool },
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    id: EntityId,
    kind: BodyKind,
    position: Vec2,
    mass: f32,
    radius: f32,
    velocity: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Eat,
    EatFood,
    Kill,
    Merge,
    Pop,
    VirusFeed,
}

impl Engine {
    fn collect_snapshot(&self) -> Vec<Snapshot> {
        let tick = self.tick_count;
        let grace = self.config.food.grace_ticks;
        let mut bodies = Vec::with_capacity(
            self.state.pellets.len() + self.state.viruses.len() + self.state.foods.len() + 64,
        );

        for pellet in &self.state.pellets {
            bodies.push(Snapshot::of(pellet, BodyKind::Pellet, Vec2::ZERO));
        }
        for virus in &self.state.viruses {
            bodies.push(Snapshot::of(virus, BodyKind::Virus, Vec2::ZERO));
        }
        for food in &self.state.foods {
            let edible = food.is_edible(tick, grace);
            bodies.push(Snapshot::of(food, BodyKind::Food { edible }, food.velocity));
        }
        for player in self.state.players.values() {
            for cell in &player.cells {
                let kind = BodyKind::Cell {
                    owner: player.pid(),
                    merge_ready: cell.can_merge(tick),
                };
                bodies.push(Snapshot::of(cell, kind, cell.velocity));
            }
        }
        bodies.sort_unstable_by_key(|b| b.id);
        bodies
    }

    /// What `eater` does to `prey` when they overlap, if anything.
    fn outcome(&self, eater: &Snapshot, prey: &Snapshot) -> Option<Outcome> {
        let player = &self.config.player;
        let virus = &self.config.virus;
        match (eater.kind, prey.kind) {
            (BodyKind::Cell { .. }, BodyKind::Pellet) => Some(Outcome::Eat),
            (BodyKind::Cell { .. }, BodyKind::Food { edible: true }) => Some(Outcome::EatFood),
            (BodyKind::Cell { .. }, BodyKind::Virus) if eater.mass > virus.pop_mass => Some(Outcome::Pop),
            (
                BodyKind::Cell { owner: a, merge_ready: ready_a },
                BodyKind::Cell { owner: b, merge_ready: ready_b },
            ) => {
                if a == b {
                    let dominant = eater.mass > prey.mass || (eater.mass == prey.mass && eater.id < prey.id);
                    (ready_a && ready_b && dominant).then_some(Outcome::Merge)
                } else {
                    (eater.mass > prey.mass * player.eat_ratio).then_some(Outcome::Kill)
                }
            }
            (BodyKind::Virus, BodyKind::Food { edible: true }) if virus.feedable => Some(Outcome::VirusFeed),
            _ => None,
        }
    }

    /// Resolve every overlap of this tick.
    pub(super) fn resolve_collisions(&mut self) {
        let bodies = self.collect_snapshot();
        let n = bodies.len();
        if n == 0 {
            return;
        }

        self.grid.clear();
        for (slot, body) in bodies.iter().enumerate() {
            self.grid.insert(GridItem::new(slot, body.position, body.radius));
        }

        // eater[j] = i when body i consumed body j.
        let mut eater: Vec<Option<usize>> = vec![None; n];
        let mut pops: Vec<usize> = Vec::new();
        let mut feeds: Vec<(usize, usize)> = Vec::new();

        for i in 0..n {
            let a = bodies[i];
            if matches!(a.kind, BodyKind::Pellet | BodyKind::Food { .. }) {
                continue;
            }
            for j in self.grid.find_in_radius(a.position, a.radius) {
                if j == i || eater[j].is_some() {
                    continue;
                }
                let b = &bodies[j];
                if !check_cell_collision(a.position, a.radius, b.position, b.radius).is_colliding() {
                    continue;
                }
                let Some(outcome) = self.outcome(&a, b) else {
                    continue;
                };
                eater[j] = Some(i);
                match outcome {
                    Outcome::Eat => self.stats.pellets_eaten += 1,
                    Outcome::EatFood => self.stats.foods_eaten += 1,
                    Outcome::Kill => self.stats.cells_eaten += 1,
                    Outcome::Merge => {
                        self.stats.merges += 1;
                        debug!("Cell {} merged into {}", b.id, a.id);
                    }
                    Outcome::Pop => {
                        self.stats.virus_pops += 1;
                        pops.push(i);
                    }
                    Outcome::VirusFeed => {
                        self.stats.viruses_fed += 1;
                        feeds.push((i, j));
                    }
                }
            }
        }

        // Forward every eaten mass to the root of its eater chain.
        let mut gains = vec![0.0f32; n];
        let mut eaten = FixedBitSet::with_capacity(n);
        for j in 0..n {
            let Some(mut root) = eater[j] else {
                continue;
            };
            eaten.insert(j);
            let mut hops = 0;
            while let Some(next) = eater[root] {
                root = next;
                hops += 1;
                if hops > n {
                    break;
                }
            }
            gains[root] += bodies[j].mass;
        }
        if eaten.count_ones(..) == 0 {
            self.after_resolution(&[], &[]);
            return;
        }

        let slot_of: HashMap<EntityId, usize> = bodies.iter().enumerate().map(|(s, b)| (b.id, s)).collect();
        let is_eaten = |id: EntityId| slot_of.get(&id).is_some_and(|&s| eaten.contains(s));
        let gain_of = |id: EntityId| slot_of.get(&id).map_or(0.0, |&s| gains[s]);

        self.state.pellets.retain(|p| !is_eaten(p.id));
        self.state.foods.retain(|f| !is_eaten(f.id));
        self.state.viruses.retain(|v| !is_eaten(v.id));
        for virus in &mut self.state.viruses {
            virus.on_eat(gain_of(virus.id));
        }

        let border = self.state.border;
        let mut deaths: Vec<Pid> = Vec::new();
        for player in self.state.players.values_mut() {
            let had_cells = !player.is_dead();
            player.cells.retain(|c| !is_eaten(c.id));
            for cell in &mut player.cells {
                // The ceiling is enforced once every gain is in.
                let gain = gain_of(cell.id);
                if gain > 0.0 {
                    cell.set_mass(cell.mass() + gain);
                    cell.check_border(&border);
                }
            }
            if had_cells && player.is_dead() {
                deaths.push(player.pid());
            }
        }

        // Popped cells that survived the tick.
        let popped: Vec<EntityId> = pops
            .into_iter()
            .filter(|&i| !eaten.contains(i))
            .map(|i| bodies[i].id)
            .collect();
        let fed: Vec<(EntityId, Vec2)> = feeds
            .into_iter()
            .filter(|&(v, _)| !eaten.contains(v))
            .map(|(v, f)| (bodies[v].id, bodies[f].velocity))
            .collect();

        for pid in deaths {
            self.stats.deaths += 1;
            debug!("Player {} died", pid);
        }

        self.after_resolution(&popped, &fed);
    }

    /// Everything that follows consumption: pops, virus growth, the mass
    /// ceiling and the rigid push between siblings.
    fn after_resolution(&mut self, popped: &[EntityId], fed: &[(EntityId, Vec2)]) {
        for &cell_id in popped {
            self.pop_cell(cell_id);
        }
        for &(virus_id, food_velocity) in fed {
            self.grow_virus(virus_id, food_velocity);
        }
        self.enforce_mass_ceiling();
        if self.config.physics.rigid_push {
            self.push_siblings();
        }
    }

    /// Shatter a cell that ate a virus into fragments spread evenly around it.
    fn pop_cell(&mut self, cell_id: EntityId) {
        let tick = self.tick_count;
        let player_cfg = &self.config.player;
        let virus_cfg = &self.config.virus;
        let merge_tick = tick + player_cfg.merge_cooldown_ticks;
        let cap = virus_cfg.max_cells.min(player_cfg.max_cells);

        let Some(player) = self
            .state
            .players
            .values_mut()
            .find(|p| p.cells.iter().any(|c| c.id == cell_id))
        else {
            return;
        };
        let Some(idx) = player.cells.iter().position(|c| c.id == cell_id) else {
            return;
        };

        let cells_left = cap.saturating_sub(player.cells.len());
        let splits = virus_split_masses(player.cells[idx].mass(), cells_left, virus_cfg.split_div);
        let count = splits.len();
        let mut fragments = Vec::with_capacity(count);
        for (k, split_mass) in splits.into_iter().enumerate() {
            let parent = &mut player.cells[idx];
            let remaining = parent.mass() - split_mass;
            if split_mass < player_cfg.min_mass || remaining < player_cfg.min_mass {
                continue;
            }
            parent.set_mass(remaining);
            parent.merge_tick = merge_tick;

            let angle = k as f32 * TAU / count as f32;
            let dir = Vec2::from_angle(angle);
            let mut fragment = Cell::new(self.ids.next_id(), parent.position, split_mass, tick);
            fragment.velocity = dir * player_cfg.split_impulse;
            fragment.merge_tick = merge_tick;
            fragments.push(fragment);
        }
        debug!("Cell {} popped into {} fragments", cell_id, fragments.len());
        player.cells.extend(fragments);
    }

    /// Fed viruses that outgrow their limit divide, shooting the new half
    /// along the direction of the food that pushed them over.
    fn grow_virus(&mut self, virus_id: EntityId, food_velocity: Vec2) {
        let max_mass = self.config.virus.max_mass;
        let border = self.state.border;
        let Some(virus) = self.state.viruses.iter_mut().find(|v| v.id == virus_id) else {
            return;
        };
        if virus.mass() < max_mass {
            return;
        }
        let half = virus.halve();
        let dir = food_velocity.try_normalize().unwrap_or(Vec2::X);
        let offset = virus.radius() * 2.0;
        let position = border.clamp_circle(virus.position + dir * offset, mass_to_size(half));
        let id = self.ids.next_id();
        self.state.viruses.push(Virus::new(id, position, half));
        debug!("Virus {} divided, new virus {}", virus_id, id);
    }

    /// Cells above the maximum mass split while the owner has room, and are
    /// clamped otherwise.
    fn enforce_mass_ceiling(&mut self) {
        let max_mass = self.config.player.max_mass;
        let max_cells = self.config.player.max_cells;
        let merge_tick = self.tick_count + self.config.player.merge_cooldown_ticks;
        let tick = self.tick_count;

        for player in self.state.players.values_mut() {
            let mut idx = 0;
            while idx < player.cells.len() {
                while player.cells[idx].mass() > max_mass && player.cells.len() < max_cells {
                    let cell = &mut player.cells[idx];
                    let half = cell.mass() / 2.0;
                    cell.set_mass(half);
                    cell.merge_tick = merge_tick;
                    let dir = cell.velocity.try_normalize().unwrap_or(Vec2::X);
                    let mut child = Cell::new(self.ids.next_id(), cell.position, half, tick);
                    child.velocity = dir * self.config.player.split_impulse;
                    child.merge_tick = merge_tick;
                    player.cells.push(child);
                }
                let cell = &mut player.cells[idx];
                let excess = cell.mass() - max_mass;
                if excess > 0.0 {
                    cell.set_mass(max_mass);
                    self.stats.mass_clamped += excess;
                }
                idx += 1;
            }
        }
    }

    /// Push overlapping siblings that cannot merge yet apart, lighter cells
    /// moving further.
    fn push_siblings(&mut self) {
        let tick = self.tick_count;
        let border = self.state.border;

        for player in self.state.players.values_mut() {
            let len = player.cells.len();
            for i in 0..len {
                for j in (i + 1)..len {
                    let (a, b) = (&player.cells[i], &player.cells[j]);
                    if a.can_merge(tick) && b.can_merge(tick) {
                        continue;
                    }
                    let collision = check_cell_collision(a.position, a.radius(), b.position, b.radius());
                    if !collision.is_colliding() || collision.d < 0.01 {
                        continue;
                    }
                    let total_mass = a.mass() + b.mass();
                    if total_mass <= 0.0 {
                        continue;
                    }
                    let a_ratio = b.mass() / total_mass;
                    let b_ratio = a.mass() / total_mass;
                    let push = collision.delta / collision.d * collision.overlap();

                    player.cells[i].position -= push * a_ratio;
                    player.cells[i].check_border(&border);
                    player.cells[j].position += push * b_ratio;
                    player.cells[j].check_border(&border);
                }
            }
        }
    }
}

impl Snapshot {
    fn of(body: &impl Body, kind: BodyKind, velocity: Vec2) -> Self {
        Self {
            id: body.id(),
            kind,
            position: body.position(),
            mass: body.mass(),
            radius: body.radius(),
            velocity,
        }
    }
}
