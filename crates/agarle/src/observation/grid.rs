//! Grid encoder: category toggles plus a summed-mass grid over the arena.

use super::{Buffer, CELL_COLUMNS, Encoder, Observation, STATIC_COLUMNS, cell_tables, static_table};
use crate::config::ObservationConfig;
use crate::entity::{Body, Pid};
use crate::world::{GameState, WorldBorder};

const CHANNELS: usize = 5;
const CH_PELLETS: usize = 0;
const CH_VIRUSES: usize = 1;
const CH_FOODS: usize = 2;
const CH_AGENT: usize = 3;
const CH_OTHERS: usize = 4;

/// Which categories the grid encoder reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridToggles {
    /// The observed player's own cells.
    pub cells: bool,
    pub others: bool,
    pub viruses: bool,
    /// Pellets and ejected food.
    pub food: bool,
}

impl Default for GridToggles {
    fn default() -> Self {
        Self {
            cells: true,
            others: true,
            viruses: true,
            food: true,
        }
    }
}

impl From<&ObservationConfig> for GridToggles {
    fn from(config: &ObservationConfig) -> Self {
        Self {
            cells: config.observe_cells,
            others: config.observe_others,
            viruses: config.observe_viruses,
            food: config.observe_food,
        }
    }
}

/// Disabled categories still produce a zero-row table and a zero channel, so
/// the observation layout never depends on the toggles.
#[derive(Debug, Clone, Copy)]
pub struct GridEncoder {
    grid_size: usize,
    toggles: GridToggles,
}

impl GridEncoder {
    pub fn new(grid_size: usize, toggles: GridToggles) -> Self {
        Self {
            grid_size: grid_size.max(1),
            toggles,
        }
    }

    #[inline]
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    #[inline]
    pub fn toggles(&self) -> GridToggles {
        self.toggles
    }
}

struct MassGrid<'a> {
    data: Vec<f32>,
    size: usize,
    border: &'a WorldBorder,
}

impl<'a> MassGrid<'a> {
    fn new(size: usize, border: &'a WorldBorder) -> Self {
        Self {
            data: vec![0.0; CHANNELS * size * size],
            size,
            border,
        }
    }

    #[inline]
    fn square(&self, value: f32, min: f32, extent: f32) -> usize {
        let g = ((value - min) / extent * self.size as f32).floor();
        (g.max(0.0) as usize).min(self.size - 1)
    }

    fn add<B: Body>(&mut self, channel: usize, body: &B) {
        let p = body.position();
        let col = self.square(p.x, self.border.min_x, self.border.width);
        let row = self.square(p.y, self.border.min_y, self.border.height);
        self.data[(channel * self.size + row) * self.size + col] += body.mass();
    }

    fn into_buffer(self) -> Buffer {
        Buffer::new(self.data, vec![CHANNELS, self.size, self.size])
    }
}

impl Encoder for GridEncoder {
    fn encode(&self, pid: Pid, state: &GameState) -> Observation {
        let t = self.toggles;
        let mut grid = MassGrid::new(self.grid_size, state.border());

        let (pellets, foods) = if t.food {
            state.pellets().iter().for_each(|p| grid.add(CH_PELLETS, p));
            state.foods().iter().for_each(|f| grid.add(CH_FOODS, f));
            (static_table(state.pellets()), static_table(state.foods()))
        } else {
            (Buffer::empty(STATIC_COLUMNS), Buffer::empty(STATIC_COLUMNS))
        };
        let viruses = if t.viruses {
            state.viruses().iter().for_each(|v| grid.add(CH_VIRUSES, v));
            static_table(state.viruses())
        } else {
            Buffer::empty(STATIC_COLUMNS)
        };

        for player in state.players() {
            let own = player.pid() == pid;
            if (own && t.cells) || (!own && t.others) {
                let channel = if own { CH_AGENT } else { CH_OTHERS };
                player.cells().iter().for_each(|c| grid.add(channel, c));
            }
        }
        let (agent, others) = cell_tables(pid, state);
        let agent = if t.cells { agent } else { Buffer::empty(CELL_COLUMNS) };
        let others = if t.others { others } else { Buffer::empty(CELL_COLUMNS) };

        Observation::new(vec![pellets, viruses, foods, agent, others, grid.into_buffer()])
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::entity::{Cell, Color, Food, Pellet, Player, Virus};

    fn sample_state() -> GameState {
        let mut state = GameState::new(WorldBorder::new(1000.0, 1000.0));
        state.pellets.push(Pellet::new(1, Vec2::new(10.0, 10.0), 1.0));
        state.pellets.push(Pellet::new(2, Vec2::new(15.0, 10.0), 1.0));
        state.viruses.push(Virus::new(3, Vec2::new(990.0, 10.0), 100.0));
        state.foods.push(Food::new(4, Vec2::new(500.0, 500.0), Vec2::ZERO, 13.0, 0));
        let mut me = Player::new(1, "me", Color::default());
        me.add_cell(Cell::new(5, Vec2::new(1000.0, 1000.0), 10.0, 0));
        let mut other = Player::new(2, "other", Color::default());
        other.add_cell(Cell::new(6, Vec2::new(10.0, 990.0), 20.0, 0));
        state.players.insert(1, me);
        state.players.insert(2, other);
        state
    }

    #[test]
    fn grid_sums_mass_per_square() {
        let state = sample_state();
        let obs = GridEncoder::new(4, GridToggles::default()).encode(1, &state);
        let grid = obs.grid().unwrap();
        assert_eq!(grid.shape(), &[5, 4, 4]);
        let at = |ch: usize, row: usize, col: usize| grid.data()[(ch * 4 + row) * 4 + col];
        assert_eq!(at(CH_PELLETS, 0, 0), 2.0);
        assert_eq!(at(CH_VIRUSES, 0, 3), 100.0);
        assert_eq!(at(CH_FOODS, 2, 2), 13.0);
        // The far edge falls in the last square.
        assert_eq!(at(CH_AGENT, 3, 3), 10.0);
        assert_eq!(at(CH_OTHERS, 3, 0), 20.0);
        assert_eq!(grid.data().iter().sum::<f32>(), 145.0);
    }

    #[test]
    fn disabled_categories_are_empty_not_absent() {
        let state = sample_state();
        let toggles = GridToggles {
            cells: false,
            others: true,
            viruses: false,
            food: false,
        };
        let obs = GridEncoder::new(8, toggles).encode(1, &state);
        assert_eq!(obs.buffers().len(), 6);
        assert_eq!(obs.pellets().shape(), &[0, STATIC_COLUMNS]);
        assert_eq!(obs.foods().shape(), &[0, STATIC_COLUMNS]);
        assert_eq!(obs.viruses().shape(), &[0, STATIC_COLUMNS]);
        assert_eq!(obs.agent().shape(), &[0, CELL_COLUMNS]);
        assert_eq!(obs.others().shape(), &[1, CELL_COLUMNS]);
        assert_eq!(obs.grid().unwrap().data().iter().sum::<f32>(), 20.0);
    }
}
