use super::{Encoder, Observation, cell_tables, static_table};
use crate::entity::Pid;
use crate::world::GameState;

/// Every live entity of every category.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullEncoder;

impl Encoder for FullEncoder {
    fn encode(&self, pid: Pid, state: &GameState) -> Observation {
        let (agent, others) = cell_tables(pid, state);
        Observation::new(vec![
            static_table(state.pellets()),
            static_table(state.viruses()),
            static_table(state.foods()),
            agent,
            others,
        ])
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::entity::{Cell, Color, Pellet, Player, Virus};
    use crate::observation::{CELL_COLUMNS, STATIC_COLUMNS};
    use crate::world::WorldBorder;

    #[test]
    fn rows_match_live_entities() {
        let mut state = GameState::new(WorldBorder::new(1000.0, 1000.0));
        state.pellets.push(Pellet::new(1, Vec2::new(1.0, 2.0), 1.0));
        state.pellets.push(Pellet::new(2, Vec2::new(3.0, 4.0), 1.0));
        state.viruses.push(Virus::new(3, Vec2::new(500.0, 500.0), 100.0));

        let mut me = Player::new(10, "me", Color::default());
        let mut cell = Cell::new(4, Vec2::new(100.0, 200.0), 25.0, 0);
        cell.velocity = Vec2::new(1.5, -2.0);
        me.add_cell(cell);
        let mut other = Player::new(11, "other", Color::default());
        other.add_cell(Cell::new(5, Vec2::new(700.0, 700.0), 30.0, 0));
        other.add_cell(Cell::new(6, Vec2::new(710.0, 700.0), 30.0, 0));
        state.players.insert(10, me);
        state.players.insert(11, other);
        state.players.insert(12, Player::new(12, "dead", Color::default()));

        let obs = FullEncoder.encode(10, &state);
        assert_eq!(obs.pellets().shape(), &[2, STATIC_COLUMNS]);
        assert_eq!(obs.pellets().row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(obs.viruses().shape(), &[1, STATIC_COLUMNS]);
        assert_eq!(obs.foods().shape(), &[0, STATIC_COLUMNS]);
        assert_eq!(obs.agent().row(0), Some(&[100.0, 200.0, 1.5, -2.0, 25.0][..]));
        assert_eq!(obs.others().shape(), &[2, CELL_COLUMNS]);
        assert!(obs.grid().is_none());
    }

    #[test]
    fn unknown_player_sees_everyone_as_other() {
        let mut state = GameState::new(WorldBorder::new(1000.0, 1000.0));
        let mut p = Player::new(1, "p", Color::default());
        p.add_cell(Cell::new(1, Vec2::new(5.0, 5.0), 10.0, 0));
        state.players.insert(1, p);

        let obs = FullEncoder.encode(99, &state);
        assert_eq!(obs.agent().rows(), 0);
        assert_eq!(obs.others().rows(), 1);
    }
}
