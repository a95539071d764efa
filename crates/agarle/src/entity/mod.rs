//! Game entities.
//!
//! Pellets, viruses and food are owned by the world collections; cells are
//! owned by exactly one player.

mod cell;
mod food;
mod pellet;
mod player;
mod virus;

pub use cell::{Body, Cell, EntityId};
pub use food::Food;
pub use pellet::Pellet;
pub use player::{Color, Pid, Player};
pub use virus::Virus;
