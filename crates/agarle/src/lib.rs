//! Blob arena simulation exposed as a reinforcement-learning environment.

pub mod action;
pub mod ai;
pub mod collision;
pub mod config;
pub mod engine;
pub mod entity;
pub mod env;
pub mod error;
pub mod observation;
pub mod render;
pub mod spatial;
pub mod world;

// Re-export commonly used types
pub use action::{Action, ActionKind};
pub use config::Config;
pub use engine::{Engine, TickStats};
pub use env::Environment;
pub use error::{EnvError, Result};
pub use observation::{Buffer, BufferView, Encoder, Observation};
pub use world::{GameState, GameView};
