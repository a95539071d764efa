//! Environment error types.

use thiserror::Error;

use crate::entity::Pid;

/// Errors reported by the engine and the environment control loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    /// Action parameters were non-finite or outside their domain.
    /// The previously pending action is left in place.
    #[error("invalid action: {reason}")]
    InvalidAction { reason: String },

    /// Construction parameters make no sense (zero arena, zero frames per step, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A world invariant was broken. Never expected in a correct build.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("unknown player: {0}")]
    UnknownPlayer(Pid),
}

impl EnvError {
    pub(crate) fn invalid_action(reason: impl Into<String>) -> Self {
        Self::InvalidAction { reason: reason.into() }
    }

    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, EnvError>;
