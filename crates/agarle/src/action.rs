//! Player actions.

use glam::Vec2;

use crate::error::{EnvError, Result};

/// What a player wants to do this tick besides moving.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionKind {
    #[default]
    Move = 0,
    Split = 1,
    Feed = 2,
}

impl TryFrom<i64> for ActionKind {
    type Error = EnvError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Self::Move),
            1 => Ok(Self::Split),
            2 => Ok(Self::Feed),
            other => Err(EnvError::invalid_action(format!("unknown action kind {other}"))),
        }
    }
}

/// A movement direction plus an optional split/feed request.
///
/// Each direction component lies in `[-1, 1]`; vectors longer than one are
/// treated as full throttle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Action {
    direction: Vec2,
    kind: ActionKind,
}

impl Action {
    /// Build a validated action.
    pub fn new(dx: f32, dy: f32, kind: ActionKind) -> Result<Self> {
        for (axis, value) in [("x", dx), ("y", dy)] {
            if !value.is_finite() {
                return Err(EnvError::invalid_action(format!("direction {axis} is not finite ({value})")));
            }
            if !(-1.0..=1.0).contains(&value) {
                return Err(EnvError::invalid_action(format!(
                    "direction {axis} must be in [-1, 1], got {value}"
                )));
            }
        }
        Ok(Self {
            direction: Vec2::new(dx, dy),
            kind,
        })
    }

    /// Stand still.
    pub const fn idle() -> Self {
        Self {
            direction: Vec2::ZERO,
            kind: ActionKind::Move,
        }
    }

    /// Move along `direction`, rescaled into the valid range.
    pub fn toward(direction: Vec2, kind: ActionKind) -> Self {
        let direction = if direction.is_finite() {
            direction.clamp_length_max(1.0)
        } else {
            Vec2::ZERO
        };
        Self { direction, kind }
    }

    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Direction scaled to at most unit length.
    #[inline]
    pub fn throttle(&self) -> Vec2 {
        self.direction.clamp_length_max(1.0)
    }

    #[inline]
    pub fn kind(&self) -> ActionKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite() {
        assert!(matches!(
            Action::new(f32::NAN, 0.0, ActionKind::Move),
            Err(EnvError::InvalidAction { .. })
        ));
        assert!(Action::new(0.0, f32::INFINITY, ActionKind::Split).is_err());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(Action::new(1.5, 0.0, ActionKind::Move).is_err());
        assert!(Action::new(-1.0, 1.0, ActionKind::Feed).is_ok());
    }

    #[test]
    fn kind_from_integer() {
        assert_eq!(ActionKind::try_from(2).unwrap(), ActionKind::Feed);
        assert!(ActionKind::try_from(3).is_err());
    }

    #[test]
    fn toward_clamps_length() {
        let action = Action::toward(Vec2::new(3.0, 4.0), ActionKind::Move);
        assert!((action.direction().length() - 1.0).abs() < 1e-6);
        assert_eq!(Action::toward(Vec2::NAN, ActionKind::Move).direction(), Vec2::ZERO);
    }
}
