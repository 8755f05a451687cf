//! Input Capture
//!
//! One frame of player input as the run simulation sees it. Keyboard and
//! touch handling live outside the engine and translate into this struct.

use serde::{Serialize, Deserialize};

/// Lateral speed applied while a direction is held.
pub const LATERAL_SPEED: f32 = 0.05;

/// Held lateral direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lateral {
    /// No direction held
    #[default]
    None,
    /// Left (A / arrow left)
    Left,
    /// Right (D / arrow right)
    Right,
}

impl Lateral {
    /// Lateral velocity for this direction.
    #[inline]
    pub fn velocity(self) -> f32 {
        match self {
            Lateral::None => 0.0,
            Lateral::Left => -LATERAL_SPEED,
            Lateral::Right => LATERAL_SPEED,
        }
    }
}

/// Input state for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Held lateral direction
    pub lateral: Lateral,

    /// Edge-triggered action flags (packed bits):
    /// - Bit 0: Jump pressed this frame
    /// - Bit 1: Ability pressed this frame
    /// - Bit 2: Pause toggled this frame
    /// - Bit 3: Restart requested this frame
    pub flags: u8,
}

impl InputFrame {
    /// Jump flag bit
    pub const FLAG_JUMP: u8 = 0x01;

    /// Ability flag bit
    pub const FLAG_ABILITY: u8 = 0x02;

    /// Pause toggle flag bit
    pub const FLAG_PAUSE: u8 = 0x04;

    /// Restart flag bit
    pub const FLAG_RESTART: u8 = 0x08;

    /// Create an idle input frame.
    pub const fn new() -> Self {
        Self {
            lateral: Lateral::None,
            flags: 0,
        }
    }

    /// Create input with a held direction.
    pub const fn with_lateral(lateral: Lateral) -> Self {
        Self { lateral, flags: 0 }
    }

    /// Builder: press jump.
    pub const fn jump(mut self) -> Self {
        self.flags |= Self::FLAG_JUMP;
        self
    }

    /// Builder: press the ability key.
    pub const fn ability(mut self) -> Self {
        self.flags |= Self::FLAG_ABILITY;
        self
    }

    /// Builder: toggle pause.
    pub const fn pause(mut self) -> Self {
        self.flags |= Self::FLAG_PAUSE;
        self
    }

    /// Builder: request restart.
    pub const fn restart(mut self) -> Self {
        self.flags |= Self::FLAG_RESTART;
        self
    }

    /// Check if jump was pressed this frame.
    #[inline]
    pub fn jump_pressed(&self) -> bool {
        self.flags & Self::FLAG_JUMP != 0
    }

    /// Check if the ability was pressed this frame.
    #[inline]
    pub fn ability_pressed(&self) -> bool {
        self.flags & Self::FLAG_ABILITY != 0
    }

    /// Check if pause was toggled this frame.
    #[inline]
    pub fn pause_pressed(&self) -> bool {
        self.flags & Self::FLAG_PAUSE != 0
    }

    /// Check if restart was requested this frame.
    #[inline]
    pub fn restart_pressed(&self) -> bool {
        self.flags & Self::FLAG_RESTART != 0
    }

    /// Check if this is an idle frame.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.lateral == Lateral::None && self.flags == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let input = InputFrame::new().jump().ability();
        assert!(input.jump_pressed());
        assert!(input.ability_pressed());
        assert!(!input.pause_pressed());
        assert!(!input.restart_pressed());
        assert!(!input.is_idle());
    }

    #[test]
    fn test_idle() {
        assert!(InputFrame::new().is_idle());
        assert!(!InputFrame::with_lateral(Lateral::Left).is_idle());
    }

    #[test]
    fn test_lateral_velocity() {
        assert_eq!(Lateral::Left.velocity(), -LATERAL_SPEED);
        assert_eq!(Lateral::Right.velocity(), LATERAL_SPEED);
        assert_eq!(Lateral::None.velocity(), 0.0);
    }
}
