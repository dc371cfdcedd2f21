/// Entities: the player and the per-tick input frame.

use super::cell::{Direction, Pos};

/// Frame input. Movement is continuous while a direction is held;
/// the player's cooldown turns a held key into a key-repeat.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: Option<Direction>,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Pos,
    pub facing: Direction,
    /// Ticks until the next move is accepted.
    pub move_cooldown: u32,
}

impl Player {
    pub fn new(pos: Pos) -> Self {
        Player { pos, facing: Direction::Right, move_cooldown: 0 }
    }

    /// Tick the cooldown down. Returns true when a move may be taken.
    pub fn ready(&mut self) -> bool {
        if self.move_cooldown > 0 {
            self.move_cooldown -= 1;
            return false;
        }
        true
    }
}

/// A slow-mode move waiting to land.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PendingMove {
    pub target: Pos,
    /// Level clock (ms) at which the move lands.
    pub due_ms: u64,
}

impl PendingMove {
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.due_ms
    }
}
