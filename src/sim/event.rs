/// Events emitted during a simulation step.
/// The presentation layer consumes these for messages and sound.

use crate::domain::power::PowerKind;

#[derive(Clone, Debug, PartialEq)]
#[allow(dead_code)]
pub enum GameEvent {
    PlayerMoved { x: usize, y: usize },
    MoveDeferred { x: usize, y: usize },
    Bumped,
    PowerPicked { kind: PowerKind, x: usize, y: usize },
    PowerExpired { kind: PowerKind },
    StartUnblocked,
    TooFast { secs: f32 },
    LevelCleared { level: usize, secs: f32 },
    TimeUp,
}
