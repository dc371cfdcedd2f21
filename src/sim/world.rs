/// WorldState: the complete state of a running session.
///
/// ## Time
///
/// All timers run on the level clock `clock_ms`, which only advances in
/// `step()` (i.e. while playing and not paused). Nothing is scheduled
/// outside the world: the slow-mode move, the blocked-start deadline,
/// the power countdowns and the level countdown are plain values here.
/// `cancel_timers()` drops all of them at once on level change.
///
/// ## Blocked start
///
/// `sealed_start` holds the passages closed around the start cell and
/// `unblock_at_ms` the clock value at which they reopen. Both are empty
/// on every level without a blocked start.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GameConfig;
use crate::domain::cell::{Direction, Pos};
use crate::domain::entity::{PendingMove, Player};
use crate::domain::maze::Maze;
use crate::domain::power::{Countdown, PowerDot, PowerModes};
use super::level::LEVELS;
use super::reward::Coupon;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    /// Level generated, waiting for the first key.
    LevelReady,
    Playing,
    /// Goal reached below the minimum time; level will be regenerated.
    TooFast,
    LevelComplete,
    TimeUp,
    GameComplete,
}

pub struct WorldState {
    // ── Board ──
    pub maze: Maze,
    pub player: Player,
    pub start: Pos,
    pub goal: Pos,
    pub power_dots: Vec<PowerDot>,

    // ── Timers (level clock) ──
    pub clock_ms: u64,
    pub level_timer: Countdown,
    pub powers: PowerModes,
    pub pending_move: Option<PendingMove>,
    pub sealed_start: Vec<Direction>,
    pub unblock_at_ms: Option<u64>,

    // ── Config ──
    pub config: GameConfig,

    // ── Meta ──
    pub phase: Phase,
    pub current_level: usize,
    pub total_levels: usize,
    pub tick: u64,
    /// Play time of the most recent goal arrival, in seconds.
    pub last_clear_secs: f32,

    // ── Rewards (session only) ──
    pub coupons: Vec<Coupon>,
    pub last_coupon: Option<Coupon>,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
    pub anim_tick: u32,
    pub paused: bool,

    pub rng: StdRng,
}

impl WorldState {
    /// Fresh session on the title screen. `seed` makes every generated
    /// maze reproducible; None seeds from the OS.
    pub fn new(config: GameConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let size = config.maze.grid_size;
        WorldState {
            maze: Maze::closed(size),
            player: Player::new(Pos::new(0, 0)),
            start: Pos::new(0, 0),
            goal: Pos::new(size.saturating_sub(1), size.saturating_sub(1)),
            power_dots: vec![],
            clock_ms: 0,
            level_timer: Countdown::default(),
            powers: PowerModes::default(),
            pending_move: None,
            sealed_start: vec![],
            unblock_at_ms: None,
            config,
            phase: Phase::Title,
            current_level: 0,
            total_levels: LEVELS.len(),
            tick: 0,
            last_clear_secs: 0.0,
            coupons: vec![],
            last_coupon: None,
            message: String::new(),
            message_timer: 0,
            anim_tick: 0,
            paused: false,
            rng,
        }
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Is the start cell currently sealed?
    #[inline]
    pub fn is_start_blocked(&self) -> bool {
        self.unblock_at_ms.is_some()
    }

    pub fn dot_at(&self, pos: Pos) -> Option<&PowerDot> {
        self.power_dots.iter().find(|d| d.pos == pos)
    }

    /// Level play time in seconds.
    pub fn elapsed_secs(&self) -> f32 {
        self.clock_ms as f32 / 1000.0
    }

    /// Drop every outstanding timer: power modes, the pending slow move,
    /// the unblock deadline. A still-sealed start is reopened so the maze
    /// never stays cut off. The level countdown is left to the caller.
    pub fn cancel_timers(&mut self) {
        self.powers.reset();
        self.pending_move = None;
        let sealed = std::mem::take(&mut self.sealed_start);
        self.maze.reopen(self.start, &sealed);
        self.unblock_at_ms = None;
    }
}
