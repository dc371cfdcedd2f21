/// The step function: advances the world by one tick of `dt_ms`.
///
/// Processing order:
///   1. Level clock
///   2. Blocked-start release
///   3. Pending slow move (lands instead of new movement this tick)
///   4. Player movement (rules::resolve_move)
///   5. Power-dot pickup
///   6. Goal check (too fast / level complete)
///   7. Timers (power modes, then the level countdown)
///
/// Every timer is driven by `dt_ms` here; a paused or non-playing world
/// does not age.

use log::{debug, info};

use crate::domain::cell::Direction;
use crate::domain::entity::{FrameInput, PendingMove};
use crate::domain::power::PowerKind;
use crate::domain::rules::{self, MoveOutcome};
use super::event::GameEvent;
use super::level::load_level;
use super::reward::issue_coupon;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput, dt_ms: u64) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;
    world.clock_ms += dt_ms;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    resolve_unblock(world, &mut events);
    if !resolve_pending_move(world, &mut events) {
        resolve_player_movement(world, input.movement, &mut events);
    }
    resolve_power_pickup(world, &mut events);
    if resolve_goal(world, &mut events) { return events; }
    resolve_timers(world, dt_ms, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Blocked start
// ══════════════════════════════════════════════════════════════

fn resolve_unblock(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let Some(at) = world.unblock_at_ms else { return };
    if world.clock_ms < at { return; }

    let sealed = std::mem::take(&mut world.sealed_start);
    world.maze.reopen(world.start, &sealed);
    world.unblock_at_ms = None;
    events.push(GameEvent::StartUnblocked);
    world.set_message("The way is open!", 40);
    debug!("start unblocked at {} ms", world.clock_ms);
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

/// Land a due slow move. Returns true if one landed this tick.
fn resolve_pending_move(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    let Some(pending) = world.pending_move else { return false };
    if !pending.is_due(world.clock_ms) { return false; }

    world.pending_move = None;
    world.player.pos = pending.target;
    events.push(GameEvent::PlayerMoved { x: pending.target.x, y: pending.target.y });
    true
}

fn resolve_player_movement(
    world: &mut WorldState,
    movement: Option<Direction>,
    events: &mut Vec<GameEvent>,
) {
    if !world.player.ready() { return; }
    let Some(dir) = movement else { return };

    // Slow mode: one move in flight at a time.
    if world.pending_move.is_some() { return; }

    world.player.facing = dir;
    world.player.move_cooldown = world.config.timing.move_repeat_ticks;

    if world.is_start_blocked() {
        events.push(GameEvent::Bumped);
        return;
    }

    let mods = world.powers.modifiers();
    match rules::resolve_move(&world.maze, world.player.pos, dir, mods) {
        MoveOutcome::Rejected => events.push(GameEvent::Bumped),
        MoveOutcome::Moved(to) => {
            world.player.pos = to;
            events.push(GameEvent::PlayerMoved { x: to.x, y: to.y });
        }
        MoveOutcome::Deferred(to) => {
            world.pending_move = Some(PendingMove {
                target: to,
                due_ms: world.clock_ms + world.config.timing.slow_move_delay_ms,
            });
            events.push(GameEvent::MoveDeferred { x: to.x, y: to.y });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Pickup & goal
// ══════════════════════════════════════════════════════════════

fn resolve_power_pickup(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let pos = world.player.pos;
    let Some(idx) = world.power_dots.iter().position(|d| d.pos == pos) else { return };

    let dot = world.power_dots.remove(idx);
    let secs = match dot.kind {
        PowerKind::Ghost => world.config.power.ghost_secs,
        PowerKind::Slow => world.config.power.slow_secs,
        PowerKind::Fast => world.config.power.fast_secs,
    };
    world.powers.activate(dot.kind, secs);
    events.push(GameEvent::PowerPicked { kind: dot.kind, x: pos.x, y: pos.y });
    world.set_message(&format!("{} mode for {}s!", dot.kind.label(), secs), 40);
}

/// Returns true if the level ended this tick.
fn resolve_goal(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    if world.player.pos != world.goal { return false; }

    let secs = world.elapsed_secs();
    world.last_clear_secs = secs;
    let min_ms = u64::from(world.config.timing.min_completion_secs) * 1000;

    if world.clock_ms < min_ms {
        world.phase = Phase::TooFast;
        world.cancel_timers();
        events.push(GameEvent::TooFast { secs });
        info!("level {} reached in {:.1}s, too fast; regenerating", world.current_level + 1, secs);
        return true;
    }

    let coupon = issue_coupon(world.current_level, &mut world.rng);
    info!(
        "level {} cleared in {:.1}s, coupon {} #{}",
        world.current_level + 1, secs, coupon.title, coupon.code_str(),
    );
    world.coupons.push(coupon.clone());
    world.last_coupon = Some(coupon);
    world.phase = Phase::LevelComplete;
    world.anim_tick = 0;
    world.cancel_timers();
    events.push(GameEvent::LevelCleared { level: world.current_level, secs });
    true
}

// ══════════════════════════════════════════════════════════════
// Timers
// ══════════════════════════════════════════════════════════════

fn resolve_timers(world: &mut WorldState, dt_ms: u64, events: &mut Vec<GameEvent>) {
    let dt = u32::try_from(dt_ms).unwrap_or(u32::MAX);

    for kind in world.powers.advance(dt) {
        events.push(GameEvent::PowerExpired { kind });
        world.set_message(&format!("{} mode ended", kind.label()), 30);
    }

    if world.level_timer.advance(dt) {
        world.phase = Phase::TimeUp;
        world.cancel_timers();
        events.push(GameEvent::TimeUp);
        info!("level {} timed out", world.current_level + 1);
    }
}

// ══════════════════════════════════════════════════════════════
// Level transitions
// ══════════════════════════════════════════════════════════════

/// Fresh maze for the current level ("reset" key, or retry after time up).
pub fn restart_level(world: &mut WorldState) {
    load_level(world, world.current_level);
}

/// Too-fast clear: same level, new maze, all timers reset.
pub fn regenerate_level(world: &mut WorldState) {
    info!("regenerating level {} after a {:.1}s run", world.current_level + 1, world.last_clear_secs);
    load_level(world, world.current_level);
}

/// Move on without a reward.
pub fn skip_level(world: &mut WorldState) {
    info!("level {} skipped", world.current_level + 1);
    world.last_coupon = None;
    load_level(world, world.current_level + 1);
}

/// Move on after a cleared level.
pub fn advance_level(world: &mut WorldState) {
    load_level(world, world.current_level + 1);
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::cell::Pos;
    use crate::domain::maze::Maze;
    use crate::domain::power::{Countdown, PowerDot};

    // (0,0) → (2,0) ↓ (2,1) → (0,1) ↓ (0,2) → (2,2)
    const SNAKE: [&str; 7] = [
        "+-+-+-+",
        "|     |",
        "+-+-+ +",
        "|     |",
        "+ +-+-+",
        "|     |",
        "+-+-+-+",
    ];

    const DT: u64 = 50;

    fn world() -> WorldState {
        let mut cfg = GameConfig::default();
        cfg.timing.move_repeat_ticks = 0;
        cfg.maze.grid_size = 3;
        let mut w = WorldState::new(cfg, Some(99));
        w.maze = Maze::from_diagram(&SNAKE);
        w.goal = Pos::new(2, 2);
        w.level_timer = Countdown::new(120);
        w.phase = Phase::Playing;
        w
    }

    fn press(w: &mut WorldState, dir: Direction) -> Vec<GameEvent> {
        step(w, FrameInput { movement: Some(dir) }, DT)
    }

    fn idle(w: &mut WorldState, dt_ms: u64) -> Vec<GameEvent> {
        step(w, FrameInput::default(), dt_ms)
    }

    #[test]
    fn wall_bumps() {
        let mut w = world();
        let ev = press(&mut w, Direction::Down);
        assert_eq!(ev, vec![GameEvent::Bumped]);
        assert_eq!(w.player.pos, Pos::new(0, 0));
        assert_eq!(w.player.facing, Direction::Down);
    }

    #[test]
    fn open_side_moves() {
        let mut w = world();
        let ev = press(&mut w, Direction::Right);
        assert_eq!(ev, vec![GameEvent::PlayerMoved { x: 1, y: 0 }]);
        assert_eq!(w.player.pos, Pos::new(1, 0));
    }

    #[test]
    fn edge_bumps() {
        let mut w = world();
        assert_eq!(press(&mut w, Direction::Up), vec![GameEvent::Bumped]);
        assert_eq!(press(&mut w, Direction::Left), vec![GameEvent::Bumped]);
        assert_eq!(w.player.pos, Pos::new(0, 0));
    }

    #[test]
    fn cooldown_throttles_held_key() {
        let mut w = world();
        w.config.timing.move_repeat_ticks = 2;
        press(&mut w, Direction::Right);
        assert_eq!(w.player.pos, Pos::new(1, 0));
        press(&mut w, Direction::Right);
        press(&mut w, Direction::Right);
        assert_eq!(w.player.pos, Pos::new(1, 0));
        press(&mut w, Direction::Right);
        assert_eq!(w.player.pos, Pos::new(2, 0));
    }

    #[test]
    fn ghost_pickup_passes_walls() {
        let mut w = world();
        w.power_dots = vec![PowerDot { pos: Pos::new(1, 0), kind: PowerKind::Ghost }];
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::PowerPicked { kind: PowerKind::Ghost, x: 1, y: 0 }));
        assert!(w.power_dots.is_empty());
        assert_eq!(w.powers.ghost.secs_left(), 2);

        press(&mut w, Direction::Down);
        assert_eq!(w.player.pos, Pos::new(1, 1));
    }

    #[test]
    fn ghost_expires_after_two_seconds() {
        let mut w = world();
        w.powers.activate(PowerKind::Ghost, 2);
        let ev = idle(&mut w, 1950);
        assert!(ev.is_empty());
        assert!(w.powers.ghost.is_active());
        let ev = idle(&mut w, DT);
        assert_eq!(ev, vec![GameEvent::PowerExpired { kind: PowerKind::Ghost }]);

        assert_eq!(press(&mut w, Direction::Down), vec![GameEvent::Bumped]);
    }

    #[test]
    fn slow_move_lands_after_delay() {
        let mut w = world();
        w.powers.activate(PowerKind::Slow, 5);
        let ev = press(&mut w, Direction::Right);
        assert_eq!(ev, vec![GameEvent::MoveDeferred { x: 1, y: 0 }]);
        assert_eq!(w.player.pos, Pos::new(0, 0));
        assert_eq!(w.pending_move.map(|p| p.due_ms), Some(DT + 300));

        // Input while a move is pending is dropped.
        press(&mut w, Direction::Right);
        assert_eq!(w.pending_move.map(|p| p.target), Some(Pos::new(1, 0)));

        for _ in 0..4 {
            idle(&mut w, DT);
        }
        assert_eq!(w.clock_ms, 300);
        assert_eq!(w.player.pos, Pos::new(0, 0));

        let ev = idle(&mut w, DT);
        assert_eq!(ev, vec![GameEvent::PlayerMoved { x: 1, y: 0 }]);
        assert_eq!(w.player.pos, Pos::new(1, 0));
        assert!(w.pending_move.is_none());
    }

    #[test]
    fn slow_wall_is_not_deferred() {
        let mut w = world();
        w.powers.activate(PowerKind::Slow, 5);
        assert_eq!(press(&mut w, Direction::Down), vec![GameEvent::Bumped]);
        assert!(w.pending_move.is_none());
    }

    #[test]
    fn fast_moves_two_cells() {
        let mut w = world();
        w.powers.activate(PowerKind::Fast, 3);
        press(&mut w, Direction::Right);
        assert_eq!(w.player.pos, Pos::new(2, 0));
        // Second step from (2,1) is walled: single step only.
        press(&mut w, Direction::Down);
        assert_eq!(w.player.pos, Pos::new(2, 1));
    }

    #[test]
    fn slow_beats_fast() {
        let mut w = world();
        w.powers.activate(PowerKind::Slow, 5);
        w.powers.activate(PowerKind::Fast, 3);
        press(&mut w, Direction::Right);
        assert_eq!(w.pending_move.map(|p| p.target), Some(Pos::new(1, 0)));
    }

    #[test]
    fn early_arrival_is_too_fast() {
        let mut w = world();
        w.player.pos = Pos::new(1, 2);
        w.powers.activate(PowerKind::Fast, 3);
        let ev = press(&mut w, Direction::Right);
        assert!(matches!(ev.last(), Some(GameEvent::TooFast { .. })));
        assert_eq!(w.phase, Phase::TooFast);
        assert!(w.coupons.is_empty());
        assert!(w.last_coupon.is_none());
        assert!(!w.powers.any_active());
    }

    #[test]
    fn just_under_minimum_is_too_fast() {
        let mut w = world();
        w.player.pos = Pos::new(1, 2);
        w.clock_ms = 14_900;
        press(&mut w, Direction::Right);
        assert_eq!(w.phase, Phase::TooFast);
    }

    #[test]
    fn arrival_at_minimum_clears() {
        let mut w = world();
        w.player.pos = Pos::new(1, 2);
        w.clock_ms = 14_950;
        let ev = press(&mut w, Direction::Right);
        assert!(ev.contains(&GameEvent::LevelCleared { level: 0, secs: 15.0 }));
        assert_eq!(w.phase, Phase::LevelComplete);
        assert_eq!(w.coupons.len(), 1);
        assert_eq!(w.last_coupon.as_ref().map(|c| c.level), Some(0));
        assert!((1000..=9999).contains(&w.coupons[0].code));
    }

    #[test]
    fn full_walk_after_waiting_clears() {
        let mut w = world();
        idle(&mut w, 20_000);
        use Direction::*;
        for dir in [Right, Right, Down, Left, Left, Down, Right, Right] {
            press(&mut w, dir);
        }
        assert_eq!(w.player.pos, Pos::new(2, 2));
        assert_eq!(w.phase, Phase::LevelComplete);
    }

    #[test]
    fn too_fast_regenerates_with_fresh_timers() {
        let mut w = world();
        w.player.pos = Pos::new(1, 2);
        press(&mut w, Direction::Right);
        assert_eq!(w.phase, Phase::TooFast);

        w.powers.activate(PowerKind::Ghost, 2);
        w.pending_move = Some(PendingMove { target: Pos::new(1, 0), due_ms: 999 });
        regenerate_level(&mut w);

        assert_eq!(w.phase, Phase::LevelReady);
        assert_eq!(w.current_level, 0);
        assert_eq!(w.clock_ms, 0);
        assert_eq!(w.player.pos, Pos::new(0, 0));
        assert!(!w.powers.any_active());
        assert!(w.pending_move.is_none());
        assert_eq!(w.level_timer.secs_left(), 120);
        assert_eq!(w.maze.open_passages(), 3 * 3 - 1);
    }

    #[test]
    fn countdown_zero_is_time_up() {
        let mut w = world();
        w.level_timer = Countdown::new(1);
        w.powers.activate(PowerKind::Fast, 3);
        let ev = idle(&mut w, 1000);
        assert_eq!(ev, vec![GameEvent::TimeUp]);
        assert_eq!(w.phase, Phase::TimeUp);
        assert!(!w.powers.any_active());

        assert!(press(&mut w, Direction::Right).is_empty());
        assert_eq!(w.player.pos, Pos::new(0, 0));
    }

    #[test]
    fn blocked_start_lifts_after_delay() {
        let mut cfg = GameConfig::default();
        cfg.timing.move_repeat_ticks = 0;
        let mut w = WorldState::new(cfg, Some(7));
        load_level(&mut w, 3);
        w.phase = Phase::Playing;

        for dir in Direction::ALL {
            assert_eq!(press(&mut w, dir), vec![GameEvent::Bumped]);
        }
        assert_eq!(w.player.pos, Pos::new(0, 0));

        idle(&mut w, 4_750);
        assert_eq!(w.clock_ms, 4_950);
        assert!(w.is_start_blocked());

        let ev = idle(&mut w, DT);
        assert_eq!(ev, vec![GameEvent::StartUnblocked]);
        assert!(!w.is_start_blocked());
        assert!(w.maze.is_connected_from(w.start));

        let moved = Direction::ALL.iter().any(|&d| {
            matches!(press(&mut w, d).first(), Some(GameEvent::PlayerMoved { .. }))
        });
        assert!(moved);
    }

    #[test]
    fn restart_keeps_level_and_coupons() {
        let mut w = world();
        w.player.pos = Pos::new(1, 2);
        w.clock_ms = 20_000;
        press(&mut w, Direction::Right);
        advance_level(&mut w);
        assert_eq!(w.current_level, 1);
        w.phase = Phase::Playing;
        restart_level(&mut w);
        assert_eq!(w.current_level, 1);
        assert_eq!(w.coupons.len(), 1);
        assert_eq!(w.level_timer.secs_left(), 110);
    }

    #[test]
    fn skip_gives_no_coupon() {
        let mut w = world();
        skip_level(&mut w);
        assert_eq!(w.current_level, 1);
        assert_eq!(w.phase, Phase::LevelReady);
        assert!(w.coupons.is_empty());
        assert!(w.last_coupon.is_none());
    }

    #[test]
    fn advancing_past_last_level_completes() {
        let mut w = world();
        w.current_level = 6;
        advance_level(&mut w);
        assert_eq!(w.phase, Phase::GameComplete);
    }

    #[test]
    fn idle_world_does_not_age() {
        let mut w = world();
        w.phase = Phase::LevelReady;
        w.powers.activate(PowerKind::Ghost, 2);
        assert!(idle(&mut w, 5_000).is_empty());
        assert_eq!(w.clock_ms, 0);
        assert_eq!(w.powers.ghost.secs_left(), 2);
        assert_eq!(w.level_timer.secs_left(), 120);
    }
}
