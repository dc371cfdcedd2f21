/// Movement rules, truth-table driven.
///
/// Pure functions over the maze: they decide where a move request ends
/// up without touching any state. The world applies the outcome.
///
/// ## Single step
/// ┌──────────────────────────────┬─────────┬──────────────────┐
/// │ Condition                    │ Result  │ Notes            │
/// ├──────────────────────────────┼─────────┼──────────────────┤
/// │ Target outside the grid      │ REJECT  │ even for ghost   │
/// │ Wall in dir, ghost inactive  │ REJECT  │                  │
/// │ Wall in dir, ghost active    │ ALLOW   │ walls ignored    │
/// │ No wall in dir               │ ALLOW   │                  │
/// └──────────────────────────────┴─────────┴──────────────────┘
///
/// ## Modifiers (applied to an allowed single step)
/// ┌──────────────────────────────┬──────────────────────────────┐
/// │ Active modes                 │ Outcome                      │
/// ├──────────────────────────────┼──────────────────────────────┤
/// │ slow (with or without fast)  │ Deferred(step)               │
/// │ fast, second step allowed    │ Moved(step + step)           │
/// │ fast, second step blocked    │ Moved(step)                  │
/// │ none                         │ Moved(step)                  │
/// └──────────────────────────────┴──────────────────────────────┘
///
/// The second fast step uses the single-step table from the
/// intermediate cell, so ghost also lets it pass walls.

use super::cell::{Direction, Pos};
use super::maze::Maze;
use super::power::Modifiers;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveOutcome {
    /// Blocked by a wall or the grid edge. No state change.
    Rejected,
    /// Player lands here now.
    Moved(Pos),
    /// Player lands here after the slow-mode delay.
    Deferred(Pos),
}

/// One step from `from` in `dir`, or None if the table above says REJECT.
pub fn single_step(maze: &Maze, from: Pos, dir: Direction, ghost: bool) -> Option<Pos> {
    let target = dir.step(from, maze.size())?;
    if !ghost && maze.has_wall(from, dir) {
        return None;
    }
    Some(target)
}

/// Resolve a move request under the active modifiers.
pub fn resolve_move(maze: &Maze, from: Pos, dir: Direction, mods: Modifiers) -> MoveOutcome {
    let Some(first) = single_step(maze, from, dir, mods.ghost) else {
        return MoveOutcome::Rejected;
    };

    if mods.slow {
        return MoveOutcome::Deferred(first);
    }

    if mods.fast {
        if let Some(second) = single_step(maze, first, dir, mods.ghost) {
            return MoveOutcome::Moved(second);
        }
    }

    MoveOutcome::Moved(first)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: Modifiers = Modifiers { ghost: false, slow: false, fast: false };
    const GHOST: Modifiers = Modifiers { ghost: true, slow: false, fast: false };
    const SLOW: Modifiers = Modifiers { ghost: false, slow: true, fast: false };
    const FAST: Modifiers = Modifiers { ghost: false, slow: false, fast: true };

    /// 4x4 fixture.
    ///   row 0: open corridor left to right
    ///   (3,0) opens down into a column on the right edge
    ///   (1,1) is walled in on all sides
    fn fixture() -> Maze {
        Maze::from_diagram(&[
            "+-+-+-+-+",
            "|       |",
            "+-+-+-+ +",
            "| | | | |",
            "+-+-+-+ +",
            "|       |",
            "+ +-+-+-+",
            "|       |",
            "+-+-+-+-+",
        ])
    }

    fn p(x: usize, y: usize) -> Pos {
        Pos::new(x, y)
    }

    // ── Base rule ──

    #[test]
    fn open_corridor_moves_one_cell() {
        let m = fixture();
        assert_eq!(resolve_move(&m, p(0, 0), Direction::Right, NONE), MoveOutcome::Moved(p(1, 0)));
        assert_eq!(resolve_move(&m, p(2, 0), Direction::Left, NONE), MoveOutcome::Moved(p(1, 0)));
    }

    #[test]
    fn wall_blocks_without_ghost() {
        let m = fixture();
        assert_eq!(resolve_move(&m, p(0, 0), Direction::Down, NONE), MoveOutcome::Rejected);
        assert_eq!(resolve_move(&m, p(1, 1), Direction::Left, NONE), MoveOutcome::Rejected);
        assert_eq!(resolve_move(&m, p(1, 1), Direction::Up, NONE), MoveOutcome::Rejected);
    }

    #[test]
    fn grid_edge_blocks() {
        let m = fixture();
        assert_eq!(resolve_move(&m, p(0, 0), Direction::Up, NONE), MoveOutcome::Rejected);
        assert_eq!(resolve_move(&m, p(0, 0), Direction::Left, NONE), MoveOutcome::Rejected);
        assert_eq!(resolve_move(&m, p(3, 3), Direction::Right, NONE), MoveOutcome::Rejected);
        assert_eq!(resolve_move(&m, p(3, 3), Direction::Down, NONE), MoveOutcome::Rejected);
    }

    #[test]
    fn every_walled_move_is_rejected_on_generated_maze() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;
        let m = Maze::generate(15, &mut StdRng::seed_from_u64(8));
        for y in 0..15 {
            for x in 0..15 {
                for dir in Direction::ALL {
                    let out = resolve_move(&m, p(x, y), dir, NONE);
                    if m.has_wall(p(x, y), dir) {
                        assert_eq!(out, MoveOutcome::Rejected);
                    } else {
                        assert!(matches!(out, MoveOutcome::Moved(_)));
                    }
                }
            }
        }
    }

    // ── Ghost ──

    #[test]
    fn ghost_passes_walls() {
        let m = fixture();
        assert_eq!(resolve_move(&m, p(0, 0), Direction::Down, GHOST), MoveOutcome::Moved(p(0, 1)));
        assert_eq!(resolve_move(&m, p(1, 1), Direction::Right, GHOST), MoveOutcome::Moved(p(2, 1)));
    }

    #[test]
    fn ghost_still_respects_bounds() {
        let m = fixture();
        assert_eq!(resolve_move(&m, p(0, 0), Direction::Up, GHOST), MoveOutcome::Rejected);
        assert_eq!(resolve_move(&m, p(3, 2), Direction::Right, GHOST), MoveOutcome::Rejected);
        assert_eq!(resolve_move(&m, p(2, 3), Direction::Down, GHOST), MoveOutcome::Rejected);
    }

    // ── Slow ──

    #[test]
    fn slow_defers_valid_moves() {
        let m = fixture();
        assert_eq!(resolve_move(&m, p(0, 0), Direction::Right, SLOW), MoveOutcome::Deferred(p(1, 0)));
    }

    #[test]
    fn slow_does_not_defer_rejections() {
        let m = fixture();
        assert_eq!(resolve_move(&m, p(0, 0), Direction::Down, SLOW), MoveOutcome::Rejected);
    }

    #[test]
    fn slow_wins_over_fast() {
        let m = fixture();
        let both = Modifiers { ghost: false, slow: true, fast: true };
        assert_eq!(resolve_move(&m, p(0, 0), Direction::Right, both), MoveOutcome::Deferred(p(1, 0)));
    }

    // ── Fast ──

    #[test]
    fn fast_double_step_in_open_corridor() {
        let m = fixture();
        assert_eq!(resolve_move(&m, p(0, 0), Direction::Right, FAST), MoveOutcome::Moved(p(2, 0)));
        assert_eq!(resolve_move(&m, p(3, 0), Direction::Down, FAST), MoveOutcome::Moved(p(3, 2)));
    }

    #[test]
    fn fast_falls_back_when_extension_walled() {
        let m = fixture();
        // (2,0) -> (3,0), then (3,0) right is the grid edge
        assert_eq!(resolve_move(&m, p(2, 0), Direction::Right, FAST), MoveOutcome::Moved(p(3, 0)));
        // (3,2) -> (2,2) ok, (2,2) left -> (1,2) ok: full double step
        assert_eq!(resolve_move(&m, p(3, 2), Direction::Left, FAST), MoveOutcome::Moved(p(1, 2)));
        // (0,2) down -> (0,3), then edge
        assert_eq!(resolve_move(&m, p(0, 2), Direction::Down, FAST), MoveOutcome::Moved(p(0, 3)));
    }

    #[test]
    fn fast_first_step_blocked_is_rejected() {
        let m = fixture();
        assert_eq!(resolve_move(&m, p(0, 0), Direction::Down, FAST), MoveOutcome::Rejected);
    }

    #[test]
    fn fast_with_ghost_jumps_walls() {
        let m = fixture();
        let both = Modifiers { ghost: true, slow: false, fast: true };
        assert_eq!(resolve_move(&m, p(0, 0), Direction::Down, both), MoveOutcome::Moved(p(0, 2)));
        // Second step would leave the grid: single ghost step
        assert_eq!(resolve_move(&m, p(0, 2), Direction::Down, both), MoveOutcome::Moved(p(0, 3)));
    }
}
