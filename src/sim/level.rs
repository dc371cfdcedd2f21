/// Level table and level loading.
///
/// Every level is a freshly carved maze; the table only decides the
/// countdown and which post-processing runs on top of the carve:
///
/// | # | Time  | Extra                                  |
/// |---|-------|----------------------------------------|
/// | 1 | 120 s | -                                      |
/// | 2 | 110 s | -                                      |
/// | 3 | 100 s | 3 ghost dots                           |
/// | 4 |  90 s | start sealed until `unblock_delay_ms`  |
/// | 5 |  80 s | 3 slow dots, 2N extra wall removals    |
/// | 6 |  70 s | 3 fast dots                            |
/// | 7 |  60 s | 2 ghost + 2 slow + 2 fast dots         |

use log::{debug, info};

use crate::domain::cell::Pos;
use crate::domain::entity::Player;
use crate::domain::maze::Maze;
use crate::domain::power::{place_power_dots, Countdown, PowerKind};
use super::world::{Phase, WorldState};

pub struct LevelDef {
    pub name: &'static str,
    pub time_limit_secs: u32,
    pub blocked_start: bool,
    pub extra_loops: bool,
    pub dots: &'static [PowerKind],
}

use PowerKind::{Fast, Ghost, Slow};

pub const LEVELS: [LevelDef; 7] = [
    LevelDef { name: "First Steps",   time_limit_secs: 120, blocked_start: false, extra_loops: false, dots: &[] },
    LevelDef { name: "Winding Paths", time_limit_secs: 110, blocked_start: false, extra_loops: false, dots: &[] },
    LevelDef { name: "Ghost Walk",    time_limit_secs: 100, blocked_start: false, extra_loops: false, dots: &[Ghost, Ghost, Ghost] },
    LevelDef { name: "Trapped",       time_limit_secs: 90,  blocked_start: true,  extra_loops: false, dots: &[] },
    LevelDef { name: "Labyrinth",     time_limit_secs: 80,  blocked_start: false, extra_loops: true,  dots: &[Slow, Slow, Slow] },
    LevelDef { name: "Speed Run",     time_limit_secs: 70,  blocked_start: false, extra_loops: false, dots: &[Fast, Fast, Fast] },
    LevelDef { name: "Maze Master",   time_limit_secs: 60,  blocked_start: false, extra_loops: false, dots: &[Ghost, Ghost, Slow, Slow, Fast, Fast] },
];

pub fn level_def(idx: usize) -> Option<&'static LevelDef> {
    LEVELS.get(idx)
}

/// Generate level `idx` into the world. Keeps coupons and config; drops
/// every timer of the previous level. Past the last level the session
/// is complete.
pub fn load_level(world: &mut WorldState, idx: usize) {
    let Some(def) = level_def(idx) else {
        world.cancel_timers();
        world.phase = Phase::GameComplete;
        info!("all {} levels done, {} coupons", LEVELS.len(), world.coupons.len());
        return;
    };

    world.cancel_timers();

    let size = world.config.maze.grid_size;
    let start = Pos::new(0, 0);
    let mut maze = build_maze(def, size, &mut world.rng);

    if def.blocked_start {
        world.sealed_start = maze.seal(start);
        world.unblock_at_ms = Some(world.config.timing.unblock_delay_ms);
        debug!("start sealed on {:?}", world.sealed_start);
    }

    world.power_dots = place_power_dots(size, def.dots, &mut world.rng);
    world.maze = maze;
    world.start = start;
    world.goal = Pos::new(size - 1, size - 1);
    world.player = Player::new(start);
    world.level_timer = Countdown::new(def.time_limit_secs);
    world.clock_ms = 0;
    world.tick = 0;
    world.current_level = idx;
    world.total_levels = LEVELS.len();
    world.phase = Phase::LevelReady;
    world.anim_tick = 0;

    info!(
        "level {} '{}' ready: {}x{}, {} dots, {} passages",
        idx + 1, def.name, size, size, world.power_dots.len(), world.maze.open_passages(),
    );
}

/// Carve plus the level's connectivity-preserving post-processing.
pub fn build_maze<R: rand::Rng + ?Sized>(def: &LevelDef, size: usize, rng: &mut R) -> Maze {
    let mut maze = Maze::generate(size, rng);
    if def.extra_loops {
        maze.add_loops(size * 2, rng);
    }
    maze
}
