//! Process command-line options.
//!
//! Besides the usual knobs, `--print` generates a level without starting
//! the terminal UI, which is handy to inspect what a seed produces:
//!
//! ```text
//! $ maze-explorer --seed 42 --level 3 --print
//! ```

use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use env_logger::{Builder, Env, Target};
use log::{debug, warn};

use crate::config::GameConfig;
use crate::domain::power::PowerKind;
use crate::sim::level::{level_def, load_level};
use crate::sim::world::WorldState;

/// Navigate seven randomly generated mazes in the terminal.
#[derive(Parser, Debug)]
#[command(about, long_about = None, version)]
pub struct Args {
    /// Seed for maze generation (random if omitted)
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Level to start from
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=7))]
    pub level: u8,

    /// Path to config.toml (searched next to the binary and in the data dirs otherwise)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write log messages to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the generated maze for --level and exit
    #[arg(short, long, default_value_t = false)]
    pub print: bool,

    /// Enable debug messages
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,
}

/// Parse the command line.
pub fn parse() -> Args {
    Args::parse()
}

impl Args {
    /// 0-based level index.
    pub fn level_index(&self) -> usize {
        usize::from(self.level.saturating_sub(1))
    }
}

/// Set up env_logger. `RUST_LOG` overrides the default filter.
pub fn init_logging(args: &Args) {
    let default_filter = if args.debug { "debug" } else { "warn" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));

    let mut file_error = None;
    if let Some(path) = &args.log_file {
        match File::create(path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(e) => file_error = Some(format!("cannot open log file {}: {e}", path.display())),
        }
    }
    builder.init();

    if let Some(msg) = file_error {
        warn!("{msg}; logging to stderr");
    }
    debug!("{args:?}");
}

/// Text rendering of a freshly loaded level: the maze diagram with
/// `S` start, `G` goal and `g`/`s`/`f` power dots.
pub fn level_text(world: &WorldState) -> Vec<String> {
    let mut rows: Vec<Vec<char>> = world
        .maze
        .to_diagram()
        .into_iter()
        .map(|r| r.chars().collect())
        .collect();

    let mut mark = |x: usize, y: usize, ch: char| {
        if let Some(c) = rows.get_mut(2 * y + 1).and_then(|r| r.get_mut(2 * x + 1)) {
            *c = ch;
        }
    };
    mark(world.start.x, world.start.y, 'S');
    mark(world.goal.x, world.goal.y, 'G');
    for dot in &world.power_dots {
        let ch = match dot.kind {
            PowerKind::Ghost => 'g',
            PowerKind::Slow => 's',
            PowerKind::Fast => 'f',
        };
        mark(dot.pos.x, dot.pos.y, ch);
    }

    rows.into_iter().map(|r| r.into_iter().collect()).collect()
}

/// Handle `--print`. Returns the process exit code when the program
/// should stop here.
pub fn run_print(args: &Args, config: &GameConfig) -> Option<i32> {
    if !args.print {
        return None;
    }
    let mut world = WorldState::new(config.clone(), args.seed);
    let idx = args.level_index();
    load_level(&mut world, idx);

    let Some(def) = level_def(idx) else {
        eprintln!("Unknown level {}", args.level);
        return Some(1);
    };
    println!("Level {}: {} ({}s)", idx + 1, def.name, def.time_limit_secs);
    if world.is_start_blocked() {
        println!("Start sealed for {} ms", config.timing.unblock_delay_ms);
    }
    for line in level_text(&world) {
        println!("{line}");
    }
    Some(0)
}
