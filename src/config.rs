/// External configuration loader.
///
/// Reads `config.toml` from an explicit path, or searches the executable's
/// directory, CWD and the data directories. Falls back to defaults if the
/// file is missing or incomplete.

use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub maze: MazeConfig,
    pub power: PowerConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub move_repeat_ticks: u32,   // ticks between moves while a key is held
    pub slow_move_delay_ms: u64,  // slow mode: how long a move takes to land
    pub unblock_delay_ms: u64,    // blocked-start levels: seal lifetime
    pub min_completion_secs: u32, // faster clears are regenerated
}

#[derive(Clone, Debug)]
pub struct MazeConfig {
    pub grid_size: usize,
}

#[derive(Clone, Debug)]
pub struct PowerConfig {
    pub ghost_secs: u32,
    pub slow_secs: u32,
    pub fast_secs: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
    pub skip: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    maze: TomlMaze,
    #[serde(default)]
    power: TomlPower,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_move_repeat")]
    move_repeat_ticks: u32,
    #[serde(default = "default_slow_delay")]
    slow_move_delay_ms: u64,
    #[serde(default = "default_unblock_delay")]
    unblock_delay_ms: u64,
    #[serde(default = "default_min_completion")]
    min_completion_secs: u32,
}

#[derive(Deserialize, Debug)]
struct TomlMaze {
    #[serde(default = "default_grid_size")]
    grid_size: usize,
}

#[derive(Deserialize, Debug)]
struct TomlPower {
    #[serde(default = "default_ghost_secs")]
    ghost_secs: u32,
    #[serde(default = "default_slow_secs")]
    slow_secs: u32,
    #[serde(default = "default_fast_secs")]
    fast_secs: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_skip")]
    skip: Vec<String>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 50 }
fn default_move_repeat() -> u32 { 2 }
fn default_slow_delay() -> u64 { 300 }
fn default_unblock_delay() -> u64 { 5000 }
fn default_min_completion() -> u32 { 15 }
fn default_grid_size() -> usize { 15 }
fn default_ghost_secs() -> u32 { 2 }
fn default_slow_secs() -> u32 { 5 }
fn default_fast_secs() -> u32 { 3 }

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into(), "B".into()] }
fn default_restart() -> Vec<String> { vec!["Y".into()] }
fn default_skip() -> Vec<String> { vec!["R1".into()] }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            move_repeat_ticks: default_move_repeat(),
            slow_move_delay_ms: default_slow_delay(),
            unblock_delay_ms: default_unblock_delay(),
            min_completion_secs: default_min_completion(),
        }
    }
}

impl Default for TomlMaze {
    fn default() -> Self {
        TomlMaze { grid_size: default_grid_size() }
    }
}

impl Default for TomlPower {
    fn default() -> Self {
        TomlPower {
            ghost_secs: default_ghost_secs(),
            slow_secs: default_slow_secs(),
            fast_secs: default_fast_secs(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
            skip: default_skip(),
        }
    }
}

// ── Loading ──

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            timing: TimingConfig {
                tick_rate_ms: t.timing.tick_rate_ms.max(1),
                move_repeat_ticks: t.timing.move_repeat_ticks,
                slow_move_delay_ms: t.timing.slow_move_delay_ms,
                unblock_delay_ms: t.timing.unblock_delay_ms,
                min_completion_secs: t.timing.min_completion_secs,
            },
            maze: MazeConfig {
                grid_size: t.maze.grid_size.max(2),
            },
            power: PowerConfig {
                ghost_secs: t.power.ghost_secs,
                slow_secs: t.power.slow_secs,
                fast_secs: t.power.fast_secs,
            },
            gamepad: GamepadConfig {
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
                restart: t.gamepad.restart,
                skip: t.gamepad.skip,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

impl GameConfig {
    /// Load config from `explicit` if given, otherwise search for
    /// `config.toml`: (1) exe directory, (2) current working directory,
    /// (3) data directories. Missing file or keys fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let toml_cfg = match explicit {
            Some(path) => read_toml(path).unwrap_or_default(),
            None => search_toml(&candidate_dirs()),
        };
        toml_cfg.into()
    }

    /// Parse a config document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(GameConfig::from)
    }
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = vec![];
    let mut push = |dir: PathBuf, must_exist: bool| {
        if must_exist && !dir.is_dir() { return; }
        if !dirs.iter().any(|d| d == &dir) { dirs.push(dir); }
    };

    if let Ok(exe) = std::env::current_exe() {
        // Follow symlinks so an installed link still finds its data.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            push(parent.to_path_buf(), false);
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        push(cwd, false);
    }
    if let Ok(home) = std::env::var("HOME") {
        push(PathBuf::from(home).join(".local/share/maze-explorer"), true);
    }
    push(PathBuf::from("/usr/share/maze-explorer"), true);

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}

/// First readable `config.toml` in the search dirs, or defaults.
fn search_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    search_dirs
        .iter()
        .map(|dir| dir.join("config.toml"))
        .filter(|path| path.exists())
        .find_map(|path| read_toml(&path))
        .unwrap_or_default()
}

/// Read and parse one file. A parse error yields defaults (Some), an
/// unreadable file yields None so the search can continue.
fn read_toml(path: &Path) -> Option<TomlConfig> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("could not read {}: {e}", path.display());
            return None;
        }
    };
    match toml::from_str::<TomlConfig>(&text) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            Some(cfg)
        }
        Err(e) => {
            warn!("{} parse error: {e}; using default settings", path.display());
            Some(TomlConfig::default())
        }
    }
}
