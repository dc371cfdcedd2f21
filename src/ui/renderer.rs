/// Presentation layer: double-buffered, diff-based terminal renderer.
///
///   1. Compose the next frame into `front`
///   2. Compare each cell with `back` (previous frame)
///   3. Emit commands only for changed cells, batched with `queue!`
///   4. Swap front/back
///
/// Maze layout: every maze cell is 3 columns wide and 1 row high, with
/// one row/column of wall glyphs between cells, so an N×N maze takes
/// (4N+1) × (2N+1) terminal cells.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::{Direction, Pos};
use crate::domain::maze::Maze;
use crate::domain::power::PowerKind;
use crate::sim::level::{level_def, LEVELS};
use crate::sim::reward::total_coupons;
use crate::sim::world::{Phase, WorldState};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every cell, also used for full clears, so
    /// terminals never show their own default between rows.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 20, b: 30 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never equal to a composed cell: forces a repaint.
    const INVALID: Cell = Cell { ch: '\0', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { Self::BASE_BG } else { bg };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn invalidate(&mut self) {
        self.cells.fill(Cell::INVALID);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// One column per char.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::Black, bg));
        }
    }
}

// ── Palette ──

const WALL: Color = Color::Rgb { r: 90, g: 110, b: 170 };
const WALL_SEALED: Color = Color::Rgb { r: 230, g: 70, b: 70 };
const PLAYER: Color = Color::Rgb { r: 255, g: 220, b: 60 };
const PLAYER_GHOST: Color = Color::Rgb { r: 190, g: 190, b: 255 };
const GOAL: Color = Color::Rgb { r: 80, g: 255, b: 120 };
const HEADER: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const KEY: Color = Color::Rgb { r: 100, g: 200, b: 255 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const PANEL_BG: Color = Color::Rgb { r: 36, g: 38, b: 52 };

fn power_color(kind: PowerKind) -> Color {
    match kind {
        PowerKind::Ghost => Color::Rgb { r: 170, g: 140, b: 255 },
        PowerKind::Slow => Color::Rgb { r: 80, g: 170, b: 255 },
        PowerKind::Fast => Color::Rgb { r: 255, g: 120, b: 60 },
    }
}

// ── Layout helpers (pure) ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_COL: usize = 2;
const CELL_W: usize = 4;

/// `m:ss`
fn fmt_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Whole seconds left until `deadline_ms`, rounded up.
fn secs_until(deadline_ms: u64, now_ms: u64) -> u64 {
    deadline_ms.saturating_sub(now_ms).div_ceil(1000)
}

/// Wall glyph at layout coordinate (lx, ly) of an N×N maze, or None for
/// a floor position. Even rows are horizontal wall rows, columns at
/// multiples of CELL_W are vertical wall columns.
fn wall_glyph(maze: &Maze, lx: usize, ly: usize) -> Option<char> {
    let n = maze.size();
    let on_hrow = ly % 2 == 0;
    let on_vcol = lx % CELL_W == 0;
    let cx = lx / CELL_W;
    let cy = ly / 2;

    match (on_hrow, on_vcol) {
        (true, true) => Some('+'),
        (true, false) => {
            // Wall above cell (cx, cy), or the bottom border.
            let present = if cy < n {
                maze.has_wall(Pos::new(cx, cy), Direction::Up)
            } else {
                maze.has_wall(Pos::new(cx, n - 1), Direction::Down)
            };
            present.then_some('─')
        }
        (false, true) => {
            let present = if cx < n {
                maze.has_wall(Pos::new(cx, cy), Direction::Left)
            } else {
                maze.has_wall(Pos::new(n - 1, cy), Direction::Right)
            };
            present.then_some('│')
        }
        (false, false) => None,
    }
}

/// Layout coordinate of the glyph column at the centre of `pos`.
fn cell_center(pos: Pos) -> (usize, usize) {
    (pos.x * CELL_W + CELL_W / 2, pos.y * 2 + 1)
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.invalidate();
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let resized = tw as usize != self.term_w || th as usize != self.term_h;
        let phase_changed = self.last_phase != Some(world.phase);
        if resized {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
        }
        if resized || phase_changed {
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();

        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::LevelReady => {
                self.compose_game(world);
                self.compose_ready_banner(world);
            }
            Phase::Playing => self.compose_game(world),
            Phase::TooFast => {
                self.compose_game(world);
                self.compose_too_fast(world);
            }
            Phase::LevelComplete => {
                self.compose_game(world);
                self.compose_level_complete(world);
            }
            Phase::TimeUp => {
                self.compose_game(world);
                self.compose_time_up(world);
            }
            Phase::GameComplete => self.compose_game_complete(world),
        }

        if world.paused {
            self.compose_pause_overlay(world);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── In-game ──

    fn compose_game(&mut self, w: &WorldState) {
        self.compose_hud(w);
        self.compose_maze(w);

        let n = w.maze.size();
        let below = MAP_ROW + 2 * n + 2;

        if !w.message.is_empty() && below < self.front.height {
            self.front.fill_row(below, MSG_BG);
            self.front.put_str(1, below, &format!(" {} ", w.message), Color::Black, MSG_BG);
        }
        if below + 1 < self.front.height {
            let help = "Move ←→↑↓/WASD   R Reset   N Skip   F1 Pause   ESC Title";
            self.front.put_str(MAP_COL, below + 1, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_hud(&mut self, w: &WorldState) {
        let name = level_def(w.current_level).map(|d| d.name).unwrap_or("");
        let mut x = 1;
        let mut put = |buf: &mut FrameBuffer, s: &str, fg: Color| {
            buf.put_str(x, HUD_ROW, s, fg, Color::Reset);
            x += s.chars().count();
        };

        put(&mut self.front, &format!("Level {}/{} ", w.current_level + 1, w.total_levels), HEADER);
        put(&mut self.front, &format!("{name:<14}"), Color::White);

        let left = w.level_timer.secs_left();
        let time_fg = if left <= 10 { Color::Red } else { Color::White };
        put(&mut self.front, &format!(" Time {} ", fmt_clock(left)), time_fg);
        put(&mut self.front, &format!(" Played {:.1}s ", w.elapsed_secs()), Color::DarkGrey);

        for kind in [PowerKind::Ghost, PowerKind::Slow, PowerKind::Fast] {
            let c = w.powers.get(kind);
            if c.is_active() {
                put(&mut self.front, &format!(" {} {}s", kind.label(), c.secs_left()), power_color(kind));
            }
        }
        if let Some(at) = w.unblock_at_ms {
            put(&mut self.front, &format!(" Blocked {}s", secs_until(at, w.clock_ms)), WALL_SEALED);
        }
        if w.pending_move.is_some() {
            put(&mut self.front, " …", power_color(PowerKind::Slow));
        }
    }

    fn compose_maze(&mut self, w: &WorldState) {
        let maze = &w.maze;
        let n = maze.size();
        let sealed = w.is_start_blocked();
        let (sx, sy) = cell_center(w.start);

        for ly in 0..=2 * n {
            for lx in 0..=CELL_W * n {
                if let Some(ch) = wall_glyph(maze, lx, ly) {
                    // Walls touching the sealed start glow.
                    let near_start = sealed
                        && lx.abs_diff(sx) <= CELL_W / 2
                        && ly.abs_diff(sy) <= 1;
                    let fg = if near_start { WALL_SEALED } else { WALL };
                    self.front.set(MAP_COL + lx, MAP_ROW + ly, Cell::new(ch, fg, Color::Reset));
                }
            }
        }

        let put = |buf: &mut FrameBuffer, pos: Pos, ch: char, fg: Color| {
            let (cx, cy) = cell_center(pos);
            buf.set(MAP_COL + cx, MAP_ROW + cy, Cell::new(ch, fg, Color::Reset));
        };

        let blink = (w.anim_tick / 6) % 2 == 0;
        put(&mut self.front, w.goal, if blink { '◎' } else { '○' }, GOAL);
        for dot in &w.power_dots {
            put(&mut self.front, dot.pos, '◆', power_color(dot.kind));
        }
        if let Some(pending) = w.pending_move {
            put(&mut self.front, pending.target, '·', power_color(PowerKind::Slow));
        }
        let fg = if w.powers.ghost.is_active() { PLAYER_GHOST } else { PLAYER };
        put(&mut self.front, w.player.pos, '@', fg);
    }

    // ── Panels ──

    /// Bordered panel centred over the maze.
    fn compose_panel(&mut self, w: &WorldState, lines: &[(String, Color)]) {
        let inner = lines.iter().map(|(s, _)| s.chars().count()).max().unwrap_or(0) + 4;
        let map_w = CELL_W * w.maze.size() + 1;
        let map_h = 2 * w.maze.size() + 1;
        let x0 = MAP_COL + map_w.saturating_sub(inner + 2) / 2;
        let y0 = MAP_ROW + map_h.saturating_sub(lines.len() + 2) / 2;

        let border = format!("╔{}╗", "═".repeat(inner));
        let bottom = format!("╚{}╝", "═".repeat(inner));
        self.front.put_str(x0, y0, &border, HEADER, PANEL_BG);
        for (i, (text, fg)) in lines.iter().enumerate() {
            let row = y0 + 1 + i;
            self.front.put_str(x0, row, &format!("║{}║", " ".repeat(inner)), HEADER, PANEL_BG);
            self.front.put_str(x0 + 3, row, text, *fg, PANEL_BG);
        }
        self.front.put_str(x0, y0 + 1 + lines.len(), &bottom, HEADER, PANEL_BG);
    }

    fn compose_ready_banner(&mut self, w: &WorldState) {
        let Some(def) = level_def(w.current_level) else { return };
        let mut lines = vec![
            (format!("Level {}: {}", w.current_level + 1, def.name), HEADER),
            (format!("Reach the exit in {}", fmt_clock(def.time_limit_secs)), Color::White),
        ];
        if def.blocked_start {
            lines.push(("The start is sealed for a few seconds".into(), WALL_SEALED));
        }
        for kind in [PowerKind::Ghost, PowerKind::Slow, PowerKind::Fast] {
            if def.dots.contains(&kind) {
                let hint = match kind {
                    PowerKind::Ghost => "◆ Ghost: walk through walls",
                    PowerKind::Slow => "◆ Slow: every step takes a moment",
                    PowerKind::Fast => "◆ Fast: two cells per step",
                };
                lines.push((hint.into(), power_color(kind)));
            }
        }
        lines.push((String::new(), Color::White));
        lines.push(("Press any key to start".into(), KEY));
        self.compose_panel(w, &lines);
    }

    fn compose_too_fast(&mut self, w: &WorldState) {
        let lines = [
            ("Too fast!".to_string(), Color::Red),
            (
                format!("{:.1}s is under {}s", w.last_clear_secs, w.config.timing.min_completion_secs),
                Color::White,
            ),
            ("A fresh maze is waiting.".to_string(), Color::White),
            (String::new(), Color::White),
            ("ENTER  New maze".to_string(), KEY),
        ];
        self.compose_panel(w, &lines);
    }

    fn compose_level_complete(&mut self, w: &WorldState) {
        let mut lines = vec![
            (format!("Level {} complete in {:.1}s!", w.current_level + 1, w.last_clear_secs), GOAL),
            (String::new(), Color::White),
        ];
        if let Some(c) = &w.last_coupon {
            lines.push((c.title.to_string(), HEADER));
            lines.push((c.description.to_string(), Color::White));
            lines.push((format!("Code: {}", c.code_str()), KEY));
            lines.push((String::new(), Color::White));
        }
        lines.push(("ENTER  Next level".into(), KEY));
        self.compose_panel(w, &lines);
    }

    fn compose_time_up(&mut self, w: &WorldState) {
        let lines = [
            ("Time's up!".to_string(), Color::Red),
            (String::new(), Color::White),
            ("R  Try again".to_string(), KEY),
            ("N  Skip level".to_string(), KEY),
            ("ESC  Title".to_string(), Color::DarkGrey),
        ];
        self.compose_panel(w, &lines);
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let blink = (w.anim_tick / 8) % 2 == 0;
        let title = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        let lines = [
            (title.to_string(), HEADER),
            (String::new(), Color::White),
            ("F1   Resume".to_string(), KEY),
            ("ESC  Back to title".to_string(), KEY),
        ];
        self.compose_panel(w, &lines);
    }

    // ── Full screens ──

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r" __  __                 ___           _                   ",
            r"|  \/  |__ _ ______    | __|_ ___ __ | |___ _ _ ___ _ _   ",
            r"| |\/| / _` |_ / -_)   | _|\ \ / '_ \| / _ \ '_/ -_) '_|  ",
            r"|_|  |_\__,_/__\___|   |___/_\_\ .__/|_\___/_| \___|_|    ",
            r"                               |_|                        ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 1 + i, line, HEADER, Color::Reset);
        }

        let base = 8;
        self.front.put_str(6, base, "ENTER  Start", GOAL, Color::Reset);
        self.front.put_str(6, base + 1, "Q/ESC  Quit", Color::White, Color::Reset);

        self.front.put_str(6, base + 3, "Levels", HEADER, Color::Reset);
        for (i, def) in LEVELS.iter().enumerate() {
            let line = format!("{}. {:<14} {}", i + 1, def.name, fmt_clock(def.time_limit_secs));
            let fg = if i == w.current_level { KEY } else { Color::White };
            self.front.put_str(8, base + 4 + i, &line, fg, Color::Reset);
        }

        let help = base + 5 + LEVELS.len();
        self.front.put_str(6, help, "Controls", HEADER, Color::Reset);
        self.front.put_str(8, help + 1, "←→↑↓ / WASD  Move      R  Reset level", Color::White, Color::Reset);
        self.front.put_str(8, help + 2, "N  Skip level          F1 Pause", Color::White, Color::Reset);
        self.front.put_str(
            8,
            help + 3,
            &format!("Slower than {}s to win a reward!", w.config.timing.min_completion_secs),
            Color::DarkGrey,
            Color::Reset,
        );
        if !w.coupons.is_empty() {
            self.front.put_str(
                8,
                help + 5,
                &format!("Coupons this session: {}", w.coupons.len()),
                KEY,
                Color::Reset,
            );
        }
    }

    fn compose_game_complete(&mut self, w: &WorldState) {
        self.front.put_str(4, 2, "╔══════════════════════════════════╗", HEADER, Color::Reset);
        self.front.put_str(4, 3, "║   ★  ALL MAZES EXPLORED!  ★      ║", HEADER, Color::Reset);
        self.front.put_str(4, 4, "╚══════════════════════════════════╝", HEADER, Color::Reset);

        let summary = format!("Coupons earned: {}/{}", w.coupons.len(), total_coupons());
        self.front.put_str(6, 6, &summary, Color::White, Color::Reset);
        for (i, c) in w.coupons.iter().enumerate() {
            let line = format!("{}  #{}", c.title, c.code_str());
            self.front.put_str(8, 8 + i, &line, KEY, Color::Reset);
        }
        let row = 9 + w.coupons.len();
        self.front.put_str(6, row, "ENTER / ESC  Back to title", GOAL, Color::Reset);
    }
}
