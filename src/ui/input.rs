/// Keyboard state tracker.
///
/// Movement keys are level-triggered (held keys keep moving, throttled by
/// the player's cooldown); every other binding is edge-triggered.
///
/// crossterm only reports Release events when keyboard enhancement is
/// active, so a key also counts as released once no Press/Repeat has
/// arrived for `HOLD_TIMEOUT`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::cell::Direction;

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Bindings ──

pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
pub const KEYS_RESET: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
pub const KEYS_SKIP: &[KeyCode] = &[KeyCode::Char('n'), KeyCode::Char('N')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];
pub const KEYS_BACK: &[KeyCode] = &[KeyCode::Esc];
pub const KEYS_PAUSE: &[KeyCode] = &[KeyCode::F(1)];

/// Movement bindings in the priority order used when several are held.
const MOVE_BINDINGS: [(Direction, &[KeyCode]); 4] = [
    (Direction::Up, KEYS_UP),
    (Direction::Down, KEYS_DOWN),
    (Direction::Left, KEYS_LEFT),
    (Direction::Right, KEYS_RIGHT),
];

/// Direction bound to `code`, if any.
pub fn direction_for(code: KeyCode) -> Option<Direction> {
    MOVE_BINDINGS
        .iter()
        .find(|(_, keys)| keys.contains(&code))
        .map(|(dir, _)| *dir)
}

pub struct InputState {
    /// Last Press/Repeat per key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from released to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    raw_events: Vec<KeyEvent>,
    /// Trust Release events (keyboard enhancement confirmed).
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain pending terminal events without blocking. Once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                if !self.is_held_at(key.code, at) {
                    self.fresh_presses.push(key.code);
                }
                self.last_active.insert(key.code, at);
            }
        }
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        let now = Instant::now();
        codes.iter().any(|c| self.is_held_at(*c, now))
    }

    /// Edge trigger: pressed during the last drain.
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    /// Movement request for this frame: a fresh press wins over a held key
    /// so quick taps are never lost.
    pub fn movement(&self) -> Option<Direction> {
        self.fresh_presses
            .iter()
            .find_map(|&c| direction_for(c))
            .or_else(|| {
                MOVE_BINDINGS
                    .iter()
                    .find(|(_, keys)| self.any_held(keys))
                    .map(|(dir, _)| *dir)
            })
    }

    /// Any key at all was pressed this frame.
    pub fn anything_pressed(&self) -> bool {
        !self.fresh_presses.is_empty()
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    #[test]
    fn arrows_and_wasd_map_to_directions() {
        assert_eq!(direction_for(KeyCode::Up), Some(Direction::Up));
        assert_eq!(direction_for(KeyCode::Char('a')), Some(Direction::Left));
        assert_eq!(direction_for(KeyCode::Char('S')), Some(Direction::Down));
        assert_eq!(direction_for(KeyCode::Char('d')), Some(Direction::Right));
        assert_eq!(direction_for(KeyCode::Char('r')), None);
    }

    #[test]
    fn repeat_is_not_a_fresh_press() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.record(key(KeyCode::Enter, KeyEventKind::Press), now);
        input.record(key(KeyCode::Enter, KeyEventKind::Repeat), now);
        assert!(input.any_pressed(KEYS_CONFIRM));
        assert_eq!(input.fresh_presses.len(), 1);
    }

    #[test]
    fn release_honored_only_when_enabled() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.record(key(KeyCode::Left, KeyEventKind::Press), now);
        input.record(key(KeyCode::Left, KeyEventKind::Release), now);
        assert!(input.any_held(KEYS_LEFT));

        input.honor_release = true;
        input.record(key(KeyCode::Left, KeyEventKind::Release), now);
        assert!(!input.any_held(KEYS_LEFT));
    }

    #[test]
    fn fresh_press_wins_movement() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.record(key(KeyCode::Up, KeyEventKind::Press), now);
        input.fresh_presses.clear();
        input.record(key(KeyCode::Char('d'), KeyEventKind::Press), now);
        assert_eq!(input.movement(), Some(Direction::Right));
    }

    #[test]
    fn ctrl_c_detected() {
        let mut input = InputState::new();
        let ev = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        input.record(ev, Instant::now());
        assert!(input.ctrl_c_pressed());
    }
}
