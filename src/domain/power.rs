/// Power dots and the timed movement modes they grant.
///
/// Each mode is a `Countdown` of whole seconds. A countdown carries the
/// sub-second remainder between calls, so a mode picked up mid-second
/// still lasts its full duration. Modes are independent: picking up a
/// ghost dot never touches the slow or fast countdowns.

use rand::Rng;

use super::cell::Pos;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PowerKind {
    /// Walk through walls.
    Ghost,
    /// Moves land after a delay.
    Slow,
    /// Moves cover two cells when the corridor allows.
    Fast,
}

impl PowerKind {
    pub fn label(self) -> &'static str {
        match self {
            PowerKind::Ghost => "Ghost",
            PowerKind::Slow => "Slow",
            PowerKind::Fast => "Fast",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PowerDot {
    pub pos: Pos,
    pub kind: PowerKind,
}

/// Whole-second countdown driven by elapsed milliseconds.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Countdown {
    secs_left: u32,
    carry_ms: u32,
}

impl Countdown {
    pub fn new(secs: u32) -> Self {
        Countdown { secs_left: secs, carry_ms: 0 }
    }

    pub fn secs_left(&self) -> u32 {
        self.secs_left
    }

    pub fn is_active(&self) -> bool {
        self.secs_left > 0
    }

    pub fn clear(&mut self) {
        *self = Countdown::default();
    }

    /// Advance by `dt_ms`. Returns true if the countdown hit zero during
    /// this call (never for an already-cleared countdown).
    pub fn advance(&mut self, dt_ms: u32) -> bool {
        if self.secs_left == 0 {
            return false;
        }
        self.carry_ms += dt_ms;
        let whole = self.carry_ms / 1000;
        self.carry_ms %= 1000;
        self.secs_left = self.secs_left.saturating_sub(whole);
        if self.secs_left == 0 {
            self.carry_ms = 0;
            return true;
        }
        false
    }
}

/// Movement flags read by the rule engine.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Modifiers {
    pub ghost: bool,
    pub slow: bool,
    pub fast: bool,
}

/// The three independent power-mode countdowns.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PowerModes {
    pub ghost: Countdown,
    pub slow: Countdown,
    pub fast: Countdown,
}

impl PowerModes {
    fn slot_mut(&mut self, kind: PowerKind) -> &mut Countdown {
        match kind {
            PowerKind::Ghost => &mut self.ghost,
            PowerKind::Slow => &mut self.slow,
            PowerKind::Fast => &mut self.fast,
        }
    }

    pub fn get(&self, kind: PowerKind) -> Countdown {
        match kind {
            PowerKind::Ghost => self.ghost,
            PowerKind::Slow => self.slow,
            PowerKind::Fast => self.fast,
        }
    }

    /// Start (or restart) a mode for `secs` seconds.
    pub fn activate(&mut self, kind: PowerKind, secs: u32) {
        *self.slot_mut(kind) = Countdown::new(secs);
    }

    /// Advance every active mode. Returns the modes that just expired.
    pub fn advance(&mut self, dt_ms: u32) -> Vec<PowerKind> {
        let mut expired = Vec::new();
        for kind in [PowerKind::Ghost, PowerKind::Slow, PowerKind::Fast] {
            if self.slot_mut(kind).advance(dt_ms) {
                expired.push(kind);
            }
        }
        expired
    }

    pub fn reset(&mut self) {
        *self = PowerModes::default();
    }

    pub fn any_active(&self) -> bool {
        self.ghost.is_active() || self.slow.is_active() || self.fast.is_active()
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            ghost: self.ghost.is_active(),
            slow: self.slow.is_active(),
            fast: self.fast.is_active(),
        }
    }
}

/// Scatter one dot per entry of `kinds` over interior cells of a
/// `size`×`size` grid: never on the border (so never on the start or
/// goal corners), never two on the same cell. Grids too small to hold
/// them all get as many as fit.
pub fn place_power_dots<R: Rng + ?Sized>(size: usize, kinds: &[PowerKind], rng: &mut R) -> Vec<PowerDot> {
    let mut dots: Vec<PowerDot> = Vec::with_capacity(kinds.len());
    if size < 3 {
        return dots;
    }
    let interior = (size - 2) * (size - 2);
    let start = Pos::new(0, 0);
    let goal = Pos::new(size - 1, size - 1);

    for &kind in kinds.iter().take(interior) {
        loop {
            let pos = Pos::new(rng.gen_range(1..size - 1), rng.gen_range(1..size - 1));
            if pos == start || pos == goal { continue; }
            if dots.iter().any(|d| d.pos == pos) { continue; }
            dots.push(PowerDot { pos, kind });
            break;
        }
    }
    dots
}
