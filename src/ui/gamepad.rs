/// Gamepad input via gilrs (feature `gamepad`).
///
/// D-pad and left stick move; the remaining actions are bound from the
/// `[gamepad]` section of config.toml. Defaults:
///   Start / A   →  Confirm
///   Select / B  →  Back
///   Y           →  Reset level
///   R1          →  Skip level
///
/// Without the feature every query returns false.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
use log::warn;

use crate::config::GamepadConfig;
use crate::domain::cell::Direction;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,
    B,
    X,
    Y,
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

const BTN_COUNT: usize = 10;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.trim().to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "L2" | "LT" => Some(Btn::L2),
            "R2" | "RT" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2 => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
    skip: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::Start, Btn::A],
            cancel: vec![Btn::Select, Btn::B],
            restart: vec![Btn::Y],
            skip: vec![Btn::R1],
        }
    }
}

fn dir_index(dir: Direction) -> usize {
    match dir {
        Direction::Up => 0,
        Direction::Right => 1,
        Direction::Down => 2,
        Direction::Left => 3,
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],
    dpad: [BtnState; 4],
    stick: [BtnState; 4],
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,

    action_map: ActionMap,
    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Apply the `[gamepad]` bindings. Unknown names are skipped; an
    /// action whose list has no known name keeps its default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_into(names: &[String], slot: &mut Vec<Btn>) {
            let parsed: Vec<Btn> = names
                .iter()
                .filter_map(|s| {
                    let btn = Btn::from_name(s);
                    if btn.is_none() {
                        warn!("unknown gamepad button '{s}' in config");
                    }
                    btn
                })
                .collect();
            if !parsed.is_empty() {
                *slot = parsed;
            }
        }
        let map = &mut self.action_map;
        parse_into(&cfg.confirm, &mut map.confirm);
        parse_into(&cfg.cancel, &mut map.cancel);
        parse_into(&cfg.restart, &mut map.restart);
        parse_into(&cfg.skip, &mut map.skip);
    }

    /// Poll pending events. Once per frame.
    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let Some(gilrs) = &mut self.gilrs else { return };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(Axis::LeftStickX, value, _) => self.stick_x = value,
                EventType::AxisChanged(Axis::LeftStickY, value, _) => self.stick_y = value,
                EventType::Connected => self.connected = true,
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // gilrs reports stick Y positive-up.
        self.stick[dir_index(Direction::Up)].set(self.stick_y > STICK_DEADZONE);
        self.stick[dir_index(Direction::Down)].set(self.stick_y < -STICK_DEADZONE);
        self.stick[dir_index(Direction::Left)].set(self.stick_x < -STICK_DEADZONE);
        self.stick[dir_index(Direction::Right)].set(self.stick_x > STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, btn: Button, held: bool) {
        let dpad_dir = match btn {
            Button::DPadUp => Some(Direction::Up),
            Button::DPadDown => Some(Direction::Down),
            Button::DPadLeft => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(dir) = dpad_dir {
            self.dpad[dir_index(dir)].set(held);
        } else if let Some(b) = Btn::from_gilrs(btn) {
            self.buttons[b as usize].set(held);
        }
    }

    // ── Action queries ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
    pub fn restart_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.restart)
    }
    pub fn skip_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.skip)
    }

    /// Held direction, D-pad before stick, in Up/Down/Left/Right priority.
    pub fn movement(&self) -> Option<Direction> {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
            .into_iter()
            .find(|&d| self.dpad[dir_index(d)].held || self.stick[dir_index(d)].held)
    }

    pub fn any_direction_pressed(&self) -> bool {
        self.dpad.iter().chain(self.stick.iter()).any(|s| s.just_pressed)
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for s in self.buttons.iter_mut().chain(self.dpad.iter_mut()).chain(self.stick.iter_mut()) {
            s.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for s in self.buttons.iter_mut().chain(self.dpad.iter_mut()).chain(self.stick.iter_mut()) {
            *s = BtnState::default();
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> GamepadState {
        #[allow(unused_mut)]
        let mut gp = GamepadState::new();
        #[cfg(feature = "gamepad")]
        {
            gp.gilrs = None;
        }
        gp
    }

    #[test]
    fn button_names_parse() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name(" South "), Some(Btn::A));
        assert_eq!(Btn::from_name("RB"), Some(Btn::R1));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_actions() {
        let mut gp = offline();
        let cfg = GamepadConfig {
            confirm: vec!["X".into()],
            cancel: vec!["nonsense".into()],
            restart: vec![],
            skip: vec!["L2".into(), "R2".into()],
        };
        gp.load_button_config(&cfg);
        assert_eq!(gp.action_map.confirm, vec![Btn::X]);
        assert_eq!(gp.action_map.cancel, vec![Btn::Select, Btn::B]);
        assert_eq!(gp.action_map.restart, vec![Btn::Y]);
        assert_eq!(gp.action_map.skip, vec![Btn::L2, Btn::R2]);
    }

    #[test]
    fn press_is_edge_triggered() {
        let mut gp = offline();
        gp.buttons[Btn::Start as usize].set(true);
        assert!(gp.confirm_pressed());
        gp.update();
        assert!(!gp.confirm_pressed());
        gp.buttons[Btn::Start as usize].set(true);
        assert!(!gp.confirm_pressed());
    }

    #[test]
    fn dpad_beats_stick_order() {
        let mut gp = offline();
        gp.stick[dir_index(Direction::Right)].set(true);
        assert_eq!(gp.movement(), Some(Direction::Right));
        gp.dpad[dir_index(Direction::Up)].set(true);
        assert_eq!(gp.movement(), Some(Direction::Up));
        assert!(gp.any_direction_pressed());
    }
}
