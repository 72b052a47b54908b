/// Gamepad input via gilrs.
///
/// Jump, sword and pause buttons come from the `[gamepad]` section of
/// config.toml (A jumps, X or B swings, Start pauses by default).
/// Walking is always the D-pad or the left stick.
///
/// Button state is kept as bit sets: one bit per named button, plus two
/// for the D-pad directions.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

/// Stick travel below this reads as centred.
const STICK_DEADZONE: f32 = 0.25;

/// Buttons a binding can name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,
    B,
    X,
    Y,
    L1,
    R1,
    Start,
    Select,
}

/// Upper-cased config names. The compass names are gilrs' positional ones.
const BUTTON_NAMES: &[(&str, Btn)] = &[
    ("A", Btn::A), ("SOUTH", Btn::A),
    ("B", Btn::B), ("EAST", Btn::B),
    ("X", Btn::X), ("WEST", Btn::X),
    ("Y", Btn::Y), ("NORTH", Btn::Y),
    ("L1", Btn::L1), ("LB", Btn::L1), ("LEFTTRIGGER", Btn::L1),
    ("R1", Btn::R1), ("RB", Btn::R1), ("RIGHTTRIGGER", Btn::R1),
    ("START", Btn::Start),
    ("SELECT", Btn::Select), ("BACK", Btn::Select),
];

const DPAD_LEFT: u16 = 1 << 8;
const DPAD_RIGHT: u16 = 1 << 9;

impl Btn {
    pub fn from_name(name: &str) -> Option<Btn> {
        let key = name.trim().to_uppercase();
        BUTTON_NAMES.iter().find(|(n, _)| *n == key).map(|&(_, btn)| btn)
    }

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

#[cfg(feature = "gamepad")]
fn gilrs_bit(button: Button) -> Option<u16> {
    let btn = match button {
        Button::DPadLeft => return Some(DPAD_LEFT),
        Button::DPadRight => return Some(DPAD_RIGHT),
        Button::South => Btn::A,
        Button::East => Btn::B,
        Button::West => Btn::X,
        Button::North => Btn::Y,
        Button::LeftTrigger => Btn::L1,
        Button::RightTrigger => Btn::R1,
        Button::Start => Btn::Start,
        Button::Select => Btn::Select,
        _ => return None,
    };
    Some(btn.bit())
}

/// Buttons bound to each action, as bit sets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActionMap {
    pub jump: u16,
    pub attack: u16,
    pub pause: u16,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump: Btn::A.bit(),
            attack: Btn::X.bit() | Btn::B.bit(),
            pause: Btn::Start.bit(),
        }
    }
}

impl ActionMap {
    /// Unknown names are handed back. An action left with no known
    /// button keeps its default.
    pub fn from_config(cfg: &GamepadConfig) -> (ActionMap, Vec<String>) {
        let mut unknown = Vec::new();
        let mut mask_of = |names: &[String]| {
            names.iter().fold(0u16, |mask, name| match Btn::from_name(name) {
                Some(btn) => mask | btn.bit(),
                None => {
                    unknown.push(name.clone());
                    mask
                }
            })
        };
        let or_default = |mask: u16, default: u16| if mask == 0 { default } else { mask };

        let defaults = ActionMap::default();
        let map = ActionMap {
            jump: or_default(mask_of(&cfg.jump), defaults.jump),
            attack: or_default(mask_of(&cfg.attack), defaults.attack),
            pause: or_default(mask_of(&cfg.pause), defaults.pause),
        };
        (map, unknown)
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,
    /// Bits currently down.
    held: u16,
    /// Bits that went down since the last `update`.
    pressed: u16,
    stick_x: f32,
    map: ActionMap,
    pub connected: bool,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        let (map, unknown) = ActionMap::from_config(cfg);
        for name in unknown {
            log::warn!("unknown gamepad button '{name}' in config, ignored");
        }

        #[cfg_attr(not(feature = "gamepad"), allow(unused_mut))]
        let mut pad = GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            held: 0,
            pressed: 0,
            stick_x: 0.0,
            map,
            connected: false,
        };

        #[cfg(feature = "gamepad")]
        match Gilrs::new() {
            Ok(g) => {
                pad.connected = g.gamepads().next().is_some();
                pad.gilrs = Some(g);
            }
            Err(e) => log::warn!("gamepad support unavailable: {e}"),
        }
        pad
    }

    /// New frame: forget press edges, then drain pending events.
    pub fn update(&mut self) {
        self.pressed = 0;

        #[cfg(feature = "gamepad")]
        self.drain_events();
    }

    #[cfg(feature = "gamepad")]
    fn drain_events(&mut self) {
        let Some(gilrs) = self.gilrs.as_mut() else { return };
        let mut events = Vec::new();
        while let Some(ev) = gilrs.next_event() {
            events.push(ev.event);
        }

        for event in events {
            match event {
                EventType::ButtonPressed(button, _) => self.set(gilrs_bit(button), true),
                EventType::ButtonReleased(button, _) => self.set(gilrs_bit(button), false),
                EventType::AxisChanged(Axis::LeftStickX, value, _) => {
                    self.connected = true;
                    self.stick_x = value;
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set(&mut self, bit: Option<u16>, down: bool) {
        self.connected = true;
        let Some(bit) = bit else { return };
        if down {
            self.held |= bit;
            self.pressed |= bit;
        } else {
            self.held &= !bit;
        }
    }

    pub fn jump_held(&self) -> bool {
        (self.held & self.map.jump) != 0
    }

    pub fn attack_held(&self) -> bool {
        (self.held & self.map.attack) != 0
    }

    pub fn pause_pressed(&self) -> bool {
        (self.pressed & self.map.pause) != 0
    }

    pub fn left_held(&self) -> bool {
        (self.held & DPAD_LEFT) != 0 || self.stick_x < -STICK_DEADZONE
    }

    pub fn right_held(&self) -> bool {
        (self.held & DPAD_RIGHT) != 0 || self.stick_x > STICK_DEADZONE
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.held = 0;
        self.pressed = 0;
        self.stick_x = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn button_names_and_aliases() {
        assert_eq!(Btn::from_name("a"), Some(Btn::A));
        assert_eq!(Btn::from_name(" South "), Some(Btn::A));
        assert_eq!(Btn::from_name("rb"), Some(Btn::R1));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn bits_do_not_collide_with_dpad() {
        let all = BUTTON_NAMES.iter().fold(0u16, |m, &(_, b)| m | b.bit());
        assert_eq!(all.count_ones(), 8);
        assert_eq!(all & (DPAD_LEFT | DPAD_RIGHT), 0);
    }

    #[test]
    fn default_map_matches_config_defaults() {
        let (map, unknown) = ActionMap::from_config(&GamepadConfig::default());
        assert_eq!(map, ActionMap::default());
        assert!(unknown.is_empty());
    }

    #[test]
    fn unknown_buttons_are_reported_and_defaults_kept() {
        let cfg = GamepadConfig {
            jump: names(&["Y", "nope"]),
            attack: names(&["nope"]),
            pause: vec![],
        };
        let (map, unknown) = ActionMap::from_config(&cfg);
        assert_eq!(map.jump, Btn::Y.bit());
        assert_eq!(map.attack, ActionMap::default().attack);
        assert_eq!(map.pause, Btn::Start.bit());
        assert_eq!(unknown, names(&["nope", "nope"]));
    }

    #[test]
    fn pause_is_an_edge_jump_is_a_level() {
        let mut pad = GamepadState::new(&GamepadConfig::default());
        pad.held = Btn::Start.bit() | Btn::A.bit();
        pad.pressed = Btn::Start.bit() | Btn::A.bit();
        assert!(pad.pause_pressed());
        assert!(pad.jump_held());
        assert!(!pad.attack_held());

        pad.pressed = 0;
        assert!(!pad.pause_pressed());
        assert!(pad.jump_held());
    }

    #[test]
    fn stick_deadzone() {
        let mut pad = GamepadState::new(&GamepadConfig::default());
        pad.stick_x = -0.2;
        assert!(!pad.left_held());
        pad.stick_x = -0.6;
        assert!(pad.left_held());
        assert!(!pad.right_held());
        pad.held = DPAD_RIGHT;
        assert!(pad.right_held());
        pad.release_all();
        assert!(!pad.left_held());
        assert!(!pad.right_held());
    }
}
