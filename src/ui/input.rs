/// Keyboard state and the terminal `Controls` implementation.
///
/// Terminals report presses and auto-repeats; only some report releases
/// (crossterm keyboard enhancement). A key counts as held until its
/// release arrives or, without enhancement, until `HOLD_TIMEOUT` passes
/// with no repeat. That lets the knight run, jump and swing at once.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::{ControlsConfig, GamepadConfig, KeyBindings};
use crate::domain::entity::{Action, Controls};
use super::gamepad::GamepadState;

/// Longer than a typical terminal's auto-repeat gap.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Last press or repeat seen per key.
    last_seen: HashMap<KeyCode, Instant>,
    /// Keys that went from up to down during the current frame.
    pressed: HashSet<KeyCode>,
    interrupted: bool,
    /// Trust release events. Set only once enhancement is active.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_seen: HashMap::new(),
            pressed: HashSet::new(),
            interrupted: false,
            honor_release: false,
        }
    }

    /// Read every pending terminal event without blocking. Once per frame.
    pub fn drain_events(&mut self) {
        self.begin_frame();
        while event::poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.feed(key, Instant::now()),
                Ok(_) => {}
                Err(e) => log::debug!("terminal event read failed: {e}"),
            }
        }
        self.expire(Instant::now());
    }

    fn begin_frame(&mut self) {
        self.pressed.clear();
        self.interrupted = false;
    }

    fn feed(&mut self, key: KeyEvent, now: Instant) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c' | 'C')) {
            self.interrupted = true;
        }

        if key.kind == KeyEventKind::Release {
            // Without enhancement a stray release is ignored; the timeout rules.
            if self.honor_release {
                self.last_seen.remove(&key.code);
            }
            return;
        }
        if !self.held_at(key.code, now) {
            self.pressed.insert(key.code);
        }
        self.last_seen.insert(key.code, now);
    }

    fn expire(&mut self, now: Instant) {
        self.last_seen.retain(|_, seen| now.saturating_duration_since(*seen) < HOLD_TIMEOUT);
    }

    fn held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_seen
            .get(&code)
            .is_some_and(|seen| now.saturating_duration_since(*seen) < HOLD_TIMEOUT)
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held_at(code, Instant::now())
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|&c| self.is_held(c))
    }

    /// Edge: went down this frame.
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.pressed.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|&c| self.was_pressed(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.interrupted
    }
}

// ══════════════════════════════════════════════════════════════
// Key bindings
// ══════════════════════════════════════════════════════════════

/// Parse a config key name: a single character or a named key.
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let name = name.trim();
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c.to_ascii_lowercase()));
    }
    match name.to_ascii_lowercase().as_str() {
        "space" => Some(KeyCode::Char(' ')),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "esc" | "escape" => Some(KeyCode::Esc),
        "enter" | "return" => Some(KeyCode::Enter),
        "tab" => Some(KeyCode::Tab),
        "backspace" => Some(KeyCode::Backspace),
        _ => None,
    }
}

/// One resolved key-binding scheme.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyMap {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub jump: Vec<KeyCode>,
    pub attack: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
}

impl KeyMap {
    /// Resolve names; unknown ones are returned for logging.
    pub fn from_bindings(b: &KeyBindings) -> (KeyMap, Vec<String>) {
        let mut unknown = Vec::new();
        let mut parse_list = |names: &[String]| -> Vec<KeyCode> {
            names.iter()
                .filter_map(|n| {
                    let code = parse_key(n);
                    if code.is_none() { unknown.push(n.clone()); }
                    code
                })
                .collect()
        };
        let map = KeyMap {
            move_left: parse_list(&b.move_left),
            move_right: parse_list(&b.move_right),
            jump: parse_list(&b.jump),
            attack: parse_list(&b.attack),
            pause: parse_list(&b.pause),
        };
        (map, unknown)
    }

    fn keys_for(&self, action: Action) -> &[KeyCode] {
        match action {
            Action::MoveLeft => &self.move_left,
            Action::MoveRight => &self.move_right,
            Action::Jump => &self.jump,
            Action::Attack => &self.attack,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scheme {
    Primary,
    Alternate,
}

impl Scheme {
    fn toggled(self) -> Scheme {
        match self {
            Scheme::Primary => Scheme::Alternate,
            Scheme::Alternate => Scheme::Primary,
        }
    }
}

/// Meta requests seen during one poll.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetaInput {
    pub quit: bool,
    pub toggle_pause: bool,
}

// ══════════════════════════════════════════════════════════════
// Terminal controls
// ══════════════════════════════════════════════════════════════

/// Keyboard (active scheme) merged with the gamepad.
pub struct TerminalControls {
    pub keys: InputState,
    pad: GamepadState,
    primary: KeyMap,
    alternate: KeyMap,
    scheme: Scheme,
}

impl TerminalControls {
    pub fn new(controls: &ControlsConfig, gamepad: &GamepadConfig) -> Self {
        let (primary, mut unknown) = KeyMap::from_bindings(&controls.primary);
        let (alternate, more) = KeyMap::from_bindings(&controls.alternate);
        unknown.extend(more);
        for name in unknown {
            log::warn!("unknown key name '{name}' in [controls], ignored");
        }
        let pad = GamepadState::new(gamepad);
        if pad.connected {
            log::info!("gamepad detected");
        }
        TerminalControls {
            keys: InputState::new(),
            pad,
            primary,
            alternate,
            scheme: Scheme::Primary,
        }
    }

    fn active(&self) -> &KeyMap {
        match self.scheme {
            Scheme::Primary => &self.primary,
            Scheme::Alternate => &self.alternate,
        }
    }

    /// Read pending keyboard and gamepad input. Call once per frame.
    pub fn poll(&mut self) -> MetaInput {
        self.keys.drain_events();
        self.pad.update();
        self.meta()
    }

    fn meta(&mut self) -> MetaInput {
        let meta = MetaInput {
            quit: self.keys.ctrl_c_pressed() || self.keys.was_pressed(KeyCode::Char('q')),
            toggle_pause: self.keys.any_pressed(&self.active().pause) || self.pad.pause_pressed(),
        };
        if self.keys.was_pressed(KeyCode::Tab) {
            self.scheme = self.scheme.toggled();
            log::info!("control scheme: {:?}", self.scheme);
        }
        meta
    }
}

impl Controls for TerminalControls {
    fn is_pressed(&self, action: Action) -> bool {
        let pad = match action {
            Action::MoveLeft => self.pad.left_held(),
            Action::MoveRight => self.pad.right_held(),
            Action::Jump => self.pad.jump_held(),
            Action::Attack => self.pad.attack_held(),
        };
        pad || self.keys.any_held(self.active().keys_for(action))
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
